//! Layered configuration for a storyloom deployment.

use crate::RevealConfig;
use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use storyloom_error::{ConfigError, StoryloomError, StoryloomResult};
use storyloom_feed::FeedConfig;
use storyloom_narrative::{SanitizerConfig, SynthesisConfig};
use storyloom_server::GenerationConfig;
use tracing::debug;

/// Bundled default configuration
const DEFAULT_CONFIG: &str = include_str!("../../../storyloom.toml");

/// Full configuration for a storyloom deployment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoryloomConfig {
    /// Cycle timing and context size
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Change feed connection
    #[serde(default)]
    pub feed: FeedConfig,
    /// Generation service connection and sampling
    #[serde(default)]
    pub generation: GenerationSettings,
    /// Token rules
    #[serde(default)]
    pub sanitizer: SanitizerConfig,
    /// Reveal pacing
    #[serde(default)]
    pub reveal: RevealConfig,
    /// Durable state location
    #[serde(default)]
    pub storage: StorageConfig,
    /// HTTP surface
    #[serde(default)]
    pub server: ServerConfig,
}

/// Cycle timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Seconds between poll cycles
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Story words sent to the generator as context
    #[serde(default = "default_story_tail_words")]
    pub story_tail_words: usize,
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_story_tail_words() -> usize {
    10
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            story_tail_words: default_story_tail_words(),
        }
    }
}

impl PipelineConfig {
    /// Poll interval as a duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// `[generation]`: where to send prompts and how to sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Base URL of an OpenAI-compatible service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_generation_timeout_secs")]
    pub timeout_secs: u64,

    /// Optional cap on outbound requests per minute
    #[serde(default)]
    pub requests_per_minute: Option<u32>,

    /// Upper bound on generated tokens
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_base_url() -> String {
    GenerationConfig::default().base_url
}

fn default_model() -> String {
    GenerationConfig::default().model
}

fn default_generation_timeout_secs() -> u64 {
    GenerationConfig::default().timeout_secs
}

fn default_max_tokens() -> u32 {
    SynthesisConfig::default().max_tokens
}

fn default_temperature() -> f32 {
    SynthesisConfig::default().temperature
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: default_generation_timeout_secs(),
            requests_per_minute: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl GenerationSettings {
    /// Client configuration; the API key comes from the environment.
    pub fn client_config(&self) -> GenerationConfig {
        GenerationConfig {
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            api_key: None,
            timeout_secs: self.timeout_secs,
            requests_per_minute: self.requests_per_minute,
        }
        .with_api_key_from_env()
    }
}

/// `[storage]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// State directory; defaults to `<data dir>/storyloom`
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    /// Directory holding story, cursor and used-set.
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|dir| dir.join("storyloom"))
                .unwrap_or_else(|| PathBuf::from(".storyloom"))
        })
    }
}

/// `[server]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address for the HTTP surface
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl StoryloomConfig {
    /// Load configuration with precedence: explicit file > current dir >
    /// home dir > bundled defaults.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a source cannot be read or parsed,
    /// if `explicit` does not exist, or if the merged values are invalid.
    pub fn load(explicit: Option<&Path>) -> StoryloomResult<Self> {
        debug!("Loading configuration with precedence: explicit > current dir > home dir > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/storyloom/storyloom.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("storyloom").required(false));

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config: Self = builder
            .build()
            .map_err(|e| {
                StoryloomError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                StoryloomError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the first invalid value.
    pub fn validate(&self) -> StoryloomResult<()> {
        if self.pipeline.poll_interval_secs == 0 {
            return Err(ConfigError::new("pipeline.poll_interval_secs must be positive").into());
        }
        if *self.feed.limit() == 0 {
            return Err(ConfigError::new("feed.limit must be positive").into());
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(ConfigError::new(format!(
                "generation.temperature must be within 0..=2, got {}",
                self.generation.temperature
            ))
            .into());
        }
        let sanitizer = &self.sanitizer;
        if sanitizer.min_token_length > sanitizer.max_token_length {
            return Err(ConfigError::new(format!(
                "sanitizer.min_token_length ({}) exceeds max_token_length ({})",
                sanitizer.min_token_length, sanitizer.max_token_length
            ))
            .into());
        }
        if sanitizer.min_token_length > sanitizer.vocabulary_max_token_length {
            return Err(ConfigError::new(format!(
                "sanitizer.min_token_length ({}) exceeds vocabulary_max_token_length ({})",
                sanitizer.min_token_length, sanitizer.vocabulary_max_token_length
            ))
            .into());
        }
        Ok(())
    }

    /// Synthesis tuning drawn from `[pipeline]` and `[generation]`.
    pub fn synthesis(&self) -> SynthesisConfig {
        SynthesisConfig {
            story_tail_words: self.pipeline.story_tail_words,
            max_tokens: self.generation.max_tokens,
            temperature: self.generation.temperature,
            ..SynthesisConfig::default()
        }
    }
}
