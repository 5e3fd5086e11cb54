//! Configuration for the generation service connection

use serde::{Deserialize, Serialize};

/// Environment variables consulted for the API key, in order.
pub const API_KEY_VARS: &[&str] = &["STORYLOOM_API_KEY", "OPENAI_API_KEY"];

/// Configuration for the generation service connection
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Base URL of the service (e.g., "https://api.openai.com")
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model identifier to use for inference
    #[serde(default = "default_model")]
    pub model: String,
    /// API key; never read from or written to config files
    #[serde(skip)]
    pub api_key: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Optional cap on outbound requests per minute
    #[serde(default)]
    pub requests_per_minute: Option<u32>,
}

fn default_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout_secs() -> u64 {
    20
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            requests_per_minute: None,
        }
    }
}

impl GenerationConfig {
    /// Create a new configuration
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            ..Self::default()
        }
    }

    /// Set the API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Cap outbound requests per minute
    pub fn with_requests_per_minute(mut self, requests_per_minute: u32) -> Self {
        self.requests_per_minute = Some(requests_per_minute);
        self
    }

    /// Fill the API key from the environment if it is not already set.
    ///
    /// Reads the first non-empty variable of [`API_KEY_VARS`].
    pub fn with_api_key_from_env(mut self) -> Self {
        if self.api_key.is_none() {
            self.api_key = API_KEY_VARS
                .iter()
                .filter_map(|var| std::env::var(var).ok())
                .find(|value| !value.trim().is_empty());
        }
        self
    }
}
