//! Phrase synthesis: one raw edit plus story context in, one candidate phrase out.

use crate::{Sanitizer, SanitizerConfig, build_prompt, story_tail};
use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use storyloom_core::{EditEvent, GenerateRequest, OutputFormat, Phrase, PhraseSource};
use storyloom_error::{StoryloomError, StoryloomResult, SynthesisError, SynthesisErrorKind};
use storyloom_interface::GenerationDriver;
use tracing::{debug, instrument};

/// Synthesis tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Story tokens sent as context
    #[serde(default = "default_story_tail_words")]
    pub story_tail_words: usize,

    /// Upper bound on generated tokens
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Fewest words a cleaned response may have
    #[serde(default = "default_min_phrase_words")]
    pub min_phrase_words: usize,

    /// Most words a cleaned response may have
    #[serde(default = "default_max_phrase_words")]
    pub max_phrase_words: usize,
}

fn default_story_tail_words() -> usize {
    10
}

fn default_max_tokens() -> u32 {
    50
}

fn default_temperature() -> f32 {
    0.7
}

fn default_min_phrase_words() -> usize {
    3
}

fn default_max_phrase_words() -> usize {
    6
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            story_tail_words: default_story_tail_words(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            min_phrase_words: default_min_phrase_words(),
            max_phrase_words: default_max_phrase_words(),
        }
    }
}

/// Strip everything but word characters and whitespace, lowercase, collapse.
///
/// Returns `None` when the cleaned text falls outside `min..=max` words.
///
/// # Examples
///
/// ```
/// use storyloom_narrative::clean_response;
///
/// assert_eq!(
///     clean_response("  \"Because temples held many secrets.\"\n", 3, 6).as_deref(),
///     Some("because temples held many secrets")
/// );
/// assert_eq!(clean_response("Phrase:", 3, 6), None);
/// ```
pub fn clean_response(raw: &str, min_words: usize, max_words: usize) -> Option<String> {
    let stripped: String = raw
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();
    let words: Vec<String> = stripped
        .split_whitespace()
        .map(str::to_lowercase)
        .collect();

    if words.is_empty() || words.len() < min_words || words.len() > max_words {
        return None;
    }
    Some(words.join(" "))
}

/// Format an edit time as `MM.DD.YY HH:MM` in the given zone.
pub fn format_source_timestamp<Tz>(timestamp: &DateTime<Utc>, zone: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    timestamp
        .with_timezone(zone)
        .format("%m.%d.%y %H:%M")
        .to_string()
}

/// Turns edits into candidate phrases through a [`GenerationDriver`].
#[derive(Debug)]
pub struct PhraseSynthesizer<D> {
    driver: D,
    vocabulary: Sanitizer,
    config: SynthesisConfig,
}

impl<D: GenerationDriver> PhraseSynthesizer<D> {
    /// Create a synthesizer. Prompt vocabulary uses the sanitizer's
    /// vocabulary length bound.
    pub fn new(driver: D, sanitizer: &SanitizerConfig, config: SynthesisConfig) -> Self {
        Self {
            driver,
            vocabulary: Sanitizer::new(sanitizer.for_vocabulary()),
            config,
        }
    }

    /// The generation backend.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Active configuration.
    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    /// Generate a cleaned phrase for `raw` given the story so far.
    ///
    /// Returns `Ok(None)` when `raw` has no usable vocabulary (the driver is
    /// not called) or when the response is outside the accepted word band.
    ///
    /// # Errors
    ///
    /// Any driver failure surfaces as a synthesis error.
    #[instrument(skip_all, fields(provider = self.driver.provider_name(), model = self.driver.model_name()))]
    pub async fn compose(&self, story_so_far: &str, raw: &str) -> StoryloomResult<Option<String>> {
        let vocabulary = self.vocabulary.vocabulary(raw);
        if vocabulary.is_empty() {
            debug!("No usable vocabulary, skipping generation");
            return Ok(None);
        }

        let tail = story_tail(story_so_far, self.config.story_tail_words);
        let request = GenerateRequest {
            prompt: build_prompt(&tail, &vocabulary),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            output_format: OutputFormat::Text,
        };

        let response = self
            .driver
            .generate(&request)
            .await
            .map_err(into_synthesis_error)?;

        let phrase = clean_response(
            &response.text,
            self.config.min_phrase_words,
            self.config.max_phrase_words,
        );
        match &phrase {
            Some(text) => debug!(vocabulary = %vocabulary, text = %text, "Composed phrase"),
            None => debug!(raw_response = %response.text, "Response outside word band"),
        }
        Ok(phrase)
    }

    /// Candidate phrase for one edit, attributed to it.
    ///
    /// # Errors
    ///
    /// See [`PhraseSynthesizer::compose`].
    #[instrument(skip_all, fields(edit_id = %edit.id()))]
    pub async fn synthesize(
        &self,
        story_so_far: &str,
        edit: &EditEvent,
    ) -> StoryloomResult<Option<Phrase>> {
        let raw = edit.raw_text();
        let Some(text) = self.compose(story_so_far, raw).await? else {
            return Ok(None);
        };

        let source = PhraseSource::new(
            edit.author().clone(),
            format_source_timestamp(edit.timestamp(), &Local),
            raw,
        );
        Ok(Some(Phrase::new(text, source)))
    }
}

/// Driver errors of any kind count as synthesis failures.
fn into_synthesis_error(err: StoryloomError) -> StoryloomError {
    if err.is_synthesis_failed() {
        err
    } else {
        SynthesisError::new(SynthesisErrorKind::Backend(err.to_string())).into()
    }
}
