//! Request and response types for the generation service.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Shape of the text the generation service must return.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OutputFormat {
    /// Plain text
    #[default]
    Text,
}

/// Text-in request for the generation service.
///
/// # Examples
///
/// ```
/// use storyloom_core::{GenerateRequestBuilder, OutputFormat};
///
/// let request = GenerateRequestBuilder::default()
///     .prompt("Write four words")
///     .max_tokens(50u32)
///     .temperature(0.7f32)
///     .build()
///     .unwrap();
///
/// assert_eq!(request.output_format, OutputFormat::Text);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(rename_all = "camelCase")]
#[builder(setter(into))]
pub struct GenerateRequest {
    /// Full prompt text
    pub prompt: String,
    /// Upper bound on generated tokens
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Requested output shape
    #[builder(default)]
    pub output_format: OutputFormat,
}

/// Text-out response from the generation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// Generated text, untrimmed
    pub text: String,
}

impl GenerateResponse {
    /// Wrap generated text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}
