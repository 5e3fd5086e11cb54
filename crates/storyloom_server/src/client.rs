use crate::{ChatCompletionRequest, ChatCompletionResponse, GenerationConfig, convert};
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use storyloom_core::{GenerateRequest, GenerateResponse};
use storyloom_error::{HttpError, StoryloomResult, SynthesisError, SynthesisErrorKind};
use storyloom_interface::GenerationDriver;
use tracing::instrument;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Longest error body kept in a status error
const MAX_ERROR_BODY: usize = 512;

/// Client for an OpenAI-compatible chat-completions service
#[derive(Clone)]
pub struct GenerationClient {
    config: GenerationConfig,
    client: reqwest::Client,
    limiter: Option<Arc<DirectRateLimiter>>,
}

impl std::fmt::Debug for GenerationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationClient")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .field("requests_per_minute", &self.config.requests_per_minute)
            .finish_non_exhaustive()
    }
}

impl GenerationClient {
    /// Create a new generation client
    ///
    /// # Errors
    ///
    /// Returns an HTTP error if the underlying client cannot be built.
    #[instrument(skip(config), fields(base_url = %config.base_url, model = %config.model))]
    pub fn new(config: GenerationConfig) -> StoryloomResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| HttpError::new(format!("Failed to build generation client: {}", e)))?;

        let limiter = config
            .requests_per_minute
            .and_then(NonZeroU32::new)
            .map(|rpm| Arc::new(RateLimiter::direct(Quota::per_minute(rpm))));

        tracing::debug!(limited = limiter.is_some(), "Creating generation client");
        Ok(Self {
            config,
            client,
            limiter,
        })
    }

    /// Get the client configuration
    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Send a chat completion request
    #[instrument(skip(self, request), fields(model = %request.model))]
    pub async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, SynthesisError> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        let url = format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        tracing::debug!("Sending chat completion request to {}", url);

        let mut req = self.client.post(&url).json(request);
        if let Some(api_key) = &self.config.api_key {
            req = req.bearer_auth(api_key);
        }

        let response = req.send().await.map_err(|e| {
            tracing::error!("Request failed: {}", e);
            if e.is_timeout() {
                SynthesisError::new(SynthesisErrorKind::Timeout(e.to_string()))
            } else {
                SynthesisError::new(SynthesisErrorKind::Request(e.to_string()))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY)
                    .rev()
                    .find(|i| body.is_char_boundary(*i))
                    .unwrap_or(0);
                body.truncate(cut);
            }
            tracing::error!("Generation service returned error: {}", status);
            return Err(SynthesisError::new(SynthesisErrorKind::Status {
                status: status.as_u16(),
                body,
            }));
        }

        let body = response.text().await.map_err(|e| {
            tracing::error!("Failed to read response: {}", e);
            SynthesisError::new(SynthesisErrorKind::Request(format!(
                "reading body: {}",
                e
            )))
        })?;

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse response: {}", e);
            SynthesisError::new(SynthesisErrorKind::MalformedResponse(format!(
                "Failed to parse response: {}",
                e
            )))
        })
    }
}

#[async_trait]
impl GenerationDriver for GenerationClient {
    #[instrument(skip(self, req))]
    async fn generate(&self, req: &GenerateRequest) -> StoryloomResult<GenerateResponse> {
        let chat_request = convert::to_chat_request(req, &self.config.model)?;
        let response = self.chat_completion(&chat_request).await?;
        let generated = convert::from_chat_response(response)?;
        tracing::debug!(chars = generated.text.len(), "Chat completion successful");
        Ok(generated)
    }

    fn provider_name(&self) -> &'static str {
        "openai-compatible"
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
