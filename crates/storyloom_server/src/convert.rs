//! Conversion between storyloom and chat-completions types

use crate::{
    ChatCompletionRequest, ChatCompletionResponse, Message, ResponseFormat,
    request::ChatCompletionRequestBuilder,
};
use storyloom_core::{GenerateRequest, GenerateResponse};
use storyloom_error::{SynthesisError, SynthesisErrorKind};

/// Convert a GenerateRequest to a single-message ChatCompletionRequest
#[tracing::instrument(skip(request))]
pub fn to_chat_request(
    request: &GenerateRequest,
    model: &str,
) -> Result<ChatCompletionRequest, SynthesisError> {
    ChatCompletionRequestBuilder::default()
        .model(model)
        .messages(vec![Message::user(request.prompt.clone())])
        .max_tokens(request.max_tokens)
        .temperature(request.temperature)
        .response_format(ResponseFormat {
            kind: request.output_format.to_string(),
        })
        .build()
        .map_err(|e| {
            SynthesisError::new(SynthesisErrorKind::Backend(format!(
                "Failed to build request: {}",
                e
            )))
        })
}

/// Take the first choice's content as the generated text
pub fn from_chat_response(
    response: ChatCompletionResponse,
) -> Result<GenerateResponse, SynthesisError> {
    let choice = response.choices.into_iter().next().ok_or_else(|| {
        SynthesisError::new(SynthesisErrorKind::MalformedResponse(
            "response has no choices".into(),
        ))
    })?;

    let content = choice.message.content.ok_or_else(|| {
        SynthesisError::new(SynthesisErrorKind::MalformedResponse(
            "first choice has no content".into(),
        ))
    })?;

    Ok(GenerateResponse::new(content))
}
