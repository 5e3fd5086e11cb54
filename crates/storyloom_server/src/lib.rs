//! Generation service access for storyloom.
//!
//! - [`GenerationClient`]: an OpenAI-compatible chat-completions client that
//!   implements [`GenerationDriver`](storyloom_interface::GenerationDriver),
//!   with an optional requests-per-minute cap.
//! - [`phrase_router`]: the `POST /get-word` endpoint that turns
//!   `{storySoFar, editText}` into `{selectedWord}` through a
//!   [`PhraseSynthesizer`](storyloom_narrative::PhraseSynthesizer).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod api;
mod client;
mod config;
mod convert;
mod request;
mod response;

pub use api::{ErrorBody, PhraseRequest, PhraseResponse, phrase_router};
pub use client::GenerationClient;
pub use config::{API_KEY_VARS, GenerationConfig};
pub use convert::{from_chat_response, to_chat_request};
pub use request::{
    ChatCompletionRequest, ChatCompletionRequestBuilder, Message, ResponseFormat,
};
pub use response::{ChatCompletionResponse, Choice, ChoiceMessage, Usage};
