//! Core data types for storyloom.
//!
//! This crate provides the data model shared by every pipeline stage: the edit
//! events observed on the change feed, the cursor marking how far the feed has
//! been consumed, the phrases that make up the story, and the request/response
//! pair exchanged with the generation service.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cursor;
mod edit;
mod phrase;
mod request;
mod telemetry;

pub use cursor::Cursor;
pub use edit::EditEvent;
pub use phrase::{Phrase, PhraseSource};
pub use request::{GenerateRequest, GenerateRequestBuilder, GenerateResponse, OutputFormat};
pub use telemetry::{TelemetryConfig, init_telemetry, shutdown_telemetry};
