//! Error types for storyloom.
//!
//! Every failure domain of the pipeline has its own error type:
//!
//! - [`FeedError`]: the change feed could not be read (network, status, malformed body)
//! - [`SynthesisError`]: the generation service failed or answered with a malformed payload
//! - [`StorageError`]: durable state could not be read or written
//! - [`ConfigError`], [`HttpError`]: ambient failures
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use storyloom_error::{FeedError, FeedErrorKind, StoryloomResult};
//!
//! fn poll() -> StoryloomResult<Vec<String>> {
//!     Err(FeedError::new(FeedErrorKind::Request("connection refused".into())))?
//! }
//!
//! let err = poll().unwrap_err();
//! assert!(err.is_feed_unavailable());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod feed;
mod http;
mod storage;
mod synthesis;

pub use config::ConfigError;
pub use error::{StoryloomError, StoryloomErrorKind, StoryloomResult};
pub use feed::{FeedError, FeedErrorKind};
pub use http::HttpError;
pub use storage::{StorageError, StorageErrorKind};
pub use synthesis::{SynthesisError, SynthesisErrorKind};
