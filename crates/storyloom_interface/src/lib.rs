//! Trait definitions for storyloom.
//!
//! The pipeline talks to three external collaborators, each behind a trait:
//!
//! - [`ChangeFeed`]: source of raw edit events
//! - [`GenerationDriver`]: text-in/text-out generation service
//! - [`KeyValueStore`]: durable home of the story, cursor and used-set

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod traits;
mod types;

pub use traits::{ChangeFeed, GenerationDriver, KeyValueStore};
pub use types::{StateKey, WriteBatch, WriteOp};
