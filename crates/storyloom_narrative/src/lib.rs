//! The edit-to-story stages of storyloom.
//!
//! Each stage is usable on its own:
//!
//! - [`Sanitizer`]: strips structural noise from edit text and rejects
//!   low-quality tokens
//! - [`is_eligible`] / [`advance`]: feed cursor rules
//! - [`FeedPoller`]: eligible edits from a [`ChangeFeed`](storyloom_interface::ChangeFeed)
//! - [`PhraseSynthesizer`]: one edit plus story context to one candidate phrase
//! - [`StoryStore`]: validation gate, deduplication and atomic persistence
//!
//! The orchestrator that drives them on a timer lives in `storyloom_bot`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cursor;
mod poller;
mod prompt;
mod sanitizer;
mod story;
mod synthesizer;
mod validation;

pub use cursor::{advance, compare_cursors, is_eligible};
pub use poller::FeedPoller;
pub use prompt::{build_prompt, story_tail};
pub use sanitizer::{
    BANNED_TERMS, JARGON_FRAGMENTS, RemovalKind, RemovalRule, SanitizedText, Sanitizer,
    SanitizerConfig, TokenRejection,
};
pub use story::{MergeReport, StoryStore, phrase_signature};
pub use synthesizer::{PhraseSynthesizer, SynthesisConfig, clean_response, format_source_timestamp};
pub use validation::{FORBIDDEN_FRAGMENTS, NOISY_OPENERS, PhraseGate, Rejection};
