//! Edit events observed on the change feed.

use chrono::{DateTime, Utc};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// One observed change on the upstream feed.
///
/// Immutable once fetched; the feed is the source of truth.
///
/// # Examples
///
/// ```
/// use storyloom_core::EditEvent;
///
/// let edit = EditEvent::new("42", "2024-01-01T00:00:00Z".parse().unwrap(), "Temple", "", "Bob");
/// assert_eq!(edit.raw_text(), "Temple");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Getters)]
pub struct EditEvent {
    id: String,
    timestamp: DateTime<Utc>,
    title: String,
    comment: String,
    author: String,
}

impl EditEvent {
    /// Create a new edit event.
    pub fn new(
        id: impl Into<String>,
        timestamp: DateTime<Utc>,
        title: impl Into<String>,
        comment: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            timestamp,
            title: title.into(),
            comment: comment.into(),
            author: author.into(),
        }
    }

    /// The free text that inspires a phrase: the edit summary, or the page
    /// title when the summary is blank.
    pub fn raw_text(&self) -> &str {
        if self.comment.trim().is_empty() {
            &self.title
        } else {
            &self.comment
        }
    }
}
