//! High-water mark of the consumed change feed.

use crate::EditEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Position of the most recent edit already folded into the story.
///
/// The unset state is modelled as `Option<Cursor>::None` by callers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "camelCase")]
#[display("{last_timestamp}#{last_id}")]
pub struct Cursor {
    /// Timestamp of the newest processed edit
    pub last_timestamp: DateTime<Utc>,
    /// Feed id of the newest processed edit
    pub last_id: String,
}

impl Cursor {
    /// Create a cursor at an explicit position.
    pub fn new(last_timestamp: DateTime<Utc>, last_id: impl Into<String>) -> Self {
        Self {
            last_timestamp,
            last_id: last_id.into(),
        }
    }

    /// Cursor pointing at the given edit.
    pub fn at(edit: &EditEvent) -> Self {
        Self::new(*edit.timestamp(), edit.id().clone())
    }
}
