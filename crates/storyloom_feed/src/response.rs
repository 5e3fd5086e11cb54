//! Wire types of the recent-changes API.
//!
//! Only the fields storyloom reads are modelled. A body that carries neither
//! `query` nor `error` is treated as malformed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storyloom_core::EditEvent;

/// Top-level API response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentChangesResponse {
    /// Result payload on success
    #[serde(default)]
    pub query: Option<Query>,
    /// API-level failure
    #[serde(default)]
    pub error: Option<ApiError>,
}

/// The `query` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Changes, newest first
    pub recentchanges: Vec<RecentChange>,
}

/// One entry of `list=recentchanges`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentChange {
    /// Recent-changes id, unique per entry
    pub rcid: u64,
    /// Page title
    #[serde(default)]
    pub title: String,
    /// Edit summary; absent when suppressed
    #[serde(default)]
    pub comment: Option<String>,
    /// When the change happened
    pub timestamp: DateTime<Utc>,
    /// Author; absent when hidden
    #[serde(default)]
    pub user: Option<String>,
}

/// The `error` object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Machine-readable code
    pub code: String,
    /// Description
    #[serde(default)]
    pub info: String,
}

impl From<RecentChange> for EditEvent {
    fn from(change: RecentChange) -> Self {
        EditEvent::new(
            change.rcid.to_string(),
            change.timestamp,
            change.title,
            change.comment.unwrap_or_default(),
            change.user.unwrap_or_default(),
        )
    }
}
