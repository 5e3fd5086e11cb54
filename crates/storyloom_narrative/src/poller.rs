//! Change feed poller: new edits since the cursor.

use crate::is_eligible;
use storyloom_core::{Cursor, EditEvent};
use storyloom_error::StoryloomResult;
use storyloom_interface::ChangeFeed;
use tracing::instrument;

/// Fetches eligible edits from a [`ChangeFeed`].
#[derive(Debug, Clone)]
pub struct FeedPoller<F> {
    feed: F,
}

impl<F: ChangeFeed> FeedPoller<F> {
    /// Wrap a change feed.
    pub fn new(feed: F) -> Self {
        Self { feed }
    }

    /// The wrapped feed.
    pub fn feed(&self) -> &F {
        &self.feed
    }

    /// Edits not yet covered by `cursor`, newest first.
    ///
    /// Callers process the result in reverse to keep narrative chronology.
    ///
    /// # Errors
    ///
    /// Feed errors propagate unchanged; they classify as
    /// [`is_feed_unavailable`](storyloom_error::StoryloomError::is_feed_unavailable).
    #[instrument(skip(self), fields(feed = self.feed.feed_name()))]
    pub async fn fetch_since(&self, cursor: Option<&Cursor>) -> StoryloomResult<Vec<EditEvent>> {
        let mut edits = self.feed.recent_changes().await?;
        let fetched = edits.len();

        // Stable: edits sharing a timestamp keep the upstream order
        edits.sort_by(|a, b| b.timestamp().cmp(a.timestamp()));
        edits.retain(|edit| is_eligible(edit, cursor));

        tracing::debug!(fetched, eligible = edits.len(), "Polled change feed");
        Ok(edits)
    }
}
