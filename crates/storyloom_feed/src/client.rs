//! HTTP client for the recent-changes API.

use crate::{FeedConfig, RecentChangesResponse};
use async_trait::async_trait;
use std::time::Duration;
use storyloom_core::EditEvent;
use storyloom_error::{FeedError, FeedErrorKind, HttpError, StoryloomResult};
use storyloom_interface::ChangeFeed;
use tracing::instrument;

const RC_PROPERTIES: &str = "title|ids|user|timestamp|comment";

/// Polls a MediaWiki wiki for its most recent edits.
#[derive(Debug, Clone)]
pub struct RecentChangesClient {
    config: FeedConfig,
    client: reqwest::Client,
}

impl RecentChangesClient {
    /// Create a client with the configured timeout and user agent.
    ///
    /// # Errors
    ///
    /// Returns an HTTP error if the underlying client cannot be built.
    #[instrument(skip(config), fields(endpoint = %config.endpoint()))]
    pub fn new(config: FeedConfig) -> StoryloomResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(*config.timeout_secs()))
            .user_agent(config.user_agent().as_str())
            .gzip(true)
            .build()
            .map_err(|e| HttpError::new(format!("Failed to build feed client: {}", e)))?;

        tracing::debug!("Created recent-changes client");
        Ok(Self { config, client })
    }

    /// Active configuration.
    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Fetch and decode one page of recent changes.
    #[instrument(skip(self), fields(endpoint = %self.config.endpoint(), limit = *self.config.limit()))]
    pub async fn fetch(&self) -> Result<RecentChangesResponse, FeedError> {
        let limit = self.config.limit().to_string();
        let response = self
            .client
            .get(self.config.endpoint())
            .query(&[
                ("action", "query"),
                ("list", "recentchanges"),
                ("rcprop", RC_PROPERTIES),
                ("rclimit", limit.as_str()),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Feed request failed: {}", e);
                if e.is_timeout() {
                    FeedError::new(FeedErrorKind::Timeout(e.to_string()))
                } else {
                    FeedError::new(FeedErrorKind::Request(e.to_string()))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("Feed returned error: {}", status);
            return Err(FeedError::new(FeedErrorKind::Status(status.as_u16())));
        }

        let body = response.text().await.map_err(|e| {
            tracing::error!("Failed to read feed body: {}", e);
            FeedError::new(FeedErrorKind::Request(format!("reading body: {}", e)))
        })?;

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse feed response: {}", e);
            FeedError::new(FeedErrorKind::Malformed(e.to_string()))
        })
    }
}

/// Unpack a decoded response into edits, newest first.
pub(crate) fn into_edits(response: RecentChangesResponse) -> Result<Vec<EditEvent>, FeedError> {
    if let Some(error) = response.error {
        tracing::error!(code = %error.code, "Feed reported an API error");
        return Err(FeedError::new(FeedErrorKind::Api {
            code: error.code,
            info: error.info,
        }));
    }

    let query = response.query.ok_or_else(|| {
        FeedError::new(FeedErrorKind::Malformed(
            "response has neither query nor error".into(),
        ))
    })?;

    Ok(query
        .recentchanges
        .into_iter()
        .map(EditEvent::from)
        .collect())
}

#[async_trait]
impl ChangeFeed for RecentChangesClient {
    async fn recent_changes(&self) -> StoryloomResult<Vec<EditEvent>> {
        let edits = into_edits(self.fetch().await?)?;
        tracing::debug!(count = edits.len(), "Fetched recent changes");
        Ok(edits)
    }

    fn feed_name(&self) -> &str {
        self.config.endpoint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_body() {
        let response: RecentChangesResponse = serde_json::from_str(
            r#"{"error":{"code":"badvalue","info":"Unrecognized value for parameter \"list\""}}"#,
        )
        .unwrap();

        let err = into_edits(response).unwrap_err();
        assert!(matches!(err.kind, FeedErrorKind::Api { ref code, .. } if code == "badvalue"));
    }

    #[test]
    fn test_missing_query_is_malformed() {
        let response: RecentChangesResponse = serde_json::from_str(r#"{"batchcomplete":true}"#).unwrap();
        let err = into_edits(response).unwrap_err();
        assert!(matches!(err.kind, FeedErrorKind::Malformed(_)));
    }
}
