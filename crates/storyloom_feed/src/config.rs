//! Feed connection settings.

use serde::{Deserialize, Serialize};

/// Where and how to poll the recent-changes API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct FeedConfig {
    /// Full URL of the `api.php` endpoint
    #[serde(default = "default_endpoint")]
    endpoint: String,

    /// Edits requested per poll
    #[serde(default = "default_limit")]
    limit: u32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,

    /// User-Agent sent with every request
    #[serde(default = "default_user_agent")]
    user_agent: String,
}

fn default_endpoint() -> String {
    "https://en.wikipedia.org/w/api.php".to_string()
}

fn default_limit() -> u32 {
    50
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    concat!(
        "storyloom/",
        env!("CARGO_PKG_VERSION"),
        " (https://github.com/crumplecup/storyloom)"
    )
    .to_string()
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            limit: default_limit(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl FeedConfig {
    /// Default settings against a different endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Set the number of edits requested per poll.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Set the request timeout.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}
