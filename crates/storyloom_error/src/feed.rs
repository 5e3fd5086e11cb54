//! Change feed error types.

/// Reasons the change feed could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum FeedErrorKind {
    /// The request never produced a response
    #[display("Feed request failed: {}", _0)]
    Request(String),
    /// The request exceeded its deadline
    #[display("Feed request timed out: {}", _0)]
    Timeout(String),
    /// Upstream answered with a non-success status
    #[display("Feed returned status {}", _0)]
    Status(u16),
    /// Upstream reported an API-level error in an otherwise valid body
    #[display("Feed API error {}: {}", code, info)]
    Api {
        /// Error code reported by the feed
        code: String,
        /// Human-readable description
        info: String,
    },
    /// The body did not match the expected schema
    #[display("Malformed feed response: {}", _0)]
    Malformed(String),
}

/// Change feed error with location tracking.
///
/// Every variant is recovered the same way: the poll is skipped and the cursor
/// stays where it was.
///
/// # Examples
///
/// ```
/// use storyloom_error::{FeedError, FeedErrorKind};
///
/// let err = FeedError::new(FeedErrorKind::Status(503));
/// assert!(format!("{}", err).contains("503"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Feed Error: {} at line {} in {}", kind, line, file)]
pub struct FeedError {
    /// The kind of error that occurred
    pub kind: FeedErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl FeedError {
    /// Create a new feed error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: FeedErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
