//! Top-level error wrapper types.

use crate::{ConfigError, FeedError, HttpError, StorageError, SynthesisError};

/// Every error condition the pipeline can surface.
///
/// # Examples
///
/// ```
/// use storyloom_error::{StoryloomError, HttpError};
///
/// let http_err = HttpError::new("Connection failed");
/// let err: StoryloomError = http_err.into();
/// assert!(format!("{}", err).contains("HTTP Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum StoryloomErrorKind {
    /// HTTP error
    #[from(HttpError)]
    Http(HttpError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Change feed unavailable
    #[from(FeedError)]
    Feed(FeedError),
    /// Phrase synthesis failed
    #[from(SynthesisError)]
    Synthesis(SynthesisError),
    /// Persistence failed
    #[from(StorageError)]
    Storage(StorageError),
}

/// Storyloom error with kind discrimination.
///
/// # Examples
///
/// ```
/// use storyloom_error::{ConfigError, StoryloomResult};
///
/// fn might_fail() -> StoryloomResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// match might_fail() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Storyloom Error: {}", _0)]
pub struct StoryloomError(Box<StoryloomErrorKind>);

impl StoryloomError {
    /// Create a new error from a kind.
    pub fn new(kind: StoryloomErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &StoryloomErrorKind {
        &self.0
    }

    /// True when the change feed could not be read this cycle.
    pub fn is_feed_unavailable(&self) -> bool {
        matches!(self.kind(), StoryloomErrorKind::Feed(_))
    }

    /// True when a single synthesis call failed.
    pub fn is_synthesis_failed(&self) -> bool {
        matches!(self.kind(), StoryloomErrorKind::Synthesis(_))
    }

    /// True when durable state could not be written or read.
    pub fn is_persistence_failed(&self) -> bool {
        matches!(self.kind(), StoryloomErrorKind::Storage(_))
    }
}

// Generic From implementation for any type that converts to StoryloomErrorKind
impl<T> From<T> for StoryloomError
where
    T: Into<StoryloomErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for storyloom operations.
///
/// # Examples
///
/// ```
/// use storyloom_error::{StoryloomResult, HttpError};
///
/// fn fetch_data() -> StoryloomResult<String> {
///     Err(HttpError::new("404 Not Found"))?
/// }
/// ```
pub type StoryloomResult<T> = std::result::Result<T, StoryloomError>;
