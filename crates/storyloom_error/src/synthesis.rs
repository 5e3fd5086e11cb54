//! Phrase synthesis error types.

/// Specific failure conditions of a generation call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum SynthesisErrorKind {
    /// The request never produced a response
    #[display("Generation request failed: {}", _0)]
    Request(String),
    /// The request exceeded its deadline
    #[display("Generation request timed out: {}", _0)]
    Timeout(String),
    /// Upstream answered with a non-success status
    #[display("Generation service returned status {}: {}", status, body)]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, possibly truncated
        body: String,
    },
    /// The body did not match the expected response schema
    #[display("Malformed generation response: {}", _0)]
    MalformedResponse(String),
    /// Any other upstream failure surfaced by a driver
    #[display("Generation backend error: {}", _0)]
    Backend(String),
}

/// Error type for a single failed synthesis.
///
/// The edit that triggered it is dropped for the current cycle.
///
/// # Examples
///
/// ```
/// use storyloom_error::{SynthesisError, SynthesisErrorKind};
///
/// let err = SynthesisError::new(SynthesisErrorKind::MalformedResponse("no choices".into()));
/// assert!(format!("{}", err).contains("no choices"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Synthesis Error: {} at line {} in {}", kind, line, file)]
pub struct SynthesisError {
    /// The specific error condition
    pub kind: SynthesisErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl SynthesisError {
    /// Create a new SynthesisError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: SynthesisErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
