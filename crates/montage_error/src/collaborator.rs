//! Transport-level failures reported by external collaborators.
//!
//! Planning, image, video and editing collaborators all report failures through
//! this type. The kind decides whether the Retry Policy spends another attempt.

/// Collaborator failure conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum CollaboratorErrorKind {
    /// Service temporarily unavailable
    #[display("Service unavailable: {}", _0)]
    Unavailable(String),
    /// Service rejected the request due to rate limits
    #[display("Rate limited: {}", _0)]
    RateLimited(String),
    /// Call exceeded its timeout
    #[display("Call timed out after {} ms", _0)]
    Timeout(u64),
    /// HTTP-style status failure
    #[display("Status {} error: {}", status_code, message)]
    Status {
        /// Status code reported by the service
        status_code: u16,
        /// Error message
        message: String,
    },
    /// Request was rejected permanently (bad input, policy violation)
    #[display("Request rejected: {}", _0)]
    Rejected(String),
    /// Response could not be understood
    #[display("Invalid response: {}", _0)]
    InvalidResponse(String),
}

impl CollaboratorErrorKind {
    /// Check if this error type should be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            CollaboratorErrorKind::Unavailable(_) => true,
            CollaboratorErrorKind::RateLimited(_) => true,
            CollaboratorErrorKind::Timeout(_) => true,
            CollaboratorErrorKind::Status { status_code, .. } => {
                matches!(*status_code, 408 | 429 | 500 | 502 | 503 | 504)
            }
            CollaboratorErrorKind::Rejected(_) => false,
            CollaboratorErrorKind::InvalidResponse(_) => false,
        }
    }

    /// Get retry strategy parameters for this error type.
    ///
    /// Returns `(initial_backoff_ms, max_retries, max_delay_secs)`.
    pub fn retry_strategy_params(&self) -> (u64, usize, u64) {
        match self {
            CollaboratorErrorKind::RateLimited(_) => (5000, 3, 40),
            CollaboratorErrorKind::Status { status_code, .. } => match *status_code {
                429 => (5000, 3, 40),
                503 => (2000, 5, 60),
                500 | 502 | 504 => (1000, 3, 8),
                408 => (2000, 4, 30),
                _ => (2000, 5, 60),
            },
            CollaboratorErrorKind::Timeout(_) => (1000, 3, 10),
            _ => (2000, 5, 60),
        }
    }
}

/// Collaborator error with source location tracking.
///
/// # Examples
///
/// ```
/// use montage_error::{CollaboratorError, CollaboratorErrorKind, RetryableError};
///
/// let err = CollaboratorError::new(CollaboratorErrorKind::Timeout(30_000));
/// assert!(err.is_retryable());
///
/// let err = CollaboratorError::new(CollaboratorErrorKind::Rejected("nsfw".into()));
/// assert!(!err.is_retryable());
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Collaborator Error: {} at line {} in {}", kind, line, file)]
pub struct CollaboratorError {
    /// The kind of error that occurred
    pub kind: CollaboratorErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl CollaboratorError {
    /// Create a new CollaboratorError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: CollaboratorErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
