//! Clip cache error types.

/// Specific error conditions for the clip cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum CacheErrorKind {
    /// Failed to serialize fingerprint input
    #[display("Failed to compute fingerprint: {}", _0)]
    Fingerprint(String),
    /// Cache lock was poisoned by a panicking holder
    #[display("Clip cache lock poisoned")]
    Poisoned,
}

/// Clip cache error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Cache Error: {} at line {} in {}", kind, line, file)]
pub struct CacheError {
    /// The specific error condition
    pub kind: CacheErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl CacheError {
    /// Create a new CacheError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: CacheErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
