//! Enrichment stage error types.

/// Specific error conditions for optional enrichment stages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum EnrichmentErrorKind {
    /// Stage collaborator call failed
    #[display("{} stage failed: {}", stage, message)]
    StageFailed {
        /// Stage name
        stage: String,
        /// Underlying failure
        message: String,
    },
}

/// Error type for enrichment stages (EnrichmentFailure). Never fatal.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Enrichment Error: {} at line {} in {}", kind, line, file)]
pub struct EnrichmentError {
    /// The specific error condition
    pub kind: EnrichmentErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl EnrichmentError {
    /// Create a new EnrichmentError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: EnrichmentErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
