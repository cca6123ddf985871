//! Image chain error types.

/// Specific error conditions for sequential image chains.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ChainErrorKind {
    /// Generation failed at a chain position; later positions depend on it
    #[display("{} chain broke at position {}: {}", chain, position, message)]
    Broken {
        /// Chain label (reference, start, end)
        chain: String,
        /// 1-based position that failed
        position: usize,
        /// Underlying failure
        message: String,
    },
    /// Chain request had no prompts
    #[display("{} chain has no prompts", _0)]
    Empty(String),
    /// A link was not seeded with its predecessor
    #[display("{} chain position {} was not seeded with its predecessor", chain, position)]
    SeedMismatch {
        /// Chain label
        chain: String,
        /// 1-based position with the wrong seed
        position: usize,
    },
}

/// Error type for image chains (ChainGenerationFailure).
///
/// A chain failure is fatal for that chain: every later artifact is seeded by
/// the one that failed.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Chain Error: {} at line {} in {}", kind, line, file)]
pub struct ChainError {
    /// The specific error condition
    pub kind: ChainErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl ChainError {
    /// Create a new ChainError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ChainErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
