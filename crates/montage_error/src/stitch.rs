//! Stitch error types.

/// Specific error conditions for stitching clips together.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StitchErrorKind {
    /// There were no clips to stitch
    #[display("No clips available to stitch")]
    NoClips,
    /// Editor collaborator failed to stitch
    #[display("Editor failed to stitch {} clips: {}", clip_count, message)]
    Editor {
        /// Number of clips submitted
        clip_count: usize,
        /// Underlying failure
        message: String,
    },
}

/// Error type for stitching (StitchFailure). Always fatal for the run.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Stitch Error: {} at line {} in {}", kind, line, file)]
pub struct StitchError {
    /// The specific error condition
    pub kind: StitchErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl StitchError {
    /// Create a new StitchError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StitchErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
