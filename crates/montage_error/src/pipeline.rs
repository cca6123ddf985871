//! Generation pipeline error types.

/// Specific error conditions for the generation state machine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum PipelineErrorKind {
    /// Run was cancelled by the user (terminal, not a failure)
    #[display("Generation cancelled by user")]
    Cancelled,
    /// Generation id is unknown
    #[display("Unknown generation: {}", _0)]
    UnknownGeneration(String),
    /// A driver already owns this generation
    #[display("Generation {} already has a driver", _0)]
    DriverAlreadyClaimed(String),
    /// State transition not allowed from the current status
    #[display("Invalid transition from {} to {}", from, to)]
    InvalidTransition {
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },
    /// A stage panicked while the run was being driven
    #[display("Generation stage panicked: {}", _0)]
    StagePanicked(String),
}

/// Error type for the generation state machine.
///
/// # Examples
///
/// ```
/// use montage_error::{PipelineError, PipelineErrorKind};
///
/// let err = PipelineError::new(PipelineErrorKind::Cancelled);
/// assert!(format!("{}", err).contains("cancelled"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Pipeline Error: {} at line {} in {}", kind, line, file)]
pub struct PipelineError {
    /// The specific error condition
    pub kind: PipelineErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl PipelineError {
    /// Create a new PipelineError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: PipelineErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
