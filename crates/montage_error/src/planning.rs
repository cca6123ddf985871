//! Storyboard planning error types.

/// Specific error conditions for storyboard planning.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum PlanningErrorKind {
    /// Planner response contained no parseable payload
    #[display("No storyboard payload found in planner response: {}", _0)]
    MissingPayload(String),
    /// Planner payload does not match the storyboard schema
    #[display("Storyboard schema violation: {}", _0)]
    SchemaInvalid(String),
    /// Planner returned fewer scenes than required
    #[display("Planner returned {} scenes, {} required", actual, required)]
    TooFewScenes {
        /// Number of scenes required by the scene-count policy
        required: usize,
        /// Number of scenes the planner produced
        actual: usize,
    },
    /// Subject-bearing scenes exist but no subject description was provided
    #[display("Scenes {:?} feature the subject but subject_description is empty", _0)]
    MissingSubjectDescription(Vec<u32>),
    /// Prompt text was empty
    #[display("Prompt must not be empty")]
    EmptyPrompt,
}

/// Error type for storyboard planning (PlanningFailure).
///
/// Planning failures are retryable; once retries are exhausted the orchestrator
/// falls back to a deterministic template rather than failing the run.
///
/// # Examples
///
/// ```
/// use montage_error::{PlanningError, PlanningErrorKind};
///
/// let err = PlanningError::new(PlanningErrorKind::TooFewScenes { required: 5, actual: 2 });
/// assert!(format!("{}", err).contains("5 required"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Planning Error: {} at line {} in {}", kind, line, file)]
pub struct PlanningError {
    /// The specific error condition
    pub kind: PlanningErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl PlanningError {
    /// Create a new PlanningError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: PlanningErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
