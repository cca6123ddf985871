//! Top-level error wrapper types.

use crate::{
    CacheError, ChainError, CollaboratorError, ConfigError, EnrichmentError, PipelineError,
    PipelineErrorKind, PlanningError, PlanningErrorKind, RetryableError, StitchError,
    VideoBackendError,
};

/// The foundation error enum. Each stage contributes its own variant.
///
/// # Examples
///
/// ```
/// use montage_error::{CollaboratorError, CollaboratorErrorKind, MontageError};
///
/// let err: MontageError = CollaboratorError::new(CollaboratorErrorKind::Timeout(100)).into();
/// assert!(format!("{}", err).contains("timed out"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum MontageErrorKind {
    /// External collaborator failure
    #[from(CollaboratorError)]
    Collaborator(CollaboratorError),
    /// Storyboard planning failure
    #[from(PlanningError)]
    Planning(PlanningError),
    /// Image chain failure
    #[from(ChainError)]
    Chain(ChainError),
    /// Video backend failure
    #[from(VideoBackendError)]
    Video(VideoBackendError),
    /// Stitch failure
    #[from(StitchError)]
    Stitch(StitchError),
    /// Enrichment stage failure
    #[from(EnrichmentError)]
    Enrichment(EnrichmentError),
    /// Clip cache failure
    #[from(CacheError)]
    Cache(CacheError),
    /// Generation state machine failure
    #[from(PipelineError)]
    Pipeline(PipelineError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
}

/// Montage error with kind discrimination.
///
/// # Examples
///
/// ```
/// use montage_error::{ConfigError, MontageResult};
///
/// fn might_fail() -> MontageResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// assert!(might_fail().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Montage Error: {}", _0)]
pub struct MontageError(Box<MontageErrorKind>);

impl MontageError {
    /// Create a new error from a kind.
    pub fn new(kind: MontageErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &MontageErrorKind {
        &self.0
    }

    /// Whether this error is a user cancellation rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self.kind(),
            MontageErrorKind::Pipeline(PipelineError {
                kind: PipelineErrorKind::Cancelled,
                ..
            })
        )
    }
}

// Generic From implementation for any type that converts to MontageErrorKind
impl<T> From<T> for MontageError
where
    T: Into<MontageErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

impl RetryableError for MontageError {
    fn is_retryable(&self) -> bool {
        match self.kind() {
            MontageErrorKind::Collaborator(e) => e.is_retryable(),
            // Malformed planner output is worth another attempt
            MontageErrorKind::Planning(e) => !matches!(e.kind, PlanningErrorKind::EmptyPrompt),
            _ => false,
        }
    }

    fn retry_strategy_params(&self) -> (u64, usize, u64) {
        match self.kind() {
            MontageErrorKind::Collaborator(e) => e.retry_strategy_params(),
            _ => (2000, 5, 60),
        }
    }
}

/// Result type for Montage operations.
pub type MontageResult<T> = std::result::Result<T, MontageError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VideoBackendErrorKind;

    #[test]
    fn malformed_planner_output_is_retried() {
        let err: MontageError =
            PlanningError::new(PlanningErrorKind::SchemaInvalid("scenes missing".to_string()))
                .into();
        assert!(err.is_retryable());
    }

    #[test]
    fn unshapeable_request_is_permanent() {
        let err: MontageError = VideoBackendError::new(VideoBackendErrorKind::InvalidRequest {
            scene_number: 3,
            message: "scene prompt is empty".to_string(),
        })
        .into();
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("Scene 3"));
    }

    #[test]
    fn stage_panic_is_a_failure_not_a_cancellation() {
        let err: MontageError =
            PipelineError::new(PipelineErrorKind::StagePanicked("boom".to_string())).into();
        assert!(!err.is_cancelled());
        assert!(err.to_string().contains("panicked"));
    }
}
