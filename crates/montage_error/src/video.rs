//! Video backend error types.

/// Specific error conditions for video generation backends.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum VideoBackendErrorKind {
    /// Backend id is not registered in the capability table
    #[display("Unknown video backend: {}", _0)]
    UnknownBackend(String),
    /// No backends were configured for dispatch
    #[display("No video backends configured")]
    NoBackends,
    /// Every backend in the fallback list failed for a scene
    #[display("Scene {} failed on all {} backends: {}", scene_number, attempted, last_error)]
    FallbacksExhausted {
        /// Scene that failed
        scene_number: u32,
        /// Number of backends attempted
        attempted: usize,
        /// Last failure message
        last_error: String,
    },
    /// A scene could not be shaped into a request for a backend
    #[display("Scene {} cannot be shaped into a video request: {}", scene_number, message)]
    InvalidRequest {
        /// Scene being shaped
        scene_number: u32,
        /// What made the request unusable
        message: String,
    },
    /// Every scene failed, nothing to assemble
    #[display("All {} scenes failed video generation", _0)]
    AllScenesFailed(usize),
}

/// Error type for video generation (VideoBackendFailure).
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Video Backend Error: {} at line {} in {}", kind, line, file)]
pub struct VideoBackendError {
    /// The specific error condition
    pub kind: VideoBackendErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl VideoBackendError {
    /// Create a new VideoBackendError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: VideoBackendErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
