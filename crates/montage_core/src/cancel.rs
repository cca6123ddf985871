//! Cooperative cancellation.

use montage_error::{PipelineError, PipelineErrorKind};
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Shared flag checked at the start of every unit of work and raced against
/// in-flight calls.
///
/// Clones observe the same flag. Cancellation is one-way.
///
/// # Examples
///
/// ```
/// use montage_core::CancellationFlag;
///
/// let flag = CancellationFlag::new();
/// let observer = flag.clone();
/// assert!(observer.check().is_ok());
///
/// flag.cancel();
/// assert!(observer.is_cancelled());
/// assert!(observer.check().is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(CancellationToken);

impl CancellationFlag {
    /// Create a flag in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation and wake every pending [`CancellationFlag::cancelled`].
    pub fn cancel(&self) {
        self.0.cancel();
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.is_cancelled()
    }

    /// Return `PipelineErrorKind::Cancelled` once cancellation was requested.
    #[track_caller]
    pub fn check(&self) -> Result<(), PipelineError> {
        if self.is_cancelled() {
            Err(PipelineError::new(PipelineErrorKind::Cancelled))
        } else {
            Ok(())
        }
    }

    /// Resolves once cancellation is requested.
    pub async fn cancelled(&self) {
        self.0.cancelled().await
    }

    /// Run `work` unless cancellation arrives first.
    ///
    /// On cancellation `work` is dropped mid-flight and the result is
    /// `PipelineErrorKind::Cancelled`. A flag raised before the call never
    /// polls `work`.
    ///
    /// # Examples
    ///
    /// ```
    /// use montage_core::CancellationFlag;
    /// use montage_error::PipelineError;
    ///
    /// # let rt = tokio::runtime::Runtime::new().unwrap();
    /// # rt.block_on(async {
    /// let flag = CancellationFlag::new();
    /// flag.cancel();
    /// let result: Result<(), PipelineError> = flag.guard(std::future::pending()).await;
    /// assert!(result.is_err());
    /// # });
    /// ```
    pub async fn guard<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: From<PipelineError>,
    {
        tokio::select! {
            biased;
            _ = self.0.cancelled() => Err(PipelineError::new(PipelineErrorKind::Cancelled).into()),
            result = work => result,
        }
    }
}
