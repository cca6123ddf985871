//! Per-backend rate limiting using governor and Tokio Semaphore.
//!
//! - **RPM** (requests per minute): enforced with a governor GCRA limiter
//! - **Concurrent requests**: enforced with a Tokio semaphore

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as GovernorRateLimiter};
use montage_core::BackendLimits;
use montage_error::{CollaboratorError, CollaboratorErrorKind, MontageResult};
use std::num::NonZeroU32;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

type DirectRateLimiter = GovernorRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Rate limiter for one video backend.
///
/// Cloning shares the underlying quota, so every clone draws from the same
/// budget.
///
/// # Examples
///
/// ```
/// use montage_core::BackendLimits;
/// use montage_retry::BackendLimiter;
///
/// let limiter = BackendLimiter::new(&BackendLimits { rpm: None, max_concurrent: Some(1) });
/// let guard = limiter.try_acquire();
/// assert!(guard.is_some());
/// assert!(limiter.try_acquire().is_none());
/// drop(guard);
/// assert!(limiter.try_acquire().is_some());
/// ```
#[derive(Clone)]
pub struct BackendLimiter {
    rpm_limiter: Option<Arc<DirectRateLimiter>>,
    concurrent_semaphore: Arc<Semaphore>,
}

impl BackendLimiter {
    /// Create a limiter enforcing every non-`None` limit.
    pub fn new(limits: &BackendLimits) -> Self {
        let rpm_limiter = limits.rpm.and_then(|rpm| {
            NonZeroU32::new(rpm).map(|n| Arc::new(GovernorRateLimiter::direct(Quota::per_minute(n))))
        });

        let max_concurrent = limits
            .max_concurrent
            .map(|n| n.max(1) as usize)
            .unwrap_or(Semaphore::MAX_PERMITS);

        Self {
            rpm_limiter,
            concurrent_semaphore: Arc::new(Semaphore::new(max_concurrent)),
        }
    }

    /// A limiter that never blocks.
    pub fn unlimited() -> Self {
        Self::new(&BackendLimits::default())
    }

    /// Wait until the backend may take another request.
    ///
    /// The returned guard holds a concurrency slot until dropped.
    pub async fn acquire(&self) -> MontageResult<LimiterGuard> {
        if let Some(limiter) = &self.rpm_limiter {
            limiter.until_ready().await;
        }

        // Concurrency slot last, so a slot is not held while waiting on quota
        let permit = self
            .concurrent_semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| {
                CollaboratorError::new(CollaboratorErrorKind::Unavailable(
                    "backend limiter closed".to_string(),
                ))
            })?;

        Ok(LimiterGuard { _permit: permit })
    }

    /// Acquire without waiting. `None` if any limit would block.
    pub fn try_acquire(&self) -> Option<LimiterGuard> {
        if let Some(limiter) = &self.rpm_limiter {
            limiter.check().ok()?;
        }
        let permit = self.concurrent_semaphore.clone().try_acquire_owned().ok()?;
        Some(LimiterGuard { _permit: permit })
    }

    /// Concurrency slots currently free.
    pub fn available_slots(&self) -> usize {
        self.concurrent_semaphore.available_permits()
    }
}

impl std::fmt::Debug for BackendLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendLimiter")
            .field("rpm_limited", &self.rpm_limiter.is_some())
            .field("available_slots", &self.available_slots())
            .finish()
    }
}

/// RAII guard releasing the concurrency slot when dropped.
#[derive(Debug)]
pub struct LimiterGuard {
    _permit: OwnedSemaphorePermit,
}
