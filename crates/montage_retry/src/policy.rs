//! Bounded retry with exponential backoff, per-call timeouts and fallbacks.

use montage_core::{CancellationFlag, RetryConfig};
use montage_error::{
    CollaboratorError, CollaboratorErrorKind, MontageError, MontageResult, RetryableError,
};
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio_retry2::strategy::{ExponentialBackoff, jitter};
use tokio_retry2::{Retry, RetryError};
use tracing::{debug, warn};

/// Result of running an operation against an ordered list of targets.
#[derive(Debug)]
pub enum Fallback<K, T> {
    /// A target produced a value.
    Succeeded {
        /// Target that succeeded
        target: K,
        /// Produced value
        value: T,
        /// Number of targets tried, including the successful one
        attempted: usize,
    },
    /// Every target failed.
    Exhausted {
        /// Number of targets tried
        attempted: usize,
        /// Error reported by the last target
        last_error: Option<MontageError>,
    },
}

/// Centralized retry policy applied to every external call.
///
/// # Examples
///
/// ```
/// use montage_core::RetryConfig;
/// use montage_retry::RetryPolicy;
///
/// # let rt = tokio::runtime::Runtime::new().unwrap();
/// # rt.block_on(async {
/// let policy = RetryPolicy::new(RetryConfig::default());
/// let value = policy
///     .execute("answer", || async { Ok::<_, montage_error::MontageError>(42) })
///     .await
///     .unwrap();
/// assert_eq!(value, 42);
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Create a policy from configuration.
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Policy configuration.
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Backoff delays between attempts. One fewer than `max_attempts`.
    ///
    /// `ExponentialBackoff` raises its base to the attempt number, so the
    /// growth factor is the base and the initial backoff is the multiplier.
    fn strategy(&self) -> Box<dyn Iterator<Item = Duration> + Send> {
        let retries = self.config.max_attempts().saturating_sub(1) as usize;
        let base = (*self.config.backoff_factor()).max(1);
        let scale = (*self.config.initial_backoff_ms() / base).max(1);
        let backoff = ExponentialBackoff::from_millis(base)
            .factor(scale)
            .max_delay(Duration::from_millis(*self.config.max_delay_ms()));
        if *self.config.jitter() {
            Box::new(backoff.map(jitter).take(retries))
        } else {
            Box::new(backoff.take(retries))
        }
    }

    /// Run `action` until it succeeds, fails permanently, or the attempt
    /// budget is spent.
    ///
    /// Each attempt is bounded by `call_timeout_ms`; an elapsed timeout is a
    /// retryable [`CollaboratorErrorKind::Timeout`] that consumes one attempt.
    #[tracing::instrument(skip(self, action), fields(max_attempts = self.config.max_attempts()))]
    pub async fn execute<T, F, Fut>(&self, operation: &str, action: F) -> MontageResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = MontageResult<T>>,
    {
        let timeout_ms = *self.config.call_timeout_ms();
        let timeout = Duration::from_millis(timeout_ms);
        let attempts = AtomicU32::new(0);
        let action = &action;
        let attempts = &attempts;

        Retry::spawn(self.strategy(), move || {
            let call = action();
            let attempt = attempts.fetch_add(1, Ordering::Relaxed) + 1;
            async move {
                let result = match tokio::time::timeout(timeout, call).await {
                    Ok(result) => result,
                    Err(_) => Err(CollaboratorError::new(CollaboratorErrorKind::Timeout(timeout_ms))
                        .into()),
                };
                match result {
                    Ok(value) => {
                        debug!(operation, attempt, "Call succeeded");
                        Ok(value)
                    }
                    Err(e) if e.is_retryable() => {
                        warn!(operation, attempt, error = %e, "Transient failure, will retry");
                        Err(RetryError::Transient {
                            err: e,
                            retry_after: None,
                        })
                    }
                    Err(e) => {
                        warn!(operation, attempt, error = %e, "Permanent failure, not retrying");
                        Err(RetryError::Permanent(e))
                    }
                }
            }
        })
        .await
    }

    /// Run `action` against each target in order until one succeeds.
    ///
    /// Every target gets the full retry budget of [`RetryPolicy::execute`].
    /// Each target's attempts and backoff delays are raced against the
    /// cancellation flag, so a raised flag abandons the in-flight call and
    /// returns the cancellation error instead of trying the next target.
    pub async fn execute_with_fallback<K, T, F, Fut>(
        &self,
        operation: &str,
        targets: &[K],
        cancel: &CancellationFlag,
        action: F,
    ) -> MontageResult<Fallback<K, T>>
    where
        K: Clone + std::fmt::Display,
        F: Fn(K) -> Fut,
        Fut: Future<Output = MontageResult<T>>,
    {
        let mut last_error = None;
        for (index, target) in targets.iter().enumerate() {
            cancel.check()?;
            let attempt = cancel
                .guard(self.execute(operation, || action(target.clone())))
                .await;
            match attempt {
                Err(e) if e.is_cancelled() => return Err(e),
                Ok(value) => {
                    return Ok(Fallback::Succeeded {
                        target: target.clone(),
                        value,
                        attempted: index + 1,
                    });
                }
                Err(e) => {
                    let remaining = targets.len() - index - 1;
                    warn!(operation, %target, remaining, error = %e, "Target failed, moving to next");
                    last_error = Some(e);
                }
            }
        }
        Ok(Fallback::Exhausted {
            attempted: targets.len(),
            last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_yields_one_delay_fewer_than_attempts() {
        let config = RetryConfig::default().with_max_attempts(4u32).with_jitter(false);
        let policy = RetryPolicy::new(config);
        assert_eq!(policy.strategy().count(), 3);
    }

    #[test]
    fn single_attempt_has_no_delays() {
        let config = RetryConfig::default().with_max_attempts(1u32);
        assert_eq!(RetryPolicy::new(config).strategy().count(), 0);
    }

    #[test]
    fn delays_never_exceed_max_delay() {
        let config = RetryConfig::default()
            .with_max_attempts(10u32)
            .with_initial_backoff_ms(100u64)
            .with_max_delay_ms(400u64)
            .with_jitter(false);
        let policy = RetryPolicy::new(config);
        assert!(policy.strategy().all(|d| d <= Duration::from_millis(400)));
    }
}
