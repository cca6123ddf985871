//! Tests for the retry policy and fallback executor.

use montage_core::{CancellationFlag, RetryConfig};
use montage_error::{
    CollaboratorError, CollaboratorErrorKind, MontageError, MontageErrorKind, MontageResult,
};
use montage_retry::{Fallback, RetryPolicy};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(
        RetryConfig::default()
            .with_max_attempts(max_attempts)
            .with_initial_backoff_ms(1u64)
            .with_max_delay_ms(5u64)
            .with_jitter(false)
            .with_call_timeout_ms(1_000u64),
    )
}

fn unavailable() -> MontageError {
    CollaboratorError::new(CollaboratorErrorKind::Unavailable("busy".to_string())).into()
}

fn rejected() -> MontageError {
    CollaboratorError::new(CollaboratorErrorKind::Rejected("bad input".to_string())).into()
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let policy = fast_policy(3);
    let calls = &AtomicUsize::new(0);

    let result = policy
        .execute("flaky", move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(unavailable())
            } else {
                Ok("clip")
            }
        })
        .await;

    assert_eq!(result.unwrap(), "clip");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_attempt_budget_is_bounded() {
    let policy = fast_policy(3);
    let calls = &AtomicUsize::new(0);

    let result: MontageResult<()> = policy
        .execute("always_down", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(unavailable())
        })
        .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_permanent_failure_is_not_retried() {
    let policy = fast_policy(5);
    let calls = &AtomicUsize::new(0);

    let result: MontageResult<()> = policy
        .execute("rejected", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(rejected())
        })
        .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_timeout_consumes_an_attempt() {
    let policy = RetryPolicy::new(
        RetryConfig::default()
            .with_max_attempts(2u32)
            .with_initial_backoff_ms(1u64)
            .with_max_delay_ms(5u64)
            .with_jitter(false)
            .with_call_timeout_ms(20u64),
    );
    let calls = &AtomicUsize::new(0);

    let result = policy
        .execute("slow_then_fast", move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
            Ok::<_, MontageError>(7)
        })
        .await;

    assert_eq!(result.unwrap(), 7);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_timeout_reported_when_budget_spent() {
    let policy = RetryPolicy::new(
        RetryConfig::default()
            .with_max_attempts(1u32)
            .with_call_timeout_ms(10u64),
    );

    let result: MontageResult<()> = policy
        .execute("hangs", || async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok(())
        })
        .await;

    let err = result.unwrap_err();
    match err.kind() {
        MontageErrorKind::Collaborator(e) => {
            assert_eq!(e.kind, CollaboratorErrorKind::Timeout(10));
        }
        other => panic!("Expected timeout, got {other}"),
    }
}

#[tokio::test]
async fn test_fallback_moves_to_next_target() {
    let policy = fast_policy(2);
    let cancel = CancellationFlag::new();
    let targets = vec!["primary".to_string(), "secondary".to_string()];
    let calls = AtomicUsize::new(0);

    let outcome = policy
        .execute_with_fallback("video", &targets, &cancel, |target: String| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if target == "primary" {
                    Err(unavailable())
                } else {
                    Ok(format!("clip from {target}"))
                }
            }
        })
        .await
        .unwrap();

    match outcome {
        Fallback::Succeeded {
            target,
            value,
            attempted,
        } => {
            assert_eq!(target, "secondary");
            assert_eq!(value, "clip from secondary");
            assert_eq!(attempted, 2);
        }
        Fallback::Exhausted { .. } => panic!("Expected success on secondary"),
    }
    // Two attempts on primary, one on secondary
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_fallback_exhausted_keeps_last_error() {
    let policy = fast_policy(1);
    let cancel = CancellationFlag::new();
    let targets = vec!["a".to_string(), "b".to_string(), "c".to_string()];

    let outcome: Fallback<String, ()> = policy
        .execute_with_fallback("video", &targets, &cancel, |_target: String| async {
            Err(rejected())
        })
        .await
        .unwrap();

    match outcome {
        Fallback::Exhausted {
            attempted,
            last_error,
        } => {
            assert_eq!(attempted, 3);
            assert!(last_error.unwrap().to_string().contains("bad input"));
        }
        Fallback::Succeeded { .. } => panic!("Expected exhaustion"),
    }
}

#[tokio::test]
async fn test_fallback_stops_when_cancelled() {
    let policy = fast_policy(1);
    let cancel = CancellationFlag::new();
    let targets = vec!["a".to_string(), "b".to_string()];
    let calls = AtomicUsize::new(0);

    let result: MontageResult<Fallback<String, ()>> = policy
        .execute_with_fallback("video", &targets, &cancel, |_target: String| {
            calls.fetch_add(1, Ordering::SeqCst);
            cancel.cancel();
            async { Err(unavailable()) }
        })
        .await;

    assert!(result.unwrap_err().is_cancelled());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_cancel_interrupts_in_flight_attempt() {
    let policy = RetryPolicy::new(
        RetryConfig::default()
            .with_max_attempts(5u32)
            .with_initial_backoff_ms(1_000u64)
            .with_jitter(false)
            .with_call_timeout_ms(60_000u64),
    );
    let cancel = CancellationFlag::new();
    let targets = vec!["a".to_string(), "b".to_string()];
    let calls = AtomicUsize::new(0);

    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let started = std::time::Instant::now();
    let result: MontageResult<Fallback<String, ()>> = policy
        .execute_with_fallback("video", &targets, &cancel, |_target: String| {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            }
        })
        .await;

    assert!(result.unwrap_err().is_cancelled());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(started.elapsed() < Duration::from_secs(5));
}
