use async_trait::async_trait;
use manifail::prelude::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, thiserror::Error)]
#[error("upstream unavailable")]
struct Unavailable;

#[derive(Debug, PartialEq)]
struct Fatal(&'static str);

/// Raises an inheriting reset until `resets` resets have been raised.
struct ResetThenSucceed {
    calls: Arc<AtomicU32>,
    resets: u32,
}

impl std::fmt::Debug for ResetThenSucceed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResetThenSucceed").finish()
    }
}

#[async_trait]
impl Work for ResetThenSucceed {
    type Output = u32;
    type Value = u32;
    type Error = Fatal;

    async fn call(&self, ctx: AttemptContext) -> Result<u32, Interrupt<u32, Fatal>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if ctx.attempt() < self.resets {
            return Err(Reset::inherit().carrying(ctx.attempt()).into());
        }
        Ok(42)
    }
}

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

#[tokio::test]
async fn test_n_resets_then_success() {
    for n in 0..5u32 {
        let driver = RetryDriver::builder()
            .delays(DelaySchedule::fixed(n as usize, ms(1)))
            .build();
        let calls = Arc::new(AtomicU32::new(0));
        let work = ResetThenSucceed {
            calls: calls.clone(),
            resets: n,
        };

        let outcome = driver.run(&work).await;

        assert_eq!(
            outcome,
            Ok(Outcome::Success {
                value: 42,
                retries: n
            })
        );
        assert_eq!(calls.load(Ordering::SeqCst), n + 1);
    }
}

#[tokio::test]
async fn test_always_reset_exhausts_schedule() {
    for len in 0..4u32 {
        let driver = RetryDriver::builder()
            .delays(DelaySchedule::fixed(len as usize, ms(1)))
            .build();
        let work = ResetThenSucceed {
            calls: Arc::new(AtomicU32::new(0)),
            resets: u32::MAX,
        };

        let outcome = driver.run(&work).await;

        // The final reset is raised on attempt `len` and carries that ordinal.
        assert_eq!(
            outcome,
            Ok(Outcome::Failed(RetriesExceeded::with_value(len, len)))
        );
    }
}

#[tokio::test]
async fn test_always_reset_with_cause_keeps_cause() {
    let driver: RetryDriver<()> = RetryDriver::builder()
        .delays(DelaySchedule::fixed(2, ms(1)))
        .build();

    let outcome = driver
        .run_fn(|_| async {
            Err::<(), Interrupt<(), Fatal>>(Reset::inherit().caused_by(Unavailable).into())
        })
        .await;

    match outcome {
        Ok(Outcome::Failed(exceeded)) => {
            assert_eq!(exceeded.retries(), 2);
            let cause = exceeded.cause().expect("cause is carried forward");
            assert_eq!(cause.to_string(), "upstream unavailable");
            assert!(cause.downcast_ref::<Unavailable>().is_some());
        }
        other => panic!("Unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_abort_short_circuits_at_every_attempt() {
    for k in 0..3u32 {
        let driver = RetryDriver::builder()
            .delays(DelaySchedule::fixed(3, ms(1)))
            .build();
        let calls = AtomicU32::new(0);

        let outcome = driver
            .run_fn(|ctx| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if ctx.attempt() == k {
                        return Err::<(), _>(Interrupt::<String, Fatal>::from(
                            Abort::with_value(format!("stop at {}", k)),
                        ));
                    }
                    Err(Reset::inherit().into())
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), k + 1);
        match outcome {
            Ok(Outcome::Aborted { abort, retries }) => {
                assert_eq!(retries, k);
                assert_eq!(abort.value(), Some(&format!("stop at {}", k)));
            }
            other => panic!("Unexpected outcome: {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_abort_cause_is_same_instance() {
    let cause: Cause = Arc::new(Unavailable);
    let raised = Arc::clone(&cause);
    let driver: RetryDriver<()> = RetryDriver::builder().build();

    let outcome = driver
        .run_fn(move |_| {
            let raised = Arc::clone(&raised);
            async move { Err::<(), Interrupt<(), Fatal>>(Abort::from_cause(raised).into()) }
        })
        .await;

    match outcome {
        Ok(Outcome::Aborted { abort, .. }) => {
            let carried = abort.cause().expect("abort keeps its cause");
            assert!(Arc::ptr_eq(carried, &cause));
        }
        other => panic!("Unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_schedule_single_reset_fails_without_wait() {
    let driver: RetryDriver<&str> = RetryDriver::builder().build();
    let started = Instant::now();

    let outcome = driver
        .run_fn(|_| async {
            Err::<(), Interrupt<&str, Fatal>>(Reset::inherit().carrying("busy").into())
        })
        .await;

    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(
        outcome,
        Ok(Outcome::Failed(RetriesExceeded::with_value(0, "busy")))
    );
}

#[tokio::test]
async fn test_two_resets_then_42() {
    let driver = RetryDriver::builder()
        .delays(DelaySchedule::from_millis(&[10, 20]).expect("valid"))
        .build();
    let calls = Arc::new(AtomicU32::new(0));
    let work = ResetThenSucceed {
        calls: calls.clone(),
        resets: 2,
    };

    let started = Instant::now();
    let outcome = driver.run(&work).await;

    assert!(started.elapsed() >= ms(30));
    assert_eq!(
        outcome,
        Ok(Outcome::Success {
            value: 42,
            retries: 2
        })
    );
}

#[tokio::test]
async fn test_abort_stop_with_empty_schedule() {
    let driver: RetryDriver<&str> = RetryDriver::builder().build();

    let outcome = driver
        .run_fn(|_| async { Err::<(), Interrupt<&str, Fatal>>(Abort::with_value("stop").into()) })
        .await;

    assert_eq!(
        outcome,
        Ok(Outcome::Aborted {
            abort: Abort::with_value("stop"),
            retries: 0
        })
    );
}

#[tokio::test]
async fn test_single_delay_then_second_reset_fails() {
    let driver: RetryDriver<()> = RetryDriver::builder()
        .delays(DelaySchedule::from_millis(&[5]).expect("valid"))
        .build();

    let outcome = driver
        .run_fn(|_| async { Err::<(), Interrupt<(), Fatal>>(Reset::inherit().into()) })
        .await;

    assert!(matches!(outcome, Ok(Outcome::Failed(ref exceeded)) if exceeded.retries() == 1));
}

#[tokio::test]
async fn test_explicit_schedule_renegotiation() {
    // The default schedule is long, but the work hands back a shorter one.
    let driver: RetryDriver<()> = RetryDriver::builder()
        .delays(DelaySchedule::fixed(10, ms(1)))
        .build();
    let calls = AtomicU32::new(0);

    let outcome = driver
        .run_fn(|ctx| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                let shorter = if ctx.attempt() == 0 {
                    DelaySchedule::fixed(1, ms(1))
                } else {
                    ctx.remaining().clone()
                };
                Err::<(), Interrupt<(), Fatal>>(Reset::new(shorter).into())
            }
        })
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(matches!(outcome, Ok(Outcome::Failed(ref exceeded)) if exceeded.retries() == 1));
}

#[tokio::test]
async fn test_longer_renegotiated_schedule_keeps_original_budget() {
    let driver: RetryDriver<()> = RetryDriver::builder()
        .delays(DelaySchedule::fixed(1, ms(1)))
        .build();
    let calls = AtomicU32::new(0);

    let outcome = driver
        .run_fn(|ctx| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                let schedule = if ctx.attempt() < 5 {
                    DelaySchedule::fixed(1, ms(1))
                } else {
                    DelaySchedule::empty()
                };
                Err::<(), Interrupt<(), Fatal>>(Reset::new(schedule).into())
            }
        })
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(matches!(outcome, Ok(Outcome::Failed(ref exceeded)) if exceeded.retries() == 1));
}

#[tokio::test]
async fn test_max_retries_from_config() {
    let json = r#"{"delaysMs": [1, 1, 1, 1], "maxRetries": 2}"#;
    let config: RetryConfig = serde_json::from_str(json).expect("valid json");
    let driver = RetryDriver::from_config(&config);
    let work = ResetThenSucceed {
        calls: Arc::new(AtomicU32::new(0)),
        resets: u32::MAX,
    };

    let outcome = driver.run(&work).await;

    assert_eq!(
        outcome,
        Ok(Outcome::Failed(RetriesExceeded::with_value(2, 2)))
    );
}

#[tokio::test]
async fn test_unrelated_error_is_not_retried() {
    let driver: RetryDriver<()> = RetryDriver::builder()
        .delays(DelaySchedule::fixed(3, ms(1)))
        .build();
    let calls = AtomicU32::new(0);

    let result = driver
        .run_fn(|_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(Interrupt::Error(Fatal("disk on fire"))) }
        })
        .await;

    assert_eq!(result, Err(Fatal("disk on fire")));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_work_observes_cancellation_while_running() {
    let token = CancellationToken::new();
    let driver: RetryDriver<&str> = RetryDriver::builder()
        .delays(DelaySchedule::fixed(3, ms(1)))
        .cancellation(token.clone())
        .build();

    let outcome = driver
        .run_fn(|ctx| {
            let token = token.clone();
            async move {
                if ctx.attempt() == 1 {
                    token.cancel();
                }
                if ctx.is_cancelled() {
                    return Err::<(), _>(Interrupt::<&str, Fatal>::from(Abort::with_value(
                        "cancelled",
                    )));
                }
                Err(Reset::inherit().into())
            }
        })
        .await;

    assert_eq!(
        outcome,
        Ok(Outcome::Aborted {
            abort: Abort::with_value("cancelled"),
            retries: 1
        })
    );
}

#[tokio::test]
async fn test_run_cancelling_its_context_does_not_affect_other_runs() {
    let driver: RetryDriver<()> = RetryDriver::builder()
        .delays(DelaySchedule::fixed(1, ms(1)))
        .build();

    let first = driver
        .run_fn(|ctx| async move {
            ctx.cancellation().cancel();
            Err::<u32, Interrupt<(), Fatal>>(Abort::<()>::new().into())
        })
        .await;
    assert_eq!(first.map(|o| o.kind()), Ok(TerminalKind::Aborted));

    let second = driver
        .run_fn(|ctx| async move {
            if ctx.attempt() == 0 {
                return Err(Interrupt::<(), Fatal>::from(Reset::<()>::inherit()));
            }
            Ok(7)
        })
        .await;

    assert_eq!(
        second,
        Ok(Outcome::Success {
            value: 7,
            retries: 1
        })
    );
}

#[tokio::test]
async fn test_concurrent_runs_do_not_share_state() {
    let driver = Arc::new(
        RetryDriver::builder()
            .delays(DelaySchedule::fixed(3, ms(5)))
            .build(),
    );

    let handles: Vec<_> = (0..4u32)
        .map(|resets| {
            let driver = Arc::clone(&driver);
            tokio::spawn(async move {
                let work = ResetThenSucceed {
                    calls: Arc::new(AtomicU32::new(0)),
                    resets: resets.min(3),
                };
                driver.run(&work).await.map(|o| o.retries())
            })
        })
        .collect();

    let mut retries = Vec::new();
    for handle in handles {
        retries.push(handle.await.expect("task finished"));
    }

    assert_eq!(retries, vec![Ok(0), Ok(1), Ok(2), Ok(3)]);
}
