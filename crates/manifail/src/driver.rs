//! Retry driver for executing units of work.

use crate::config::RetryConfig;
use crate::error::Cancelled;
use crate::outcome::Outcome;
use crate::state::{RetryState, Transition};
use crate::work::{AttemptContext, Work};
use manifail_core::{Abort, DelaySchedule, Interrupt, Retried, Signal, SignalError};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A retry that just happened, as reported to [`RetryDriverBuilder::on_retry`].
#[derive(Debug)]
pub struct RetryEvent<'a, V> {
    /// Retries performed so far, including this one.
    pub attempt: u32,
    /// The delay waited before this retry.
    pub delay: Duration,
    /// The record carrying the payload or cause that triggered the retry.
    pub retried: &'a Retried<V>,
}

type RetryHook<V> = Arc<dyn Fn(&RetryEvent<'_, V>) + Send + Sync>;

/// Runs a unit of work, retrying it as its signals direct.
///
/// Each call to [`run`](Self::run) or [`run_fn`](Self::run_fn) owns its
/// own retry accounting, so one driver can serve concurrent runs.
pub struct RetryDriver<V> {
    schedule: DelaySchedule,
    max_retries: Option<u32>,
    cancellation: CancellationToken,
    on_retry: Option<RetryHook<V>>,
    label: String,
}

impl<V> fmt::Debug for RetryDriver<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryDriver")
            .field("schedule", &self.schedule)
            .field("max_retries", &self.max_retries)
            .field("cancelled", &self.cancellation.is_cancelled())
            .field("label", &self.label)
            .finish()
    }
}

impl<V> RetryDriver<V> {
    /// Creates a new driver builder.
    pub fn builder() -> RetryDriverBuilder<V> {
        RetryDriverBuilder::new()
    }

    /// Creates a driver from a config, with no retry hook.
    pub fn from_config(config: &RetryConfig) -> Self {
        Self::builder().config(config).build()
    }

    /// Returns the default delay schedule.
    pub fn schedule(&self) -> &DelaySchedule {
        &self.schedule
    }

    /// Returns the retry ceiling, if any.
    pub fn max_retries(&self) -> Option<u32> {
        self.max_retries
    }

    /// Returns a handle that cancels pending retry waits.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Runs a [`Work`] implementation to a terminal outcome.
    ///
    /// # Errors
    ///
    /// Returns the work's own error, unchanged, if it fails outside the
    /// retry protocol.
    pub async fn run<W>(&self, work: &W) -> Result<Outcome<W::Output, V>, W::Error>
    where
        W: Work<Value = V> + ?Sized,
    {
        let name = work.name();
        self.drive(&name, |ctx| work.call(ctx)).await
    }

    /// Runs a closure to a terminal outcome.
    ///
    /// The closure is invoked once per attempt.
    ///
    /// # Errors
    ///
    /// Returns the closure's own error, unchanged, if it fails outside the
    /// retry protocol.
    ///
    /// # Examples
    ///
    /// ```
    /// use manifail::prelude::*;
    /// use std::time::Duration;
    ///
    /// # tokio_test::block_on(async {
    /// let driver = RetryDriver::builder()
    ///     .delays(DelaySchedule::fixed(3, Duration::from_millis(1)))
    ///     .build();
    ///
    /// let outcome = driver
    ///     .run_fn(|ctx| async move {
    ///         if ctx.attempt() < 2 {
    ///             return Err(Interrupt::<&str, ()>::from(Reset::inherit().carrying("busy")));
    ///         }
    ///         Ok(ctx.attempt() * 10)
    ///     })
    ///     .await;
    ///
    /// assert_eq!(outcome, Ok(Outcome::Success { value: 20, retries: 2 }));
    /// # });
    /// ```
    pub async fn run_fn<T, E, F, Fut>(&self, work: F) -> Result<Outcome<T, V>, E>
    where
        F: FnMut(AttemptContext) -> Fut,
        Fut: Future<Output = Result<T, Interrupt<V, E>>>,
    {
        self.drive(&self.label, work).await
    }

    async fn drive<T, E, F, Fut>(&self, name: &str, mut work: F) -> Result<Outcome<T, V>, E>
    where
        F: FnMut(AttemptContext) -> Fut,
        Fut: Future<Output = Result<T, Interrupt<V, E>>>,
    {
        let mut state = RetryState::new(self.schedule.clone(), self.max_retries);
        let cancellation = self.cancellation.child_token();

        loop {
            let ctx = AttemptContext::new(
                state.attempt(),
                state.remaining().clone(),
                cancellation.clone(),
            );

            let signal = match work(ctx).await {
                Ok(value) => {
                    debug!("Work '{}' completed after {} retries", name, state.attempt());
                    return Ok(Outcome::Success {
                        value,
                        retries: state.attempt(),
                    });
                }
                Err(Interrupt::Signal(signal)) => signal,
                Err(Interrupt::Invalid(error)) => {
                    warn!("Work '{}' raised an invalid signal: {}", name, error);
                    return Ok(self.abort_with(error.into_invalid_signal(), &state));
                }
                Err(Interrupt::Error(error)) => return Err(error),
            };

            let delay = match signal {
                Signal::Abort(abort) => {
                    warn!("Work '{}' aborted after {} retries", name, state.attempt());
                    return Ok(Outcome::Aborted {
                        abort,
                        retries: state.attempt(),
                    });
                }
                Signal::RetriesExceeded(exceeded) => {
                    warn!(
                        "Work '{}' reported retries exceeded ({} retries)",
                        name,
                        exceeded.retries()
                    );
                    return Ok(Outcome::Failed(exceeded));
                }
                Signal::Retried(_) => {
                    warn!("Work '{}' raised Retried, which only the driver emits", name);
                    let error = SignalError::MisdirectedRetried.into_invalid_signal();
                    return Ok(self.abort_with(error, &state));
                }
                Signal::Reset(reset) => match state.on_reset(reset) {
                    Transition::Wait(delay) => delay,
                    Transition::Exhausted(exceeded) => {
                        warn!(
                            "Work '{}' exhausted its schedule after {} retries",
                            name,
                            exceeded.retries()
                        );
                        return Ok(Outcome::Failed(exceeded));
                    }
                },
            };

            info!(
                "Work '{}' reset, retrying in {:?} ({} delays left)",
                name,
                delay,
                state.remaining().len()
            );

            if !wait(&cancellation, delay).await {
                warn!("Work '{}' cancelled while waiting to retry", name);
                let cancelled = Cancelled {
                    retries: state.attempt(),
                };
                return Ok(self.abort_with(cancelled, &state));
            }

            state.advance(|attempt, retried| {
                debug!("Work '{}' retry {} starting", name, attempt);
                if let Some(hook) = &self.on_retry {
                    hook(&RetryEvent {
                        attempt,
                        delay,
                        retried,
                    });
                }
            });
        }
    }

    fn abort_with<T, C>(&self, cause: C, state: &RetryState<V>) -> Outcome<T, V>
    where
        C: std::error::Error + Send + Sync + 'static,
    {
        Outcome::Aborted {
            abort: Abort::with_cause(cause),
            retries: state.attempt(),
        }
    }
}

/// Waits for `delay`, returning `false` if cancelled first.
async fn wait(cancellation: &CancellationToken, delay: Duration) -> bool {
    tokio::select! {
        biased;
        _ = cancellation.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

/// Builder for constructing [`RetryDriver`] instances.
pub struct RetryDriverBuilder<V> {
    schedule: DelaySchedule,
    max_retries: Option<u32>,
    cancellation: Option<CancellationToken>,
    on_retry: Option<RetryHook<V>>,
    label: String,
}

impl<V> Default for RetryDriverBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> RetryDriverBuilder<V> {
    /// Creates a builder with an empty schedule and no ceiling.
    pub fn new() -> Self {
        Self {
            schedule: DelaySchedule::empty(),
            max_retries: None,
            cancellation: None,
            on_retry: None,
            label: "work".to_string(),
        }
    }

    /// Sets the default schedule used by inheriting resets.
    pub fn delays(mut self, schedule: DelaySchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Caps retries regardless of schedule length.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Applies a [`RetryConfig`], replacing the schedule and ceiling.
    pub fn config(mut self, config: &RetryConfig) -> Self {
        self.schedule = config.schedule();
        self.max_retries = config.max_retries;
        self
    }

    /// Watches `token` during retry waits.
    ///
    /// Each run gets a child of `token`: cancelling `token` stops every run,
    /// while work cancelling its own [`AttemptContext::cancellation`] only
    /// stops its own run.
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Calls `hook` after every retry delay, before the work runs again.
    pub fn on_retry<F>(mut self, hook: F) -> Self
    where
        F: Fn(&RetryEvent<'_, V>) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(hook));
        self
    }

    /// Sets the name logged for closures passed to [`RetryDriver::run_fn`].
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Builds the driver.
    pub fn build(self) -> RetryDriver<V> {
        RetryDriver {
            schedule: self.schedule,
            max_retries: self.max_retries,
            cancellation: self.cancellation.unwrap_or_default(),
            on_retry: self.on_retry,
            label: self.label,
        }
    }
}
