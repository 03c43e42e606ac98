//! The unit of work a driver runs.

use async_trait::async_trait;
use manifail_core::{DelaySchedule, Interrupt, Reset};
use tokio_util::sync::CancellationToken;

/// What a unit of work sees on each attempt.
#[derive(Debug, Clone)]
pub struct AttemptContext {
    attempt: u32,
    remaining: DelaySchedule,
    cancellation: CancellationToken,
}

impl AttemptContext {
    pub(crate) fn new(
        attempt: u32,
        remaining: DelaySchedule,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            attempt,
            remaining,
            cancellation,
        }
    }

    /// Returns how many retries preceded this attempt (0 on the first try).
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Returns the delays still available for later retries.
    pub fn remaining(&self) -> &DelaySchedule {
        &self.remaining
    }

    /// Returns this run's cancellation token.
    ///
    /// It is a child of the driver's token. Cancelling it stops only the
    /// current run's next wait.
    ///
    /// The driver does not preempt running work: work that wants to stop on
    /// cancellation checks this token and raises an abort.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Returns `true` if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Builds a reset that explicitly hands back the remaining schedule.
    pub fn reset<V>(&self) -> Reset<V> {
        Reset::new(self.remaining.clone())
    }
}

/// A unit of work that can be retried.
///
/// Return `Ok` on success. Return a signal through [`Interrupt`] to steer the
/// driver, or [`Interrupt::Error`] for failures outside the retry protocol.
///
/// # Examples
///
/// ```
/// use manifail::prelude::*;
/// use async_trait::async_trait;
///
/// #[derive(Debug)]
/// struct Ping;
///
/// #[async_trait]
/// impl Work for Ping {
///     type Output = &'static str;
///     type Value = ();
///     type Error = std::io::Error;
///
///     async fn call(
///         &self,
///         ctx: AttemptContext,
///     ) -> Result<Self::Output, Interrupt<(), std::io::Error>> {
///         if ctx.attempt() == 0 {
///             return Err(Reset::<()>::inherit().into());
///         }
///         Ok("pong")
///     }
/// }
/// ```
#[async_trait]
pub trait Work: Send + Sync {
    /// Value produced on success.
    type Output: Send;
    /// Payload type carried by signals.
    type Value: Send;
    /// Errors outside the retry protocol.
    type Error: Send;

    /// Runs one attempt.
    async fn call(
        &self,
        ctx: AttemptContext,
    ) -> Result<Self::Output, Interrupt<Self::Value, Self::Error>>;

    /// Returns the name used in logs.
    ///
    /// By default, uses the last segment of the type name.
    fn name(&self) -> String {
        let full_name = std::any::type_name::<Self>();
        full_name
            .split("::")
            .last()
            .unwrap_or("UnknownWork")
            .to_string()
    }
}
