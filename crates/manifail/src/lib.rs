//! A retry driver steered by signals from the work it runs.
//!
//! A unit of work returns a value, or one of four signals:
//!
//! - [`Abort`] - stop now, no further retries
//! - [`Reset`] - retry after the next delay of a schedule
//! - [`RetriesExceeded`] - give up, reporting how many retries happened
//! - [`Retried`] - emitted by the driver after each retry, never by work
//!
//! The [`RetryDriver`] interprets those signals and returns exactly one
//! [`Outcome`]: `Success`, `Aborted` or `Failed`. Errors outside the
//! protocol pass through untouched.
//!
//! # Example
//!
//! ```rust
//! use manifail::prelude::*;
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let driver = RetryDriver::builder()
//!     .delays(DelaySchedule::from_millis(&[10, 20])?)
//!     .build();
//!
//! let outcome = driver
//!     .run_fn(|ctx| async move {
//!         match ctx.attempt() {
//!             0 | 1 => Err(Interrupt::<(), std::io::Error>::from(Reset::inherit())),
//!             _ => Ok(42),
//!         }
//!     })
//!     .await?;
//!
//! assert_eq!(outcome, Outcome::Success { value: 42, retries: 2 });
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # }).unwrap();
//! ```

mod config;
mod driver;
mod error;
mod outcome;
mod state;
mod work;

// Re-export core types
pub use manifail_core::*;

pub use config::RetryConfig;
pub use driver::{RetryDriver, RetryDriverBuilder, RetryEvent};
pub use error::Cancelled;
pub use outcome::{Outcome, TerminalKind};
pub use work::{AttemptContext, Work};

/// Cancellation handle accepted by [`RetryDriverBuilder::cancellation`].
pub use tokio_util::sync::CancellationToken;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        Abort, AttemptContext, CancellationToken, Cause, DelaySchedule, Detail, Interrupt,
        Outcome, Reset, RetriesExceeded, Retried, RetryConfig, RetryDriver, RetryDriverBuilder,
        Signal, SignalError, TerminalKind, Work,
    };
}
