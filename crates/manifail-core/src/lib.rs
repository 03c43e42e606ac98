//! Signal types for the manifail retry protocol.
//!
//! This crate has no runtime dependencies. It defines the closed vocabulary
//! a unit of work uses to steer a retry driver.
//!
//! # Core Types
//!
//! - [`Abort`] - Stop immediately, no further retries
//! - [`Reset`] - Retry after the next delay of a schedule
//! - [`Retried`] - Record that a retry happened (emitted by the driver)
//! - [`RetriesExceeded`] - The schedule ran out before the work succeeded
//! - [`Signal`] - The four signals as one enum
//! - [`Interrupt`] - What work returns instead of a value
//! - [`DelaySchedule`] - Immutable sequence of retry delays
//! - [`Detail`] - A payload value or an underlying [`Cause`], never both

mod detail;
mod error;
mod schedule;
mod signal;

pub use detail::{Cause, Detail};
pub use error::{ErrorKind, SignalError};
pub use schedule::DelaySchedule;
pub use signal::{Abort, Interrupt, Reset, RetriesExceeded, Retried, Signal};
