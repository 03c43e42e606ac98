//! Terminal results of a driver run.

use manifail_core::{Abort, RetriesExceeded, Signal};
use std::fmt;

/// Which terminal state a run ended in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalKind {
    /// The work returned a value.
    Success,
    /// The work, a cancellation or an invalid signal stopped the run.
    Aborted,
    /// The delay schedule or retry ceiling ran out.
    RetriesExceeded,
}

impl fmt::Display for TerminalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminalKind::Success => write!(f, "success"),
            TerminalKind::Aborted => write!(f, "aborted"),
            TerminalKind::RetriesExceeded => write!(f, "retries_exceeded"),
        }
    }
}

/// The single terminal result of a driver run.
///
/// # Examples
///
/// ```
/// use manifail::{Abort, Outcome, TerminalKind};
///
/// let outcome: Outcome<u32, &str> = Outcome::Aborted {
///     abort: Abort::with_value("stop"),
///     retries: 0,
/// };
/// assert_eq!(outcome.kind(), TerminalKind::Aborted);
/// assert!(outcome.into_result().is_err());
/// ```
#[derive(Debug, PartialEq)]
pub enum Outcome<T, V> {
    /// The work completed after `retries` retries.
    Success {
        /// What the work returned.
        value: T,
        /// Retries performed before the successful attempt.
        retries: u32,
    },
    /// The run was aborted after `retries` retries.
    Aborted {
        /// The abort, exactly as raised.
        abort: Abort<V>,
        /// Retries performed before the abort.
        retries: u32,
    },
    /// The retry budget ran out.
    Failed(RetriesExceeded<V>),
}

impl<T, V> Outcome<T, V> {
    /// Returns the terminal state.
    pub fn kind(&self) -> TerminalKind {
        match self {
            Outcome::Success { .. } => TerminalKind::Success,
            Outcome::Aborted { .. } => TerminalKind::Aborted,
            Outcome::Failed(_) => TerminalKind::RetriesExceeded,
        }
    }

    /// Returns how many retries the run performed.
    pub fn retries(&self) -> u32 {
        match self {
            Outcome::Success { retries, .. } | Outcome::Aborted { retries, .. } => *retries,
            Outcome::Failed(exceeded) => exceeded.retries(),
        }
    }

    /// Returns `true` if the work completed.
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    /// Returns the success value, discarding failures.
    pub fn success(self) -> Option<T> {
        match self {
            Outcome::Success { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Converts into a `Result`, with the terminal signal on failure.
    pub fn into_result(self) -> Result<T, Signal<V>> {
        match self {
            Outcome::Success { value, .. } => Ok(value),
            Outcome::Aborted { abort, .. } => Err(Signal::Abort(abort)),
            Outcome::Failed(exceeded) => Err(Signal::RetriesExceeded(exceeded)),
        }
    }
}
