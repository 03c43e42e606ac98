//! The four retry signals and the interrupt a unit of work returns.

use crate::detail::{Cause, Detail};
use crate::error::SignalError;
use crate::schedule::DelaySchedule;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Generates the payload/cause accessors shared by every detail-carrying signal.
macro_rules! detail_accessors {
    ($name:ident) => {
        impl<V> $name<V> {
            /// Returns the payload value, if any.
            pub fn value(&self) -> Option<&V> {
                self.detail.value()
            }

            /// Returns the underlying cause, if any.
            pub fn cause(&self) -> Option<&Cause> {
                self.detail.as_cause()
            }

            /// Returns the attached payload or cause.
            pub fn detail(&self) -> &Detail<V> {
                &self.detail
            }

            /// Consumes the signal, returning its payload or cause.
            pub fn into_detail(self) -> Detail<V> {
                self.detail
            }
        }
    };
}

/// Work demands immediate termination. Never retried.
///
/// # Examples
///
/// ```
/// use manifail_core::Abort;
///
/// let abort = Abort::with_value("stop");
/// assert_eq!(abort.value(), Some(&"stop"));
/// assert!(abort.cause().is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Abort<V> {
    detail: Detail<V>,
}

impl<V> Abort<V> {
    /// Creates an abort carrying nothing.
    pub fn new() -> Self {
        Self {
            detail: Detail::Empty,
        }
    }

    /// Creates an abort carrying a payload value.
    pub fn with_value(value: V) -> Self {
        Self {
            detail: Detail::Value(value),
        }
    }

    /// Creates an abort caused by an error.
    pub fn with_cause<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self::from_cause(Arc::new(error))
    }

    /// Creates an abort from an already shared cause.
    pub fn from_cause(cause: Cause) -> Self {
        Self {
            detail: Detail::Cause(cause),
        }
    }

    /// Creates an abort from a detail.
    pub fn from_detail(detail: Detail<V>) -> Self {
        Self { detail }
    }
}

impl<V> Default for Abort<V> {
    fn default() -> Self {
        Self::new()
    }
}

detail_accessors!(Abort);

impl<V: fmt::Debug> fmt::Display for Abort<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.detail.is_empty() {
            write!(f, "Execution aborted")
        } else {
            write!(f, "Execution aborted: {}", self.detail)
        }
    }
}

impl<V: fmt::Debug> Error for Abort<V> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.detail.source()
    }
}

/// Work demands a retry.
///
/// Carries the remaining delay schedule to use for this and later retries.
/// A reset built with [`inherit`](Self::inherit) leaves the choice to the
/// driver, which continues with the schedule it already holds.
///
/// # Examples
///
/// ```
/// use manifail_core::{DelaySchedule, Reset};
/// use std::time::Duration;
///
/// let reset: Reset<()> = Reset::new(DelaySchedule::fixed(2, Duration::from_millis(50)));
/// assert_eq!(reset.delays().map(|d| d.len()), Some(2));
///
/// let reset = Reset::<&str>::inherit().carrying("busy");
/// assert!(reset.delays().is_none());
/// assert_eq!(reset.value(), Some(&"busy"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Reset<V> {
    delays: Option<DelaySchedule>,
    detail: Detail<V>,
}

impl<V> Reset<V> {
    /// Creates a reset with an explicit remaining schedule.
    ///
    /// An empty schedule means no retries are left.
    pub fn new(delays: DelaySchedule) -> Self {
        Self {
            delays: Some(delays),
            detail: Detail::Empty,
        }
    }

    /// Creates a reset that continues with the driver's current schedule.
    pub fn inherit() -> Self {
        Self {
            delays: None,
            detail: Detail::Empty,
        }
    }

    /// Creates a reset from signed millisecond delays.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError::InvalidDelay`] if any delay is negative.
    pub fn from_millis(millis: &[i64]) -> Result<Self, SignalError> {
        DelaySchedule::from_millis(millis).map(Self::new)
    }

    /// Attaches a payload value, replacing any previous detail.
    pub fn carrying(mut self, value: V) -> Self {
        self.detail = Detail::Value(value);
        self
    }

    /// Attaches a cause, replacing any previous detail.
    pub fn caused_by<E>(self, error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        self.caused_by_shared(Arc::new(error))
    }

    /// Attaches an already shared cause, replacing any previous detail.
    pub fn caused_by_shared(mut self, cause: Cause) -> Self {
        self.detail = Detail::Cause(cause);
        self
    }

    /// Returns the explicit schedule, or `None` if the reset inherits one.
    pub fn delays(&self) -> Option<&DelaySchedule> {
        self.delays.as_ref()
    }

    /// Consumes the reset, returning its schedule and detail.
    pub fn into_parts(self) -> (Option<DelaySchedule>, Detail<V>) {
        (self.delays, self.detail)
    }
}

detail_accessors!(Reset);

/// Informational record that a retry just happened.
///
/// Emitted by the driver, never by work. Carries the payload or cause that
/// triggered the retry.
#[derive(Debug, Clone, PartialEq)]
pub struct Retried<V> {
    detail: Detail<V>,
}

impl<V> Retried<V> {
    /// Creates a record carrying nothing.
    pub fn new() -> Self {
        Self {
            detail: Detail::Empty,
        }
    }

    /// Creates a record carrying a payload value.
    pub fn with_value(value: V) -> Self {
        Self {
            detail: Detail::Value(value),
        }
    }

    /// Creates a record caused by an error.
    pub fn with_cause<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self::from_cause(Arc::new(error))
    }

    /// Creates a record from an already shared cause.
    pub fn from_cause(cause: Cause) -> Self {
        Self {
            detail: Detail::Cause(cause),
        }
    }

    /// Creates a record from a detail.
    pub fn from_detail(detail: Detail<V>) -> Self {
        Self { detail }
    }
}

impl<V> Default for Retried<V> {
    fn default() -> Self {
        Self::new()
    }
}

detail_accessors!(Retried);

/// Terminal failure: the delay schedule ran out before the work succeeded.
///
/// # Examples
///
/// ```
/// use manifail_core::{RetriesExceeded, SignalError};
///
/// let exceeded = RetriesExceeded::with_value(3, "still busy");
/// assert_eq!(exceeded.retries(), 3);
/// assert_eq!(exceeded.to_string(), "Retries exceeded after 3 retries: \"still busy\"");
///
/// let invalid = RetriesExceeded::<()>::checked(-1);
/// assert_eq!(invalid, Err(SignalError::InvalidRetryCount(-1)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetriesExceeded<V> {
    retries: u32,
    detail: Detail<V>,
}

impl<V> RetriesExceeded<V> {
    /// Creates a signal recording `retries` attempts and nothing else.
    pub fn new(retries: u32) -> Self {
        Self::from_detail(retries, Detail::Empty)
    }

    /// Creates a signal from a signed retry count.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError::InvalidRetryCount`] if `retries` is negative
    /// or does not fit a `u32`.
    pub fn checked(retries: i64) -> Result<Self, SignalError> {
        u32::try_from(retries)
            .map(Self::new)
            .map_err(|_| SignalError::InvalidRetryCount(retries))
    }

    /// Creates a signal carrying the last observed payload value.
    pub fn with_value(retries: u32, value: V) -> Self {
        Self::from_detail(retries, Detail::Value(value))
    }

    /// Creates a signal carrying the last observed cause.
    pub fn with_cause<E>(retries: u32, error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self::from_cause(retries, Arc::new(error))
    }

    /// Creates a signal from an already shared cause.
    pub fn from_cause(retries: u32, cause: Cause) -> Self {
        Self::from_detail(retries, Detail::Cause(cause))
    }

    /// Creates a signal from a detail.
    pub fn from_detail(retries: u32, detail: Detail<V>) -> Self {
        Self { retries, detail }
    }

    /// Returns how many retries were consumed.
    pub fn retries(&self) -> u32 {
        self.retries
    }
}

detail_accessors!(RetriesExceeded);

impl<V: fmt::Debug> fmt::Display for RetriesExceeded<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Retries exceeded after {} retries", self.retries)?;
        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }
        Ok(())
    }
}

impl<V: fmt::Debug> Error for RetriesExceeded<V> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.detail.source()
    }
}

/// One of the four retry signals.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal<V> {
    /// Stop now.
    Abort(Abort<V>),
    /// Retry after the next delay.
    Reset(Reset<V>),
    /// A retry happened.
    Retried(Retried<V>),
    /// The retry budget is spent.
    RetriesExceeded(RetriesExceeded<V>),
}

impl<V> Signal<V> {
    /// Returns the signal name, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Signal::Abort(_) => "abort",
            Signal::Reset(_) => "reset",
            Signal::Retried(_) => "retried",
            Signal::RetriesExceeded(_) => "retries_exceeded",
        }
    }

    /// Returns `true` for signals that end a retry loop.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Signal::Abort(_) | Signal::RetriesExceeded(_))
    }

    /// Returns the attached payload or cause.
    pub fn detail(&self) -> &Detail<V> {
        match self {
            Signal::Abort(s) => s.detail(),
            Signal::Reset(s) => s.detail(),
            Signal::Retried(s) => s.detail(),
            Signal::RetriesExceeded(s) => s.detail(),
        }
    }
}

impl<V> From<Abort<V>> for Signal<V> {
    fn from(signal: Abort<V>) -> Self {
        Signal::Abort(signal)
    }
}

impl<V> From<Reset<V>> for Signal<V> {
    fn from(signal: Reset<V>) -> Self {
        Signal::Reset(signal)
    }
}

impl<V> From<Retried<V>> for Signal<V> {
    fn from(signal: Retried<V>) -> Self {
        Signal::Retried(signal)
    }
}

impl<V> From<RetriesExceeded<V>> for Signal<V> {
    fn from(signal: RetriesExceeded<V>) -> Self {
        Signal::RetriesExceeded(signal)
    }
}

/// Why a unit of work did not return a value.
///
/// Every signal type and [`SignalError`] convert into an `Interrupt`, so work
/// can use `?` on them directly. Unrelated errors go in [`Interrupt::Error`]
/// and pass through the driver untouched.
///
/// # Examples
///
/// ```
/// use manifail_core::{Abort, Interrupt, Reset, Signal};
///
/// fn check(load: u32) -> Result<u32, Interrupt<u32, std::io::Error>> {
///     if load > 90 {
///         return Err(Abort::with_value(load).into());
///     }
///     if load > 50 {
///         return Err(Reset::<u32>::from_millis(&[10, 20])?.into());
///     }
///     Ok(load)
/// }
///
/// assert!(matches!(check(95), Err(Interrupt::Signal(Signal::Abort(_)))));
/// assert!(matches!(check(60), Err(Interrupt::Signal(Signal::Reset(_)))));
/// assert_eq!(check(10).ok(), Some(10));
/// ```
#[derive(Debug)]
pub enum Interrupt<V, E> {
    /// A retry signal.
    Signal(Signal<V>),
    /// A signal that failed validation while being built.
    Invalid(SignalError),
    /// An error outside the retry protocol.
    Error(E),
}

impl<V, E> Interrupt<V, E> {
    /// Wraps an unrelated error.
    pub fn error(error: E) -> Self {
        Interrupt::Error(error)
    }
}

impl<V, E> From<Signal<V>> for Interrupt<V, E> {
    fn from(signal: Signal<V>) -> Self {
        Interrupt::Signal(signal)
    }
}

impl<V, E> From<SignalError> for Interrupt<V, E> {
    fn from(error: SignalError) -> Self {
        Interrupt::Invalid(error)
    }
}

impl<V, E> From<Abort<V>> for Interrupt<V, E> {
    fn from(signal: Abort<V>) -> Self {
        Interrupt::Signal(signal.into())
    }
}

impl<V, E> From<Reset<V>> for Interrupt<V, E> {
    fn from(signal: Reset<V>) -> Self {
        Interrupt::Signal(signal.into())
    }
}

impl<V, E> From<Retried<V>> for Interrupt<V, E> {
    fn from(signal: Retried<V>) -> Self {
        Interrupt::Signal(signal.into())
    }
}

impl<V, E> From<RetriesExceeded<V>> for Interrupt<V, E> {
    fn from(signal: RetriesExceeded<V>) -> Self {
        Interrupt::Signal(signal.into())
    }
}
