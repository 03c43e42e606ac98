//! Signal construction errors.

use thiserror::Error;

/// Broad category of a [`SignalError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A delay schedule contained a negative or non-finite entry.
    InvalidDelay,
    /// A retry count was negative.
    InvalidRetryCount,
    /// Any other malformed or misdirected signal.
    InvalidSignal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::InvalidDelay => write!(f, "invalid_delay"),
            ErrorKind::InvalidRetryCount => write!(f, "invalid_retry_count"),
            ErrorKind::InvalidSignal => write!(f, "invalid_signal"),
        }
    }
}

/// Errors raised while building a signal.
///
/// A signal that fails validation is never retried: the driver treats it as
/// fatal for the current attempt.
///
/// # Examples
///
/// ```
/// use manifail_core::{DelaySchedule, ErrorKind, SignalError};
///
/// let err = DelaySchedule::from_millis(&[10, -5]).unwrap_err();
/// assert_eq!(err, SignalError::InvalidDelay { index: 1, reason: "negative" });
/// assert_eq!(err.kind(), ErrorKind::InvalidDelay);
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SignalError {
    /// An entry of a delay schedule cannot be turned into a wait.
    #[error("Invalid delay at index {index}: {reason}")]
    InvalidDelay {
        /// Position of the offending entry.
        index: usize,
        /// Why the entry was rejected.
        reason: &'static str,
    },

    /// A retry count below zero.
    #[error("Invalid retry count: {0}")]
    InvalidRetryCount(i64),

    /// Backoff generator parameters that cannot produce a schedule.
    #[error("Invalid backoff: {0}")]
    InvalidBackoff(&'static str),

    /// The unit of work raised `Retried`, which only the driver may emit.
    #[error("Retried is emitted by the driver and cannot be raised by work")]
    MisdirectedRetried,

    /// A signal the driver refused to act on.
    #[error("Invalid signal: {source}")]
    InvalidSignal {
        /// The validation failure that made the signal unusable.
        #[source]
        source: Box<SignalError>,
    },
}

impl SignalError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SignalError::InvalidDelay { .. } => ErrorKind::InvalidDelay,
            SignalError::InvalidRetryCount(_) => ErrorKind::InvalidRetryCount,
            SignalError::InvalidBackoff(_)
            | SignalError::MisdirectedRetried
            | SignalError::InvalidSignal { .. } => ErrorKind::InvalidSignal,
        }
    }

    /// Wraps this error as a rejected signal, so its kind is always
    /// [`ErrorKind::InvalidSignal`]. Already rejected signals are returned
    /// as they are.
    pub fn into_invalid_signal(self) -> SignalError {
        match self {
            SignalError::InvalidSignal { .. } => self,
            other => SignalError::InvalidSignal {
                source: Box::new(other),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = SignalError::InvalidDelay {
            index: 2,
            reason: "negative",
        };
        assert_eq!(error.to_string(), "Invalid delay at index 2: negative");

        let error = SignalError::InvalidRetryCount(-1);
        assert_eq!(error.to_string(), "Invalid retry count: -1");
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(
            SignalError::InvalidRetryCount(-3).kind(),
            ErrorKind::InvalidRetryCount
        );
        assert_eq!(
            SignalError::InvalidBackoff("multiplier must be greater than 0").kind(),
            ErrorKind::InvalidSignal
        );
        assert_eq!(
            SignalError::MisdirectedRetried.kind(),
            ErrorKind::InvalidSignal
        );
    }

    #[test]
    fn test_into_invalid_signal_keeps_source() {
        let original = SignalError::InvalidDelay {
            index: 0,
            reason: "negative",
        };
        let rejected = original.clone().into_invalid_signal();

        assert_eq!(rejected.kind(), ErrorKind::InvalidSignal);
        assert_eq!(
            rejected.to_string(),
            "Invalid signal: Invalid delay at index 0: negative"
        );
        let source = std::error::Error::source(&rejected)
            .and_then(|e| e.downcast_ref::<SignalError>());
        assert_eq!(source, Some(&original));

        // Wrapping twice does not nest.
        assert_eq!(rejected.clone().into_invalid_signal(), rejected);
    }

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::InvalidDelay.to_string(), "invalid_delay");
        assert_eq!(ErrorKind::InvalidSignal.to_string(), "invalid_signal");
    }
}
