//! Driver error types.

use thiserror::Error;

/// Cause attached to an abort when a retry wait is cancelled.
///
/// # Examples
///
/// ```
/// use manifail::Cancelled;
///
/// let cancelled = Cancelled { retries: 2 };
/// assert_eq!(cancelled.to_string(), "Retry wait cancelled after 2 retries");
/// ```
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Retry wait cancelled after {retries} retries")]
pub struct Cancelled {
    /// Retries completed before the cancellation.
    pub retries: u32,
}
