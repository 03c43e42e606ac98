//! Immutable delay schedules.

use crate::error::SignalError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// An ordered, immutable sequence of retry delays.
///
/// Schedules are consumed head-first: [`split_first`](Self::split_first)
/// returns the next delay and the remaining tail. The tail shares storage
/// with the original, so consuming one schedule never changes another
/// handle to the same delays.
///
/// # Examples
///
/// ```
/// use manifail_core::DelaySchedule;
/// use std::time::Duration;
///
/// let schedule = DelaySchedule::from_millis(&[10, 20])?;
/// let (head, tail) = schedule.split_first().unwrap();
///
/// assert_eq!(head, Duration::from_millis(10));
/// assert_eq!(tail.as_slice(), &[Duration::from_millis(20)]);
/// // The original is untouched.
/// assert_eq!(schedule.len(), 2);
/// # Ok::<(), manifail_core::SignalError>(())
/// ```
#[derive(Clone)]
pub struct DelaySchedule {
    delays: Arc<[Duration]>,
    start: usize,
}

impl DelaySchedule {
    /// Creates a schedule from the given delays.
    pub fn new(delays: impl IntoIterator<Item = Duration>) -> Self {
        Self {
            delays: delays.into_iter().collect(),
            start: 0,
        }
    }

    /// Creates an empty schedule: no retries remain.
    pub fn empty() -> Self {
        Self::new(std::iter::empty())
    }

    /// Creates a schedule from signed millisecond values.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError::InvalidDelay`] for the first negative entry.
    pub fn from_millis(millis: &[i64]) -> Result<Self, SignalError> {
        let delays = millis
            .iter()
            .enumerate()
            .map(|(index, &ms)| {
                u64::try_from(ms)
                    .map(Duration::from_millis)
                    .map_err(|_| SignalError::InvalidDelay {
                        index,
                        reason: "negative",
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(delays))
    }

    /// Creates a schedule from fractional seconds.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError::InvalidDelay`] for the first negative,
    /// non-finite or overflowing entry.
    pub fn from_secs_f64(secs: &[f64]) -> Result<Self, SignalError> {
        let delays = secs
            .iter()
            .enumerate()
            .map(|(index, &s)| {
                if s.is_nan() || s.is_infinite() {
                    return Err(SignalError::InvalidDelay {
                        index,
                        reason: "not finite",
                    });
                }
                if s < 0.0 {
                    return Err(SignalError::InvalidDelay {
                        index,
                        reason: "negative",
                    });
                }
                Duration::try_from_secs_f64(s).map_err(|_| SignalError::InvalidDelay {
                    index,
                    reason: "out of range",
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(delays))
    }

    /// Creates a schedule of `count` identical delays.
    ///
    /// ```
    /// use manifail_core::DelaySchedule;
    /// use std::time::Duration;
    ///
    /// let schedule = DelaySchedule::fixed(3, Duration::from_secs(1));
    /// assert_eq!(schedule.len(), 3);
    /// assert_eq!(schedule.total(), Duration::from_secs(3));
    /// ```
    pub fn fixed(count: usize, delay: Duration) -> Self {
        Self::new(std::iter::repeat(delay).take(count))
    }

    /// Creates an exponential backoff schedule of `count` delays.
    ///
    /// Each delay is the previous one times `multiplier`, capped at `max`.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError::InvalidBackoff`] if:
    /// - `multiplier` is 0
    /// - `multiplier` is greater than 10
    /// - `max` is less than `initial`
    ///
    /// # Examples
    ///
    /// ```
    /// use manifail_core::DelaySchedule;
    /// use std::time::Duration;
    ///
    /// let schedule = DelaySchedule::exponential(
    ///     4,
    ///     Duration::from_millis(100),
    ///     Duration::from_millis(500),
    ///     2,
    /// )?;
    ///
    /// // 100ms, 200ms, 400ms, then capped at 500ms
    /// assert_eq!(schedule.as_slice()[3], Duration::from_millis(500));
    /// # Ok::<(), manifail_core::SignalError>(())
    /// ```
    pub fn exponential(
        count: usize,
        initial: Duration,
        max: Duration,
        multiplier: u32,
    ) -> Result<Self, SignalError> {
        if multiplier == 0 {
            return Err(SignalError::InvalidBackoff(
                "multiplier must be greater than 0",
            ));
        }
        if multiplier > 10 {
            return Err(SignalError::InvalidBackoff(
                "multiplier must be 10 or less to avoid overflow",
            ));
        }
        if max < initial {
            return Err(SignalError::InvalidBackoff("max must be >= initial"));
        }
        let delays = std::iter::successors(Some(initial), |prev| {
            Some(prev.saturating_mul(multiplier).min(max))
        })
        .take(count);
        Ok(Self::new(delays))
    }

    /// Returns the remaining delays.
    pub fn as_slice(&self) -> &[Duration] {
        &self.delays[self.start..]
    }

    /// Returns the number of remaining delays.
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Returns `true` if no delays remain.
    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    /// Returns the next delay without consuming it.
    pub fn first(&self) -> Option<Duration> {
        self.as_slice().first().copied()
    }

    /// Splits off the next delay, returning it with the remaining tail.
    ///
    /// Returns `None` when the schedule is exhausted.
    pub fn split_first(&self) -> Option<(Duration, DelaySchedule)> {
        let head = self.first()?;
        let tail = Self {
            delays: Arc::clone(&self.delays),
            start: self.start + 1,
        };
        Some((head, tail))
    }

    /// Returns the sum of all remaining delays.
    pub fn total(&self) -> Duration {
        self.iter()
            .fold(Duration::ZERO, |acc, d| acc.saturating_add(d))
    }

    /// Iterates over the remaining delays.
    pub fn iter(&self) -> impl Iterator<Item = Duration> + '_ {
        self.as_slice().iter().copied()
    }
}

impl Default for DelaySchedule {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for DelaySchedule {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for DelaySchedule {}

impl fmt::Debug for DelaySchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl From<Vec<Duration>> for DelaySchedule {
    fn from(delays: Vec<Duration>) -> Self {
        Self {
            delays: delays.into(),
            start: 0,
        }
    }
}

impl FromIterator<Duration> for DelaySchedule {
    fn from_iter<I: IntoIterator<Item = Duration>>(iter: I) -> Self {
        Self::new(iter)
    }
}
