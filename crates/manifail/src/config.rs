//! Driver configuration.

use manifail_core::DelaySchedule;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Caller-supplied driver settings.
///
/// Deserializes from any serde format; both `snake_case` and `camelCase`
/// keys are accepted.
///
/// # Examples
///
/// ```
/// use manifail::RetryConfig;
/// use std::time::Duration;
///
/// let config = RetryConfig::new([100, 200]).with_max_retries(1);
/// assert_eq!(config.schedule().first(), Some(Duration::from_millis(100)));
/// assert_eq!(config.max_retries, Some(1));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Default schedule in milliseconds, used when work raises an
    /// inheriting reset.
    #[serde(alias = "delaysMs")]
    pub delays_ms: Vec<u64>,
    /// Hard cap on retries, even if the schedule has more entries.
    #[serde(alias = "maxRetries", skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
}

impl RetryConfig {
    /// Creates a config with the given default delays in milliseconds.
    pub fn new(delays_ms: impl IntoIterator<Item = u64>) -> Self {
        Self {
            delays_ms: delays_ms.into_iter().collect(),
            max_retries: None,
        }
    }

    /// Sets the retry ceiling.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Returns the default delay schedule.
    pub fn schedule(&self) -> DelaySchedule {
        self.delays_ms
            .iter()
            .map(|&ms| Duration::from_millis(ms))
            .collect()
    }
}
