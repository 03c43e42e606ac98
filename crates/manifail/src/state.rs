//! Driver context object and its transitions.
//!
//! Pure bookkeeping: nothing here waits or logs. The async loop in
//! [`driver`](crate::driver) asks the state what to do next and performs
//! the wait itself.

use manifail_core::{DelaySchedule, Detail, Reset, RetriesExceeded, Retried};
use std::mem;
use std::time::Duration;

/// What the driver does after a reset.
#[derive(Debug, PartialEq)]
pub(crate) enum Transition<V> {
    /// Wait for the delay, then run the work again.
    Wait(Duration),
    /// No retries remain.
    Exhausted(RetriesExceeded<V>),
}

/// Per-run retry accounting, owned by a single driver invocation.
#[derive(Debug)]
pub(crate) struct RetryState<V> {
    attempt: u32,
    remaining: DelaySchedule,
    last_observed: Detail<V>,
    max_retries: Option<u32>,
    budget: Option<u32>,
}

impl<V> RetryState<V> {
    pub(crate) fn new(schedule: DelaySchedule, max_retries: Option<u32>) -> Self {
        Self {
            attempt: 0,
            remaining: schedule,
            last_observed: Detail::Empty,
            max_retries,
            budget: None,
        }
    }

    pub(crate) fn attempt(&self) -> u32 {
        self.attempt
    }

    pub(crate) fn remaining(&self) -> &DelaySchedule {
        &self.remaining
    }

    #[cfg(test)]
    pub(crate) fn last_observed(&self) -> &Detail<V> {
        &self.last_observed
    }

    /// Records a payload or cause. Empty details never clear what was seen.
    pub(crate) fn observe(&mut self, detail: Detail<V>) {
        if !detail.is_empty() {
            self.last_observed = detail;
        }
    }

    /// Applies a reset raised by the work.
    ///
    /// An explicit schedule replaces the remaining one; an inherited reset
    /// keeps it. The head delay is popped, or the run is exhausted when the
    /// schedule is empty or the retry ceiling is reached.
    ///
    /// The schedule in effect at the first reset fixes the retry budget.
    /// Later schedules may shorten it but never extend it.
    pub(crate) fn on_reset(&mut self, reset: Reset<V>) -> Transition<V> {
        let (delays, detail) = reset.into_parts();
        self.observe(detail);

        let schedule = delays.unwrap_or_else(|| self.remaining.clone());
        let attempt = self.attempt;
        let budget = *self.budget.get_or_insert_with(|| {
            let len = u32::try_from(schedule.len()).unwrap_or(u32::MAX);
            attempt.saturating_add(len)
        });
        let capped =
            self.attempt >= budget || self.max_retries.is_some_and(|max| self.attempt >= max);

        match schedule.split_first() {
            Some((delay, tail)) if !capped => {
                self.remaining = tail;
                Transition::Wait(delay)
            }
            _ => {
                self.remaining = DelaySchedule::empty();
                Transition::Exhausted(RetriesExceeded::from_detail(
                    self.attempt,
                    mem::take(&mut self.last_observed),
                ))
            }
        }
    }

    /// Counts a retry after its delay elapsed and hands the `Retried` record
    /// to `emit`.
    pub(crate) fn advance<F>(&mut self, emit: F)
    where
        F: FnOnce(u32, &Retried<V>),
    {
        self.attempt = self.attempt.saturating_add(1);
        let retried = Retried::from_detail(mem::take(&mut self.last_observed));
        emit(self.attempt, &retried);
        self.last_observed = retried.into_detail();
    }
}
