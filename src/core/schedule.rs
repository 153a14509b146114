use crate::core::policy::WaitPolicy;
use std::time::{Duration, Instant};

/// Bookkeeping of one poll: when it started, when it must stop, how many calls it made.
///
/// Time is passed in by the caller so the blocking and the tokio waiters can share it.
#[derive(Debug, Clone)]
pub(crate) struct Schedule {
    policy: WaitPolicy,
    started: Instant,
    deadline: Option<Instant>,
    calls: u32,
}

impl Schedule {
    pub(crate) fn start(policy: WaitPolicy, now: Instant) -> Self {
        let deadline = if policy.timeout.is_zero() {
            None
        } else {
            now.checked_add(policy.timeout)
        };

        Self {
            policy,
            started: now,
            deadline,
            calls: 0,
        }
    }

    /// Delay to sleep before the next call, or `None` once a limit is reached.
    ///
    /// Never sleeps past the deadline: when less time remains than the interval,
    /// only the remaining time is slept and one last call is made.
    pub(crate) fn next_delay(&self, now: Instant) -> Option<Duration> {
        if let Some(deadline) = self.deadline {
            if now >= deadline {
                return None;
            }
        }

        if self.policy.max_attempts != 0 && self.calls >= self.policy.max_attempts {
            return None;
        }

        let delay = self.policy.delay_for(self.calls);
        Some(match self.deadline {
            Some(deadline) => delay.min(deadline.saturating_duration_since(now)),
            None => delay,
        })
    }

    pub(crate) fn record_call(&mut self) -> u32 {
        self.calls = self.calls.saturating_add(1);
        self.calls
    }

    pub(crate) fn calls(&self) -> u32 {
        self.calls
    }

    pub(crate) fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started)
    }
}
