use std::time::Duration;
use thiserror::Error;

/// Default polling interval between action calls.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyError {
    #[error("waiter would never stop: both timeout and max attempts are 0")]
    UnlimitedWaiter,

    #[error("max interval is only used by an exponential waiter")]
    UnusedMaxInterval,
}

/// Limits and pacing of a waiter.
///
/// A waiter stops on whichever limit is reached first. A zero `timeout` or a zero
/// `max_attempts` disables that limit, but not both at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Maximal time to wait. `Duration::ZERO` waits without a time limit.
    pub timeout: Duration,
    /// Maximal number of action calls. `0` calls without a count limit.
    pub max_attempts: u32,
    /// Delay slept before every action call.
    pub interval: Duration,
    /// Double the interval after every call.
    pub exponential: bool,
    /// Upper bound for the exponential interval. `Duration::ZERO` leaves it uncapped.
    pub max_interval: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::ZERO,
            max_attempts: 0,
            interval: DEFAULT_INTERVAL,
            exponential: false,
            max_interval: Duration::ZERO,
        }
    }
}

impl WaitPolicy {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }

    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn exponential(mut self, exponential: bool) -> Self {
        self.exponential = exponential;
        self
    }

    pub fn max_interval(mut self, max_interval: Duration) -> Self {
        self.max_interval = max_interval;
        self
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.timeout.is_zero() && self.max_attempts == 0 {
            return Err(PolicyError::UnlimitedWaiter);
        }
        if !self.max_interval.is_zero() && !self.exponential {
            return Err(PolicyError::UnusedMaxInterval);
        }
        Ok(())
    }

    /// Delay to sleep before the next call, given how many calls were already made.
    ///
    /// Exponential: `interval * 2^calls`, capped by `max_interval` when it is set.
    pub fn delay_for(&self, calls: u32) -> Duration {
        if !self.exponential || self.interval.is_zero() {
            return self.interval;
        }

        let grown = 1u128
            .checked_shl(calls)
            .and_then(|factor| self.interval.as_nanos().checked_mul(factor))
            .and_then(nanos_to_duration);

        match (grown, self.max_interval.is_zero()) {
            (Some(delay), true) => delay,
            (Some(delay), false) => delay.min(self.max_interval),
            (None, true) => Duration::MAX,
            (None, false) => self.max_interval,
        }
    }
}

/// `None` once the seconds no longer fit in a `Duration`.
fn nanos_to_duration(nanos: u128) -> Option<Duration> {
    let secs = u64::try_from(nanos / 1_000_000_000).ok()?;
    let subsec = (nanos % 1_000_000_000) as u32;
    Some(Duration::new(secs, subsec))
}
