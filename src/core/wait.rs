use crate::core::policy::{PolicyError, WaitPolicy};
use crate::core::schedule::Schedule;
use crate::core::truthy::Truthy;
use std::convert::Infallible;
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WaitError<E> {
    #[error(
        "waiter timed out after {calls} action calls (last result: {})",
        .last_result.as_deref().unwrap_or("none")
    )]
    Timeout {
        calls: u32,
        elapsed: Duration,
        last_result: Option<String>,
    },

    #[error("action failed: {0}")]
    Action(#[source] E),
}

impl<E> WaitError<E> {
    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitError::Timeout { .. })
    }

    pub fn into_action_error(self) -> Option<E> {
        match self {
            WaitError::Action(e) => Some(e),
            WaitError::Timeout { .. } => None,
        }
    }
}

pub(crate) type ErrorFilter<'a, E> = Box<dyn Fn(&E) -> bool + Send + Sync + 'a>;

type Action<'a, T, E> = Box<dyn FnMut() -> Result<T, E> + 'a>;

/// Blocking waiter: calls an action until its result is accepted.
///
/// The poll is bounded by the policy's timeout and/or max attempts. The interval is
/// slept before every call, including the first one. If less time remains until the
/// timeout than the interval, only the remaining time is slept before a last call.
///
/// ```
/// use air_waiter::{Wait, WaitPolicy};
/// use std::time::Duration;
///
/// let mut countdown = 3;
/// let policy = WaitPolicy::with_timeout(Duration::from_secs(1)).interval(Duration::ZERO);
/// let mut waiter = Wait::new(policy, || {
///     countdown -= 1;
///     countdown
/// })
/// .unwrap();
///
/// assert_eq!(waiter.until_equal_to(&0).unwrap(), 0);
/// ```
pub struct Wait<'a, T, E = Infallible> {
    action: Action<'a, T, E>,
    policy: WaitPolicy,
    ignore: Option<ErrorFilter<'a, E>>,
    calls: u32,
    results: Vec<T>,
    ignored_errors: u32,
}

impl<'a, T: 'a> Wait<'a, T, Infallible> {
    /// Waiter over an action that cannot fail. Arguments are captured by the closure.
    pub fn new<F>(policy: WaitPolicy, mut action: F) -> Result<Self, PolicyError>
    where
        F: FnMut() -> T + 'a,
    {
        Self::fallible(policy, move || Ok(action()))
    }
}

impl<'a, T, E> Wait<'a, T, E> {
    /// Waiter over an action returning `Result`. Errors abort the poll unless
    /// [`ignore_errors`](Self::ignore_errors) accepts them.
    pub fn fallible<F>(policy: WaitPolicy, action: F) -> Result<Self, PolicyError>
    where
        F: FnMut() -> Result<T, E> + 'a,
    {
        policy.validate()?;

        Ok(Self {
            action: Box::new(action),
            policy,
            ignore: None,
            calls: 0,
            results: Vec::new(),
            ignored_errors: 0,
        })
    }

    /// Swallow action errors for which `filter` returns true and keep polling.
    pub fn ignore_errors<P>(mut self, filter: P) -> Self
    where
        P: Fn(&E) -> bool + Send + Sync + 'a,
    {
        self.ignore = Some(Box::new(filter));
        self
    }

    pub fn ignore_all_errors(self) -> Self {
        self.ignore_errors(|_| true)
    }

    pub fn policy(&self) -> &WaitPolicy {
        &self.policy
    }

    /// Action calls made by the last poll.
    pub fn calls(&self) -> u32 {
        self.calls
    }

    /// Results of the last poll that were rejected, in call order.
    ///
    /// The accepted result is not recorded here; it is the return value of the
    /// `until*` call.
    pub fn results(&self) -> &[T] {
        &self.results
    }

    pub fn ignored_errors(&self) -> u32 {
        self.ignored_errors
    }

    fn poll<U, S>(&mut self, mut select: S) -> Result<U, WaitError<E>>
    where
        S: FnMut(T) -> Result<U, T>,
        T: fmt::Debug,
    {
        self.calls = 0;
        self.results.clear();
        self.ignored_errors = 0;

        let mut schedule = Schedule::start(self.policy, Instant::now());

        while let Some(delay) = schedule.next_delay(Instant::now()) {
            if !delay.is_zero() {
                std::thread::sleep(delay);
            }
            self.calls = schedule.record_call();

            match (self.action)() {
                Ok(value) => match select(value) {
                    Ok(accepted) => {
                        tracing::debug!(calls = self.calls, "Waiter condition met");
                        return Ok(accepted);
                    }
                    Err(rejected) => self.results.push(rejected),
                },
                Err(err) if self.ignore.as_ref().is_some_and(|ignore| ignore(&err)) => {
                    self.ignored_errors += 1;
                    tracing::trace!(calls = self.calls, "Ignoring action error");
                }
                Err(err) => return Err(WaitError::Action(err)),
            }
        }

        tracing::debug!(
            calls = self.calls,
            ignored_errors = self.ignored_errors,
            "Waiter gave up"
        );

        Err(WaitError::Timeout {
            calls: self.calls,
            elapsed: schedule.elapsed(Instant::now()),
            last_result: self.results.last().map(|r| format!("{:?}", r)),
        })
    }

    /// Poll until `predicate` accepts a result, and return that result.
    pub fn until_matches<P>(&mut self, mut predicate: P) -> Result<T, WaitError<E>>
    where
        P: FnMut(&T) -> bool,
        T: fmt::Debug,
    {
        self.poll(|value| if predicate(&value) { Ok(value) } else { Err(value) })
    }

    pub fn until(&mut self) -> Result<T, WaitError<E>>
    where
        T: Truthy + fmt::Debug,
    {
        self.until_matches(Truthy::is_truthy)
    }

    pub fn until_not(&mut self) -> Result<T, WaitError<E>>
    where
        T: Truthy + fmt::Debug,
    {
        self.until_matches(|value| !value.is_truthy())
    }

    pub fn until_equal_to(&mut self, expected: &T) -> Result<T, WaitError<E>>
    where
        T: PartialEq + fmt::Debug,
    {
        self.until_matches(|value| value == expected)
    }

    pub fn until_not_equal_to(&mut self, unexpected: &T) -> Result<T, WaitError<E>>
    where
        T: PartialEq + fmt::Debug,
    {
        self.until_matches(|value| value != unexpected)
    }
}

impl<E> Wait<'_, bool, E> {
    pub fn until_is_true(&mut self) -> Result<(), WaitError<E>> {
        self.until_matches(|value| *value).map(drop)
    }

    pub fn until_is_false(&mut self) -> Result<(), WaitError<E>> {
        self.until_matches(|value| !*value).map(drop)
    }
}

impl<U: fmt::Debug, E> Wait<'_, Option<U>, E> {
    pub fn until_is_none(&mut self) -> Result<(), WaitError<E>> {
        self.until_matches(Option::is_none).map(drop)
    }

    /// Poll until the action returns `Some`, and return the inner value.
    pub fn until_is_some(&mut self) -> Result<U, WaitError<E>> {
        self.poll(|value| value.ok_or(None))
    }
}

impl<T, E> fmt::Debug for Wait<'_, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wait")
            .field("policy", &self.policy)
            .field("calls", &self.calls)
            .field("ignored_errors", &self.ignored_errors)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn quick(timeout_ms: u64) -> WaitPolicy {
        WaitPolicy::with_timeout(Duration::from_millis(timeout_ms)).interval(Duration::ZERO)
    }

    #[test]
    fn test_unlimited_waiter_rejected() {
        let policy = WaitPolicy::default().interval(Duration::ZERO);
        let result = Wait::new(policy, || true);
        assert!(matches!(result, Err(PolicyError::UnlimitedWaiter)));
    }

    #[test]
    fn test_unused_max_interval_rejected() {
        let policy = WaitPolicy::with_timeout(Duration::from_millis(10))
            .max_interval(Duration::from_millis(10));
        let result = Wait::new(policy, || false);
        assert!(matches!(result, Err(PolicyError::UnusedMaxInterval)));
    }

    #[test]
    fn test_waiter_is_reusable() {
        let values = [0, 1, 0, 5];
        let index = Cell::new(0);
        let mut waiter = Wait::new(quick(1000), || {
            let value = values[index.get() % values.len()];
            index.set(index.get() + 1);
            value
        })
        .unwrap();

        assert_eq!(waiter.until().unwrap(), 1);
        assert_eq!(waiter.calls(), 2);
        assert_eq!(waiter.results(), &[0]);

        assert_eq!(waiter.until_equal_to(&5).unwrap(), 5);
        assert_eq!(waiter.calls(), 2);
        assert_eq!(waiter.results(), &[0]);
    }

    #[test]
    fn test_timeout_error_reports_last_result() {
        let policy = WaitPolicy::with_max_attempts(2).interval(Duration::ZERO);
        let mut waiter = Wait::new(policy, || 7u8).unwrap();

        let err = waiter.until_equal_to(&8).unwrap_err();
        match &err {
            WaitError::Timeout {
                calls, last_result, ..
            } => {
                assert_eq!(*calls, 2);
                assert_eq!(last_result.as_deref(), Some("7"));
            }
            other => panic!("expected Timeout, got {other:?}"),
        }
        assert_eq!(
            err.to_string(),
            "waiter timed out after 2 action calls (last result: 7)"
        );
    }

    #[test]
    fn test_timeout_without_results() {
        let policy = WaitPolicy::with_max_attempts(1).interval(Duration::ZERO);
        let mut waiter =
            Wait::<u8, std::io::Error>::fallible(policy, || Err(std::io::Error::other("down")))
                .unwrap()
                .ignore_all_errors();

        let err = waiter.until().unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(waiter.ignored_errors(), 1);
        assert_eq!(
            err.to_string(),
            "waiter timed out after 1 action calls (last result: none)"
        );
    }

    #[test]
    fn test_into_action_error() {
        let policy = WaitPolicy::with_max_attempts(3).interval(Duration::ZERO);
        let mut waiter = Wait::fallible(policy, || Err::<bool, _>("refused")).unwrap();

        let err = waiter.until().unwrap_err();
        assert!(!err.is_timeout());
        assert_eq!(err.into_action_error(), Some("refused"));

        let mut waiter = Wait::new(policy, || false).unwrap();
        assert!(waiter.until().unwrap_err().into_action_error().is_none());
    }

    #[test]
    fn test_policy_and_debug() {
        let policy = WaitPolicy::with_max_attempts(1).interval(Duration::ZERO);
        let mut waiter = Wait::new(policy, || true).unwrap();
        waiter.until().unwrap();

        assert_eq!(waiter.policy(), &policy);
        let debug = format!("{:?}", waiter);
        assert!(debug.starts_with("Wait {"));
        assert!(debug.contains("calls: 1"));
    }

    #[test]
    fn test_until_is_some_unwraps() {
        let calls = Cell::new(0);
        let mut waiter = Wait::new(quick(1000), || {
            calls.set(calls.get() + 1);
            (calls.get() == 3).then_some("ready")
        })
        .unwrap();

        assert_eq!(waiter.until_is_some().unwrap(), "ready");
        assert_eq!(waiter.results(), &[None, None]);
    }
}
