use crate::core::policy::{PolicyError, WaitPolicy};
use crate::core::schedule::Schedule;
use crate::core::truthy::Truthy;
use crate::core::wait::{ErrorFilter, WaitError};
use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use tokio::time::Instant;

type ActionFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;
type Action<'a, T, E> = Box<dyn FnMut() -> ActionFuture<'a, T, E> + Send + 'a>;

/// Async counterpart of [`Wait`](crate::Wait), sleeping on the tokio timer.
pub struct AsyncWait<'a, T, E = Infallible> {
    action: Action<'a, T, E>,
    policy: WaitPolicy,
    ignore: Option<ErrorFilter<'a, E>>,
    calls: u32,
    results: Vec<T>,
    ignored_errors: u32,
}

impl<'a, T: 'a> AsyncWait<'a, T, Infallible> {
    pub fn new<F, Fut>(policy: WaitPolicy, mut action: F) -> Result<Self, PolicyError>
    where
        F: FnMut() -> Fut + Send + 'a,
        Fut: Future<Output = T> + Send + 'a,
    {
        Self::fallible(policy, move || {
            let fut = action();
            async move { Ok(fut.await) }
        })
    }
}

impl<'a, T, E> AsyncWait<'a, T, E> {
    pub fn fallible<F, Fut>(policy: WaitPolicy, mut action: F) -> Result<Self, PolicyError>
    where
        F: FnMut() -> Fut + Send + 'a,
        Fut: Future<Output = Result<T, E>> + Send + 'a,
        T: 'a,
        E: 'a,
    {
        policy.validate()?;

        Ok(Self {
            action: Box::new(move || Box::pin(action()) as ActionFuture<'a, T, E>),
            policy,
            ignore: None,
            calls: 0,
            results: Vec::new(),
            ignored_errors: 0,
        })
    }

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

    pub fn calls(&self) -> u32 {
        self.calls
    }

    /// Rejected results of the last poll, in call order. The accepted one is
    /// returned by the `until*` call instead.
    pub fn results(&self) -> &[T] {
        &self.results
    }

    pub fn ignored_errors(&self) -> u32 {
        self.ignored_errors
    }

    async fn poll<U, S>(&mut self, mut select: S) -> Result<U, WaitError<E>>
    where
        S: FnMut(T) -> Result<U, T>,
        T: fmt::Debug,
    {
        self.calls = 0;
        self.results.clear();
        self.ignored_errors = 0;

        let mut schedule = Schedule::start(self.policy, Instant::now().into_std());

        while let Some(delay) = schedule.next_delay(Instant::now().into_std()) {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            self.calls = schedule.record_call();

            match (self.action)().await {
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
            elapsed: schedule.elapsed(Instant::now().into_std()),
            last_result: self.results.last().map(|r| format!("{:?}", r)),
        })
    }

    pub async fn until_matches<P>(&mut self, mut predicate: P) -> Result<T, WaitError<E>>
    where
        P: FnMut(&T) -> bool,
        T: fmt::Debug,
    {
        self.poll(|value| if predicate(&value) { Ok(value) } else { Err(value) })
            .await
    }

    pub async fn until(&mut self) -> Result<T, WaitError<E>>
    where
        T: Truthy + fmt::Debug,
    {
        self.until_matches(Truthy::is_truthy).await
    }

    pub async fn until_not(&mut self) -> Result<T, WaitError<E>>
    where
        T: Truthy + fmt::Debug,
    {
        self.until_matches(|value| !value.is_truthy()).await
    }

    pub async fn until_equal_to(&mut self, expected: &T) -> Result<T, WaitError<E>>
    where
        T: PartialEq + fmt::Debug,
    {
        self.until_matches(|value| value == expected).await
    }

    pub async fn until_not_equal_to(&mut self, unexpected: &T) -> Result<T, WaitError<E>>
    where
        T: PartialEq + fmt::Debug,
    {
        self.until_matches(|value| value != unexpected).await
    }
}

impl<E> AsyncWait<'_, bool, E> {
    pub async fn until_is_true(&mut self) -> Result<(), WaitError<E>> {
        self.until_matches(|value| *value).await.map(drop)
    }

    pub async fn until_is_false(&mut self) -> Result<(), WaitError<E>> {
        self.until_matches(|value| !*value).await.map(drop)
    }
}

impl<U: fmt::Debug, E> AsyncWait<'_, Option<U>, E> {
    pub async fn until_is_none(&mut self) -> Result<(), WaitError<E>> {
        self.until_matches(Option::is_none).await.map(drop)
    }

    pub async fn until_is_some(&mut self) -> Result<U, WaitError<E>> {
        self.poll(|value| value.ok_or(None)).await
    }
}

impl<T, E> fmt::Debug for AsyncWait<'_, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncWait")
            .field("policy", &self.policy)
            .field("calls", &self.calls)
            .field("ignored_errors", &self.ignored_errors)
            .finish_non_exhaustive()
    }
}
