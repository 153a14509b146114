use crate::domain::model::ProbeOutcome;
use crate::utils::error::Result;
use async_trait::async_trait;

/// A readiness check the waiter polls.
///
/// `check` returns `Ok` with `ready: false` when the target answered but is not
/// ready yet, and a transient error when it could not be reached at all.
#[async_trait]
pub trait Probe: Send + Sync {
    fn name(&self) -> String;
    async fn check(&self) -> Result<ProbeOutcome>;
}
