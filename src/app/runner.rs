use crate::adapters::build_probe;
use crate::config::RunConfig;
use crate::core::{AsyncWait, WaitError, WaitPolicy};
use crate::domain::model::{ProbeOutcome, WaitReport};
use crate::domain::ports::Probe;
use crate::utils::error::{Result, WaiterError};
use chrono::Utc;
use std::time::Duration;
use tokio::time::Instant;

pub async fn run_wait(config: &RunConfig) -> Result<WaitReport> {
    let probe = build_probe(&config.probe)?;
    wait_for_probe(probe.as_ref(), config.policy).await
}

/// Poll `probe` until it reports ready.
///
/// Transient failures (connection refused, request timeouts) count as "not ready
/// yet"; any other probe error aborts the wait.
pub async fn wait_for_probe(probe: &dyn Probe, policy: WaitPolicy) -> Result<WaitReport> {
    let name = probe.name();
    let started_at = Utc::now();
    let clock = Instant::now();

    tracing::info!("⏳ Waiting for {} ({:?})", name, policy);

    let mut waiter = AsyncWait::fallible(policy, || probe.check())?.ignore_errors(|e: &WaiterError| {
        let transient = e.is_transient();
        if transient {
            tracing::debug!("Not reachable yet: {}", e);
        }
        transient
    });

    let result = waiter
        .until_matches(|outcome: &ProbeOutcome| {
            if !outcome.ready {
                tracing::debug!("Not ready yet: {}", outcome.detail);
            }
            outcome.ready
        })
        .await;

    match result {
        Ok(outcome) => {
            let elapsed = clock.elapsed();
            tracing::info!(
                "✅ {} is ready after {} attempts ({:?})",
                name,
                waiter.calls(),
                elapsed
            );

            Ok(WaitReport {
                probe: name,
                ready: true,
                attempts: waiter.calls(),
                ignored_errors: waiter.ignored_errors(),
                elapsed_ms: saturating_millis(elapsed),
                started_at,
                detail: outcome.detail,
            })
        }
        Err(WaitError::Timeout { calls, elapsed, .. }) => Err(WaiterError::TimeoutError {
            probe: name,
            attempts: calls,
            elapsed,
        }),
        Err(WaitError::Action(e)) => Err(e),
    }
}

fn saturating_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
