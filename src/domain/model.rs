use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a probe observed in a single call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    pub ready: bool,
    pub detail: String,
}

impl ProbeOutcome {
    pub fn ready(detail: impl Into<String>) -> Self {
        Self {
            ready: true,
            detail: detail.into(),
        }
    }

    pub fn pending(detail: impl Into<String>) -> Self {
        Self {
            ready: false,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitReport {
    pub probe: String,
    pub ready: bool,
    pub attempts: u32,
    pub ignored_errors: u32,
    pub elapsed_ms: u64,
    pub started_at: DateTime<Utc>,
    pub detail: String,
}
