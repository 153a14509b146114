use crate::core::PolicyError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WaiterError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid regular expression: {0}")]
    RegexError(#[from] regex::Error),

    #[error("Invalid wait policy: {0}")]
    PolicyError(#[from] PolicyError),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Probe '{probe}' failed: {message}")]
    ProbeError { probe: String, message: String },

    #[error("Connection to {target} failed: {message}")]
    ConnectionError { target: String, message: String },

    #[error("Timed out waiting for {probe} after {attempts} attempts ({elapsed:?})")]
    TimeoutError {
        probe: String,
        attempts: u32,
        elapsed: Duration,
    },
}

impl WaiterError {
    /// 連線層級的錯誤視為「尚未就緒」，可以繼續輪詢
    pub fn is_transient(&self) -> bool {
        match self {
            WaiterError::ConnectionError { .. } => true,
            WaiterError::HttpError(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            _ => false,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            WaiterError::TimeoutError { .. } => 1,
            WaiterError::PolicyError(_)
            | WaiterError::ConfigValidationError { .. }
            | WaiterError::InvalidConfigValueError { .. }
            | WaiterError::MissingConfigError { .. }
            | WaiterError::RegexError(_) => 2,
            _ => 3,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            WaiterError::TimeoutError { probe, attempts, .. } => {
                format!("{} did not become ready after {} attempts", probe, attempts)
            }
            WaiterError::PolicyError(e) => format!("Wait policy is invalid: {}", e),
            _ => self.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            WaiterError::TimeoutError { .. } => {
                "Increase --timeout or --attempts, or check that the target is actually starting"
            }
            WaiterError::PolicyError(PolicyError::UnlimitedWaiter) => {
                "Set a non-zero --timeout or --attempts"
            }
            WaiterError::PolicyError(PolicyError::UnusedMaxInterval) => {
                "Pass --exponential together with --max-interval, or drop --max-interval"
            }
            WaiterError::ConfigValidationError { .. }
            | WaiterError::InvalidConfigValueError { .. }
            | WaiterError::MissingConfigError { .. } => {
                "Check the configuration file and command line flags"
            }
            WaiterError::RegexError(_) => "Fix the --expect-output / --expect-body pattern",
            WaiterError::HttpError(_) | WaiterError::ConnectionError { .. } => {
                "Check that the address is reachable from this host"
            }
            WaiterError::IoError(_) => "Check file paths and permissions",
            WaiterError::ProbeError { .. } => "Run the probe manually to inspect its output",
            WaiterError::SerializationError(_) => "Report this as a bug",
        }
    }
}

pub type Result<T> = std::result::Result<T, WaiterError>;
