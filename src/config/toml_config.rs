use crate::core::WaitPolicy;
use crate::utils::error::{Result, WaiterError};
use crate::utils::validation::{
    seconds_to_duration, validate_non_empty_string, validate_range, validate_socket_address,
    validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 沒有設定 timeout 也沒有設定次數時的預設等待秒數
pub const DEFAULT_TIMEOUT_SECONDS: f64 = 30.0;
pub const DEFAULT_INTERVAL_SECONDS: f64 = 1.0;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WaiterConfig {
    #[serde(default)]
    pub wait: WaitSection,
    pub probe: Option<ProbeConfig>,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaitSection {
    pub timeout_seconds: Option<f64>,
    pub max_attempts: Option<u32>,
    pub interval_seconds: Option<f64>,
    pub exponential: Option<bool>,
    pub max_interval_seconds: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputSection {
    pub json: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProbeConfig {
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
        expect_exit: Option<i32>,
        expect_output: Option<String>,
        timeout_seconds: Option<f64>,
    },
    Http {
        url: String,
        expect_status: Option<u16>,
        expect_body: Option<String>,
        request_timeout_seconds: Option<f64>,
    },
    Tcp {
        address: String,
        connect_timeout_seconds: Option<f64>,
    },
}

impl WaitSection {
    /// 轉成 `WaitPolicy`，並檢查 timeout / 次數的組合
    pub fn to_policy(&self) -> Result<WaitPolicy> {
        let timeout_seconds = match (self.timeout_seconds, self.max_attempts) {
            (None, None) => DEFAULT_TIMEOUT_SECONDS,
            (timeout, _) => timeout.unwrap_or(0.0),
        };

        let policy = WaitPolicy {
            timeout: seconds_to_duration("wait.timeout_seconds", timeout_seconds)?,
            max_attempts: self.max_attempts.unwrap_or(0),
            interval: seconds_to_duration(
                "wait.interval_seconds",
                self.interval_seconds.unwrap_or(DEFAULT_INTERVAL_SECONDS),
            )?,
            exponential: self.exponential.unwrap_or(false),
            max_interval: seconds_to_duration(
                "wait.max_interval_seconds",
                self.max_interval_seconds.unwrap_or(0.0),
            )?,
        };

        policy.validate()?;
        Ok(policy)
    }
}

impl ProbeConfig {
    fn validate_fields(&self) -> Result<()> {
        match self {
            ProbeConfig::Command { program, .. } => {
                validate_non_empty_string("probe.program", program)
            }
            ProbeConfig::Http {
                url, expect_status, ..
            } => {
                validate_url("probe.url", url)?;
                if let Some(status) = expect_status {
                    validate_range("probe.expect_status", *status, 100, 599)?;
                }
                Ok(())
            }
            ProbeConfig::Tcp { address, .. } => validate_socket_address("probe.address", address),
        }
    }
}

impl WaiterConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(WaiterError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| WaiterError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SERVICE_URL})，找不到的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}")?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        self.wait.to_policy()?;

        if let Some(probe) = &self.probe {
            probe.validate_fields()?;
        }

        Ok(())
    }

    pub fn json_output(&self) -> bool {
        self.output.json.unwrap_or(false)
    }
}

impl Validate for WaiterConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
