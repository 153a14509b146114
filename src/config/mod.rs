#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::{CliConfig, ProbeCommand};
pub use toml_config::{ProbeConfig, WaiterConfig};

use crate::core::WaitPolicy;
use crate::utils::error::Result;
use crate::utils::validation::validate_required_field;

/// Fully resolved settings of one run: file values with command line overrides applied.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub policy: WaitPolicy,
    pub probe: ProbeConfig,
    pub json_output: bool,
}

impl RunConfig {
    pub fn from_waiter_config(config: &WaiterConfig) -> Result<Self> {
        let probe = validate_required_field("probe", &config.probe)?.clone();

        Ok(Self {
            policy: config.wait.to_policy()?,
            probe,
            json_output: config.json_output(),
        })
    }
}
