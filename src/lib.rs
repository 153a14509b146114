pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use app::runner::run_wait;
pub use core::{AsyncWait, PolicyError, Truthy, Wait, WaitError, WaitPolicy};
pub use domain::model::{ProbeOutcome, WaitReport};
pub use domain::ports::Probe;
pub use utils::error::{Result, WaiterError};
