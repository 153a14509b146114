use crate::config::toml_config::{ProbeConfig, WaiterConfig};
use crate::config::RunConfig;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "air-waiter", version)]
#[command(about = "Wait until a command, HTTP endpoint or TCP port is ready")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Maximal time to wait in seconds, 0 for no time limit
    #[arg(short, long)]
    pub timeout: Option<f64>,

    /// Maximal number of probe calls, 0 for no count limit
    #[arg(short = 'n', long)]
    pub attempts: Option<u32>,

    /// Seconds to sleep before every probe call
    #[arg(short, long)]
    pub interval: Option<f64>,

    /// Double the interval after every call (`--exponential=false` turns it off)
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub exponential: Option<bool>,

    /// Upper bound in seconds for the exponential interval
    #[arg(long)]
    pub max_interval: Option<f64>,

    /// Print the result as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long)]
    pub log_json: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub probe: Option<ProbeCommand>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum ProbeCommand {
    /// Run a program until it exits with the expected code
    Cmd {
        #[arg(long, default_value_t = 0)]
        expect_exit: i32,

        /// Regular expression the program's stdout must match
        #[arg(long)]
        expect_output: Option<String>,

        /// Kill a single run after this many seconds
        #[arg(long)]
        command_timeout: Option<f64>,

        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
    /// GET a URL until it answers with the expected status
    Http {
        url: String,

        /// Exact status to wait for (any 2xx when omitted)
        #[arg(long)]
        status: Option<u16>,

        /// Regular expression the response body must match
        #[arg(long)]
        body: Option<String>,

        #[arg(long)]
        request_timeout: Option<f64>,
    },
    /// Connect to host:port until the connection is accepted
    Tcp {
        address: String,

        #[arg(long)]
        connect_timeout: Option<f64>,
    },
}

impl From<ProbeCommand> for ProbeConfig {
    fn from(command: ProbeCommand) -> Self {
        match command {
            ProbeCommand::Cmd {
                expect_exit,
                expect_output,
                command_timeout,
                command,
            } => {
                let mut parts = command.into_iter();
                ProbeConfig::Command {
                    program: parts.next().unwrap_or_default(),
                    args: parts.collect(),
                    expect_exit: Some(expect_exit),
                    expect_output,
                    timeout_seconds: command_timeout,
                }
            }
            ProbeCommand::Http {
                url,
                status,
                body,
                request_timeout,
            } => ProbeConfig::Http {
                url,
                expect_status: status,
                expect_body: body,
                request_timeout_seconds: request_timeout,
            },
            ProbeCommand::Tcp {
                address,
                connect_timeout,
            } => ProbeConfig::Tcp {
                address,
                connect_timeout_seconds: connect_timeout,
            },
        }
    }
}

impl CliConfig {
    /// 載入設定檔 (若有)，再套用命令列覆蓋
    pub fn resolve(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path.display());
                WaiterConfig::from_file(path)?
            }
            None => WaiterConfig::default(),
        };

        self.apply_overrides(&mut config);
        config.validate()?;

        RunConfig::from_waiter_config(&config)
    }

    pub fn apply_overrides(&self, config: &mut WaiterConfig) {
        if let Some(timeout) = self.timeout {
            config.wait.timeout_seconds = Some(timeout);
        }
        if let Some(attempts) = self.attempts {
            config.wait.max_attempts = Some(attempts);
        }
        if let Some(interval) = self.interval {
            config.wait.interval_seconds = Some(interval);
        }
        if let Some(exponential) = self.exponential {
            config.wait.exponential = Some(exponential);
        }
        if let Some(max_interval) = self.max_interval {
            config.wait.max_interval_seconds = Some(max_interval);
        }
        if self.json {
            config.output.json = Some(true);
        }
        if let Some(probe) = &self.probe {
            config.probe = Some(probe.clone().into());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::WaiterError;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_cmd_with_hyphen_args() {
        let cli = CliConfig::try_parse_from([
            "air-waiter",
            "--timeout",
            "10",
            "cmd",
            "--expect-exit",
            "0",
            "pg_isready",
            "-h",
            "db",
        ])
        .unwrap();

        let run = cli.resolve().unwrap();
        assert_eq!(run.policy.timeout, Duration::from_secs(10));
        assert_eq!(
            run.probe,
            ProbeConfig::Command {
                program: "pg_isready".to_string(),
                args: vec!["-h".to_string(), "db".to_string()],
                expect_exit: Some(0),
                expect_output: None,
                timeout_seconds: None,
            }
        );
    }

    #[test]
    fn test_flags_override_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(
                br#"
[wait]
timeout_seconds = 120
interval_seconds = 2

[probe]
type = "tcp"
address = "localhost:5432"
"#,
            )
            .unwrap();

        let path = temp_file.path().to_str().unwrap().to_string();
        let cli = CliConfig::try_parse_from([
            "air-waiter",
            "--config",
            path.as_str(),
            "--interval",
            "0.5",
            "--exponential",
            "--max-interval",
            "4",
            "--json",
        ])
        .unwrap();

        let run = cli.resolve().unwrap();
        assert_eq!(run.policy.timeout, Duration::from_secs(120));
        assert_eq!(run.policy.interval, Duration::from_millis(500));
        assert!(run.policy.exponential);
        assert_eq!(run.policy.max_interval, Duration::from_secs(4));
        assert!(run.json_output);
        assert_eq!(
            run.probe,
            ProbeConfig::Tcp {
                address: "localhost:5432".to_string(),
                connect_timeout_seconds: None,
            }
        );
    }

    #[test]
    fn test_flags_can_switch_off_file_settings() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(
                br#"
[wait]
timeout_seconds = 60
exponential = true

[output]
json = true
"#,
            )
            .unwrap();

        let path = temp_file.path().to_str().unwrap().to_string();
        let cli = CliConfig::try_parse_from([
            "air-waiter",
            "-c",
            path.as_str(),
            "--exponential=false",
            "-n",
            "7",
            "http",
            "http://localhost:8080/health",
            "--status",
            "204",
            "--body",
            "ok",
            "--request-timeout",
            "1.5",
        ])
        .unwrap();

        let run = cli.resolve().unwrap();
        assert!(!run.policy.exponential);
        assert!(run.json_output);
        assert_eq!(run.policy.max_attempts, 7);
        assert_eq!(run.policy.timeout, Duration::from_secs(60));
        assert_eq!(
            run.probe,
            ProbeConfig::Http {
                url: "http://localhost:8080/health".to_string(),
                expect_status: Some(204),
                expect_body: Some("ok".to_string()),
                request_timeout_seconds: Some(1.5),
            }
        );
    }

    #[test]
    fn test_bare_exponential_flag_does_not_eat_subcommand() {
        let cli =
            CliConfig::try_parse_from(["air-waiter", "-t", "5", "--exponential", "tcp", "db:5432"])
                .unwrap();
        assert_eq!(cli.exponential, Some(true));
        assert!(cli.resolve().unwrap().policy.exponential);
    }

    #[test]
    fn test_missing_probe() {
        let cli = CliConfig::try_parse_from(["air-waiter", "--timeout", "5"]).unwrap();
        assert!(matches!(
            cli.resolve(),
            Err(WaiterError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_max_interval_requires_exponential() {
        let cli = CliConfig::try_parse_from([
            "air-waiter",
            "--max-interval",
            "3",
            "tcp",
            "localhost:80",
        ])
        .unwrap();
        assert!(matches!(cli.resolve(), Err(WaiterError::PolicyError(_))));
    }
}
