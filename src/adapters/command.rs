use crate::domain::model::ProbeOutcome;
use crate::domain::ports::Probe;
use crate::utils::error::{Result, WaiterError};
use crate::utils::validation::validate_non_empty_string;
use async_trait::async_trait;
use regex::Regex;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Runs a program and checks its exit code and, optionally, its stdout.
#[derive(Debug, Clone)]
pub struct CommandProbe {
    program: String,
    args: Vec<String>,
    expect_exit: i32,
    expect_output: Option<Regex>,
    timeout: Option<Duration>,
}

impl CommandProbe {
    pub fn new(program: &str, args: Vec<String>) -> Result<Self> {
        validate_non_empty_string("probe.program", program)?;

        Ok(Self {
            program: program.to_string(),
            args,
            expect_exit: 0,
            expect_output: None,
            timeout: None,
        })
    }

    pub fn expect_exit(mut self, code: i32) -> Self {
        self.expect_exit = code;
        self
    }

    pub fn expect_output(mut self, pattern: &str) -> Result<Self> {
        self.expect_output = Some(Regex::new(pattern)?);
        Ok(self)
    }

    /// Kill the program if a single run takes longer than this.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn evaluate(&self, code: Option<i32>, stdout: &str) -> ProbeOutcome {
        let Some(code) = code else {
            return ProbeOutcome::pending("terminated by signal");
        };

        if code != self.expect_exit {
            return ProbeOutcome::pending(format!(
                "exit code {} (expected {})",
                code, self.expect_exit
            ));
        }

        match &self.expect_output {
            Some(re) if !re.is_match(stdout) => {
                ProbeOutcome::pending(format!("output does not match /{}/", re.as_str()))
            }
            _ => ProbeOutcome::ready(format!("exit code {}", code)),
        }
    }
}

#[async_trait]
impl Probe for CommandProbe {
    fn name(&self) -> String {
        if self.args.is_empty() {
            format!("command {}", self.program)
        } else {
            format!("command {} {}", self.program, self.args.join(" "))
        }
    }

    async fn check(&self) -> Result<ProbeOutcome> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        let run = command.output();

        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, run).await {
                Ok(output) => output,
                Err(_) => {
                    return Ok(ProbeOutcome::pending(format!(
                        "still running after {:?}",
                        limit
                    )))
                }
            },
            None => run.await,
        };

        let output = output.map_err(|e| WaiterError::ProbeError {
            probe: self.name(),
            message: format!("failed to start: {}", e),
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        tracing::debug!(
            "{} exited with {:?}, {} bytes of output",
            self.program,
            output.status.code(),
            output.stdout.len()
        );

        Ok(self.evaluate(output.status.code(), &stdout))
    }
}
