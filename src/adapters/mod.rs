// Adapters layer: concrete probes for external systems (processes, http, tcp).

pub mod command;
pub mod http;
pub mod tcp;

use crate::config::toml_config::ProbeConfig;
use crate::domain::ports::Probe;
use crate::utils::error::Result;
use crate::utils::validation::seconds_to_duration;

pub use command::CommandProbe;
pub use http::HttpProbe;
pub use tcp::TcpProbe;

pub fn build_probe(config: &ProbeConfig) -> Result<Box<dyn Probe>> {
    let probe: Box<dyn Probe> = match config {
        ProbeConfig::Command {
            program,
            args,
            expect_exit,
            expect_output,
            timeout_seconds,
        } => {
            let mut probe = CommandProbe::new(program, args.clone())?
                .expect_exit(expect_exit.unwrap_or(0));
            if let Some(pattern) = expect_output {
                probe = probe.expect_output(pattern)?;
            }
            if let Some(seconds) = timeout_seconds {
                probe = probe.timeout(seconds_to_duration("probe.timeout_seconds", *seconds)?);
            }
            Box::new(probe)
        }
        ProbeConfig::Http {
            url,
            expect_status,
            expect_body,
            request_timeout_seconds,
        } => {
            let timeout = match request_timeout_seconds {
                Some(seconds) => {
                    seconds_to_duration("probe.request_timeout_seconds", *seconds)?
                }
                None => http::DEFAULT_REQUEST_TIMEOUT,
            };
            let mut probe = HttpProbe::new(url, timeout)?;
            if let Some(status) = expect_status {
                probe = probe.expect_status(*status)?;
            }
            if let Some(pattern) = expect_body {
                probe = probe.expect_body(pattern)?;
            }
            Box::new(probe)
        }
        ProbeConfig::Tcp {
            address,
            connect_timeout_seconds,
        } => {
            let timeout = match connect_timeout_seconds {
                Some(seconds) => {
                    seconds_to_duration("probe.connect_timeout_seconds", *seconds)?
                }
                None => tcp::DEFAULT_CONNECT_TIMEOUT,
            };
            Box::new(TcpProbe::new(address, timeout)?)
        }
    };

    tracing::debug!("Built probe: {}", probe.name());
    Ok(probe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::WaiterError;

    #[test]
    fn test_build_every_probe_type() {
        let configs = [
            ProbeConfig::Command {
                program: "pg_isready".to_string(),
                args: vec!["-h".to_string(), "db".to_string()],
                expect_exit: Some(0),
                expect_output: Some("accepting".to_string()),
                timeout_seconds: Some(2.0),
            },
            ProbeConfig::Command {
                program: "true".to_string(),
                args: vec![],
                expect_exit: None,
                expect_output: None,
                timeout_seconds: None,
            },
            ProbeConfig::Http {
                url: "http://localhost:8080/health".to_string(),
                expect_status: Some(204),
                expect_body: Some("ok".to_string()),
                request_timeout_seconds: Some(0.5),
            },
            ProbeConfig::Tcp {
                address: "localhost:5432".to_string(),
                connect_timeout_seconds: Some(1.0),
            },
            ProbeConfig::Tcp {
                address: "localhost:6379".to_string(),
                connect_timeout_seconds: None,
            },
        ];

        let names: Vec<String> = configs
            .iter()
            .map(|config| build_probe(config).unwrap().name())
            .collect();

        assert_eq!(
            names,
            vec![
                "command pg_isready -h db",
                "command true",
                "http http://localhost:8080/health",
                "tcp localhost:5432",
                "tcp localhost:6379",
            ]
        );
    }

    #[test]
    fn test_build_rejects_negative_timeouts() {
        let config = ProbeConfig::Tcp {
            address: "localhost:5432".to_string(),
            connect_timeout_seconds: Some(-1.0),
        };
        assert!(matches!(
            build_probe(&config),
            Err(WaiterError::InvalidConfigValueError { .. })
        ));

        let config = ProbeConfig::Command {
            program: "true".to_string(),
            args: vec![],
            expect_exit: None,
            expect_output: None,
            timeout_seconds: Some(f64::NAN),
        };
        assert!(build_probe(&config).is_err());
    }
}
