use crate::domain::model::ProbeOutcome;
use crate::domain::ports::Probe;
use crate::utils::error::{Result, WaiterError};
use crate::utils::validation::validate_socket_address;
use async_trait::async_trait;
use std::time::Duration;
use tokio::net::TcpStream;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Ready once a TCP connection to `host:port` is accepted.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    address: String,
    connect_timeout: Duration,
}

impl TcpProbe {
    pub fn new(address: &str, connect_timeout: Duration) -> Result<Self> {
        validate_socket_address("probe.address", address)?;

        Ok(Self {
            address: address.to_string(),
            connect_timeout,
        })
    }
}

#[async_trait]
impl Probe for TcpProbe {
    fn name(&self) -> String {
        format!("tcp {}", self.address)
    }

    async fn check(&self) -> Result<ProbeOutcome> {
        match tokio::time::timeout(self.connect_timeout, TcpStream::connect(&self.address)).await {
            Ok(Ok(stream)) => {
                let peer = stream
                    .peer_addr()
                    .map(|addr| addr.to_string())
                    .unwrap_or_else(|_| self.address.clone());
                Ok(ProbeOutcome::ready(format!("connected to {}", peer)))
            }
            Ok(Err(e)) => Err(WaiterError::ConnectionError {
                target: self.address.clone(),
                message: e.to_string(),
            }),
            Err(_) => Err(WaiterError::ConnectionError {
                target: self.address.clone(),
                message: format!("no answer within {:?}", self.connect_timeout),
            }),
        }
    }
}
