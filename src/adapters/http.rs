use crate::domain::model::ProbeOutcome;
use crate::domain::ports::Probe;
use crate::utils::error::Result;
use crate::utils::validation::{validate_range, validate_url};
use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, StatusCode};
use std::time::Duration;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// GETs a URL; ready on the expected status (any 2xx by default) and optional body match.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    url: String,
    client: Client,
    expect_status: Option<StatusCode>,
    expect_body: Option<Regex>,
}

impl HttpProbe {
    pub fn new(url: &str, request_timeout: Duration) -> Result<Self> {
        validate_url("probe.url", url)?;

        let client = Client::builder().timeout(request_timeout).build()?;

        Ok(Self {
            url: url.to_string(),
            client,
            expect_status: None,
            expect_body: None,
        })
    }

    pub fn expect_status(mut self, status: u16) -> Result<Self> {
        validate_range("probe.expect_status", status, 100, 599)?;
        self.expect_status = StatusCode::from_u16(status).ok();
        Ok(self)
    }

    pub fn expect_body(mut self, pattern: &str) -> Result<Self> {
        self.expect_body = Some(Regex::new(pattern)?);
        Ok(self)
    }

    fn status_accepted(&self, status: StatusCode) -> bool {
        match self.expect_status {
            Some(expected) => status == expected,
            None => status.is_success(),
        }
    }
}

#[async_trait]
impl Probe for HttpProbe {
    fn name(&self) -> String {
        format!("http {}", self.url)
    }

    async fn check(&self) -> Result<ProbeOutcome> {
        tracing::debug!("Making health request to: {}", self.url);
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        tracing::debug!("Health response status: {}", status);

        if !self.status_accepted(status) {
            return Ok(ProbeOutcome::pending(format!("status {}", status)));
        }

        if let Some(re) = &self.expect_body {
            let body = response.text().await?;
            if !re.is_match(&body) {
                return Ok(ProbeOutcome::pending(format!(
                    "status {}, body does not match /{}/",
                    status,
                    re.as_str()
                )));
            }
        }

        Ok(ProbeOutcome::ready(format!("status {}", status)))
    }
}
