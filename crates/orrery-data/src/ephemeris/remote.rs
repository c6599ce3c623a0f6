//! HTTP client for a remote ephemeris service (`POST {base}/ephemeris`)

use super::source::EphemerisSource;
use super::types::{EphemerisReply, EphemerisRequest};
use crate::error::{DataError, DataResult};
use async_trait::async_trait;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpEphemerisSource {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpEphemerisSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Per-request transport timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/ephemeris", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl EphemerisSource for HttpEphemerisSource {
    fn name(&self) -> &str {
        &self.base_url
    }

    async fn query(&self, request: &EphemerisRequest) -> DataResult<EphemerisReply> {
        let url = self.endpoint();
        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(DataError::InvalidRequest(format!("{url} returned {status}: {body}")));
        }
        if !status.is_success() {
            return Err(DataError::Network(format!("{url} returned {status}")));
        }

        let reply: EphemerisReply = response.json().await?;
        if reply.payload.operation() != request.operation() {
            return Err(DataError::Decode(format!(
                "expected {} reply, got {}",
                request.operation(),
                reply.payload.operation()
            )));
        }
        Ok(reply)
    }
}
