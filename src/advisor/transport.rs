use std::time::Duration;

use serde::Serialize;

use super::AdvisoryError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One blocking JSON POST with bearer authentication.
pub trait Transport {
    fn post_json<B: Serialize>(
        &self,
        url: &str,
        bearer: &str,
        body: &B,
    ) -> Result<HttpReply, AdvisoryError>;
}

pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// `None` keeps reqwest's default timeout.
    pub fn new(timeout: Option<Duration>) -> Result<Self, AdvisoryError> {
        let mut builder = reqwest::blocking::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            AdvisoryError::Unavailable(format!("failed to create HTTP client: {e}"))
        })?;
        Ok(HttpTransport { client })
    }
}

impl Transport for HttpTransport {
    fn post_json<B: Serialize>(
        &self,
        url: &str,
        bearer: &str,
        body: &B,
    ) -> Result<HttpReply, AdvisoryError> {
        let response = self
            .client
            .post(url)
            .bearer_auth(bearer)
            .json(body)
            .send()
            .map_err(|e| AdvisoryError::Unavailable(format!("request failed: {e}")))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| AdvisoryError::Unavailable(format!("failed to read response: {e}")))?;
        Ok(HttpReply { status, body })
    }
}
