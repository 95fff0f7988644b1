//! HTTP client for transparency log entry registration.
//!
//! The log exposes a single entries endpoint; a submission is one POST of the
//! signed statement JSON, answered by a JSON receipt document.

use crate::LogConfig;
use reqwest::Client;
use serde::Serialize;
use serde_json::value::RawValue;
use std::time::Duration;
use thiserror::Error;

/// Entry registration path, relative to the log base URL.
pub const ENTRIES_PATH: &str = "/api/v1/log/entries";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Log API error: HTTP {status}: {body}")]
    LogApi { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Transparency log HTTP client.
#[derive(Debug, Clone)]
pub struct LogClient {
    client: Client,
    base_url: String,
}

impl LogClient {
    /// Create a client with the configured request timeout.
    pub fn new(config: &LogConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of the entries endpoint.
    pub fn entries_url(&self) -> String {
        format!("{}{}", self.base_url, ENTRIES_PATH)
    }

    /// POST an entry and return the response body as raw JSON text.
    ///
    /// Any JSON object is accepted; other JSON values and non-JSON bodies are
    /// rejected as invalid responses.
    pub async fn submit_entry<T: Serialize + ?Sized>(&self, entry: &T) -> Result<Box<RawValue>, ClientError> {
        let url = self.entries_url();

        let response = self.client.post(&url).json(entry).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::LogApi {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let body: Box<RawValue> = serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::InvalidResponse(format!("body is not JSON: {e}")))?;

        if !body.get().starts_with('{') {
            return Err(ClientError::InvalidResponse(
                "receipt is not a JSON object".to_string(),
            ));
        }

        Ok(body)
    }
}
