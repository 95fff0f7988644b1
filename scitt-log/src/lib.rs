//! HTTP transparency log backend.
//!
//! Registers signed statements with a remote log and hands back the log's
//! receipt unchanged.
//!
//! ## Submission
//! 1. Serialize the signed statement as JSON
//! 2. POST it to `{base_url}/api/v1/log/entries`
//! 3. Accept any JSON object as the receipt
//!
//! One attempt per call. Timeouts, transport failures, non-2xx statuses and
//! non-JSON bodies all surface as [`LogSubmissionError`].

pub mod client;

use async_trait::async_trait;
use client::{ClientError, LogClient};
use scitt_core::{LogSubmissionError, Receipt, SignedStatement, TransparencyLog};
use serde::Deserialize;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for an HTTP transparency log.
///
/// Deserialization goes through [`LogConfig::new`], so loaded configs get the
/// same URL normalization and checks.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "LogConfigFile")]
pub struct LogConfig {
    /// Log base URL, without trailing slash
    pub base_url: String,
    /// Request timeout (seconds)
    pub timeout_secs: u64,
}

/// On-disk form of [`LogConfig`].
#[derive(Debug, Deserialize)]
struct LogConfigFile {
    base_url: String,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
}

impl TryFrom<LogConfigFile> for LogConfig {
    type Error = LogSubmissionError;

    fn try_from(file: LogConfigFile) -> Result<Self, Self::Error> {
        Ok(LogConfig::new(file.base_url)?.with_timeout_secs(file.timeout_secs))
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl LogConfig {
    /// Config with the default timeout. Trailing slashes are dropped.
    pub fn new(base_url: impl Into<String>) -> Result<Self, LogSubmissionError> {
        let base_url = base_url.into();
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(LogSubmissionError::Config(
                "log base URL is empty".to_string(),
            ));
        }

        Ok(Self {
            base_url: trimmed.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        })
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Transparency log reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransparencyLog {
    config: LogConfig,
    client: LogClient,
}

impl HttpTransparencyLog {
    pub fn new(config: LogConfig) -> Result<Self, LogSubmissionError> {
        if config.base_url.is_empty() {
            return Err(LogSubmissionError::Config(
                "log base URL is empty".to_string(),
            ));
        }

        let client = LogClient::new(&config)
            .map_err(|e| LogSubmissionError::Config(e.to_string()))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    fn map_error(&self, error: ClientError) -> LogSubmissionError {
        let endpoint = self.client.entries_url();
        match error {
            ClientError::Network(e) if e.is_timeout() => LogSubmissionError::Transport {
                endpoint,
                reason: format!("timed out after {}s", self.config.timeout_secs),
            },
            ClientError::Network(e) => LogSubmissionError::Transport {
                endpoint,
                reason: e.to_string(),
            },
            ClientError::LogApi { status, body } => LogSubmissionError::Rejected {
                endpoint,
                status,
                body,
            },
            ClientError::InvalidResponse(reason) => {
                LogSubmissionError::InvalidResponse { endpoint, reason }
            }
        }
    }
}

#[async_trait]
impl TransparencyLog for HttpTransparencyLog {
    fn uri(&self) -> &str {
        self.client.base_url()
    }

    async fn submit(&self, statement: &SignedStatement) -> Result<Receipt, LogSubmissionError> {
        tracing::debug!(
            endpoint = %self.client.entries_url(),
            kid = %statement.protected.kid,
            "Submitting statement to transparency log"
        );

        let body = self
            .client
            .submit_entry(statement)
            .await
            .map_err(|e| {
                let error = self.map_error(e);
                tracing::warn!(error = %error, "Transparency log submission failed");
                error
            })?;

        let receipt = Receipt::from_raw(body);
        tracing::info!(
            log = %self.config.base_url,
            structured = receipt.as_structured().is_some(),
            "Received transparency log receipt"
        );
        Ok(receipt)
    }
}
