//! Transparency log receipts.
//!
//! A receipt is obtained either from a configured [`TransparencyLog`] or, when
//! none is configured, synthesized offline from a digest of the statement.
//! Offline mode is a degraded-availability fallback, not an error path: it
//! performs no I/O and cannot fail.

use crate::canonical::{to_sorted_json, Separators};
use crate::crypto::sha256_hex;
use crate::error::{LogSubmissionError, Result};
use crate::statement::SignedStatement;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::value::RawValue;
use std::sync::Arc;

/// Hash algorithm name recorded in offline proofs.
pub const OFFLINE_HASH_ALG: &str = "sha256";

/// Format of `integrated_time`.
pub const INTEGRATED_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Trait for transparency log backends.
///
/// Implementations perform exactly one submission attempt per call; retry
/// policy belongs to the caller.
#[async_trait]
pub trait TransparencyLog: Send + Sync {
    /// Base URI of the log, for diagnostics.
    fn uri(&self) -> &str;

    /// Register a statement and return the log's receipt verbatim.
    async fn submit(&self, statement: &SignedStatement) -> std::result::Result<Receipt, LogSubmissionError>;
}

/// Where the entry was recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogEntryInfo {
    pub uri: String,
    pub tree_id: String,
    pub entry_id: String,
    /// UTC, `%Y-%m-%dT%H:%M:%SZ`
    pub integrated_time: String,
}

/// Inclusion proof data. Carried through, never checked against a root here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InclusionProof {
    pub hash_alg: String,
    pub inclusion_path: Vec<String>,
    pub root_hash: String,
}

/// Receipt in the `{log, proof}` shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogReceipt {
    pub log: LogEntryInfo,
    pub proof: InclusionProof,
}

/// Evidence that a statement was recorded.
///
/// Online logs own their response schema, so anything that is not exactly the
/// `{log, proof}` shape is kept as the raw JSON text of the response and
/// re-emitted byte for byte, key order included.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Receipt {
    Structured(LogReceipt),
    Opaque(Box<RawValue>),
}

impl Receipt {
    /// Structured view, if the receipt has the `{log, proof}` shape.
    pub fn as_structured(&self) -> Option<&LogReceipt> {
        match self {
            Receipt::Structured(receipt) => Some(receipt),
            Receipt::Opaque(_) => None,
        }
    }

    pub fn entry_id(&self) -> Option<&str> {
        self.as_structured().map(|r| r.log.entry_id.as_str())
    }

    pub fn root_hash(&self) -> Option<&str> {
        self.as_structured().map(|r| r.proof.root_hash.as_str())
    }

    /// Structured when the JSON fits the `{log, proof}` shape, opaque otherwise.
    pub fn from_raw(raw: Box<RawValue>) -> Self {
        match serde_json::from_str::<LogReceipt>(raw.get()) {
            Ok(structured) => Receipt::Structured(structured),
            Err(_) => Receipt::Opaque(raw),
        }
    }

    /// Interpret a log response body.
    pub fn from_response(body: &str) -> std::result::Result<Self, serde_json::Error> {
        Ok(Self::from_raw(serde_json::from_str(body)?))
    }
}

impl PartialEq for Receipt {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Receipt::Structured(a), Receipt::Structured(b)) => a == b,
            (Receipt::Opaque(a), Receipt::Opaque(b)) => a.get() == b.get(),
            _ => false,
        }
    }
}

impl<'de> Deserialize<'de> for Receipt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Box::<RawValue>::deserialize(deserializer).map(Receipt::from_raw)
    }
}

/// Identity written into synthesized receipts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfflineReceiptConfig {
    pub uri: String,
    pub tree_id: String,
}

impl Default for OfflineReceiptConfig {
    fn default() -> Self {
        Self {
            uri: "offline://demo".to_string(),
            tree_id: "demo".to_string(),
        }
    }
}

/// Hex SHA-256 over the sorted-key, spaced JSON of the statement.
pub fn statement_digest(statement: &SignedStatement) -> String {
    sha256_hex(&to_sorted_json(&statement.to_value(), Separators::Spaced))
}

/// Synthesize a receipt for `statement` as if integrated at `integrated_at`.
pub fn offline_receipt(
    statement: &SignedStatement,
    integrated_at: DateTime<Utc>,
    config: &OfflineReceiptConfig,
) -> Receipt {
    let root = statement_digest(statement);
    Receipt::Structured(LogReceipt {
        log: LogEntryInfo {
            uri: config.uri.clone(),
            tree_id: config.tree_id.clone(),
            entry_id: format!("{OFFLINE_HASH_ALG}:{root}"),
            integrated_time: integrated_at.format(INTEGRATED_TIME_FORMAT).to_string(),
        },
        proof: InclusionProof {
            hash_alg: OFFLINE_HASH_ALG.to_string(),
            inclusion_path: Vec::new(),
            root_hash: root,
        },
    })
}

/// Obtains receipts from a configured log, or offline when none is set.
#[derive(Clone, Default)]
pub struct ReceiptProvider {
    log: Option<Arc<dyn TransparencyLog>>,
    offline: OfflineReceiptConfig,
}

impl ReceiptProvider {
    /// Provider that always synthesizes offline receipts.
    pub fn offline() -> Self {
        Self::default()
    }

    /// Provider that submits to `log`.
    pub fn online(log: Arc<dyn TransparencyLog>) -> Self {
        Self {
            log: Some(log),
            offline: OfflineReceiptConfig::default(),
        }
    }

    pub fn with_offline_config(mut self, config: OfflineReceiptConfig) -> Self {
        self.offline = config;
        self
    }

    pub fn is_online(&self) -> bool {
        self.log.is_some()
    }

    /// Get a receipt for `statement`.
    ///
    /// Online failures surface as [`LogSubmissionError`]; there is no silent
    /// fallback to offline mode.
    pub async fn obtain(&self, statement: &SignedStatement) -> Result<Receipt> {
        match &self.log {
            Some(log) => {
                tracing::info!("Submitting statement to transparency log {}", log.uri());
                Ok(log.submit(statement).await?)
            }
            None => {
                tracing::info!("No transparency log configured, synthesizing offline receipt");
                Ok(offline_receipt(statement, Utc::now(), &self.offline))
            }
        }
    }
}

impl std::fmt::Debug for ReceiptProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReceiptProvider")
            .field("log", &self.log.as_ref().map(|l| l.uri().to_string()))
            .field("offline", &self.offline)
            .finish()
    }
}
