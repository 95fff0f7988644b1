//! Error taxonomy for statement construction, receipts and verification.
//!
//! A signature that simply does not verify is *not* an error: the verifier
//! reports it as `Ok(false)`. Errors are reserved for broken input or
//! unusable key material.

use thiserror::Error;

/// Canonicalization and signature-encoding failures.
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid fixed-width signature length: expected 64, got {0}")]
    InvalidSignatureLength(usize),

    #[error("Signature integer {component} needs {len} bytes, at most 32 allowed")]
    IntegerTooLarge { component: &'static str, len: usize },

    #[error("Malformed DER signature: {0}")]
    MalformedDer(&'static str),
}

/// Unusable key material.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Invalid P-256 private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Invalid P-256 public key: {0}")]
    InvalidPublicKey(String),

    #[error("Key export failed: {0}")]
    Export(String),

    #[error("Signing failed: {0}")]
    Signing(String),
}

/// Failures talking to a transparency log. Never retried internally.
#[derive(Debug, Error)]
pub enum LogSubmissionError {
    #[error("Log configuration error: {0}")]
    Config(String),

    #[error("Transport error calling {endpoint}: {reason}")]
    Transport { endpoint: String, reason: String },

    #[error("Log {endpoint} returned HTTP {status}: {body}")]
    Rejected {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Invalid receipt from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },
}

/// Malformed statement or bundle found during verification.
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("Malformed bundle: {0}")]
    MalformedBundle(String),

    #[error("Field `{field}` is not valid base64url: {reason}")]
    InvalidBase64 { field: &'static str, reason: String },

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Signature encoding error: {0}")]
    Encoding(#[from] EncodingError),
}

/// Umbrella error for callers driving the whole pipeline.
#[derive(Debug, Error)]
pub enum ScittError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    LogSubmission(#[from] LogSubmissionError),

    #[error(transparent)]
    Verification(#[from] VerificationError),
}

pub type Result<T> = std::result::Result<T, ScittError>;
