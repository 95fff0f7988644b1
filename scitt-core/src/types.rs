//! Core types used across the statement pipeline.

use crate::error::EncodingError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// SHA-256 hash (32 bytes)
pub type Hash256 = [u8; 32];

/// Width of one P-256 scalar in the fixed signature encoding.
pub const SCALAR_LEN: usize = 32;

/// Fixed-width ES256 signature: `r || s`, each 32 bytes big-endian.
///
/// This is the wire/storage form carried (base64url) in a signed statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureBytes(pub [u8; 64]);

impl SignatureBytes {
    /// Take a 64-byte slice; any other length is rejected, never padded or truncated.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, EncodingError> {
        let fixed: [u8; 64] = bytes
            .try_into()
            .map_err(|_| EncodingError::InvalidSignatureLength(bytes.len()))?;
        Ok(SignatureBytes(fixed))
    }

    /// Big-endian `r` component.
    pub fn r(&self) -> &[u8] {
        &self.0[..SCALAR_LEN]
    }

    /// Big-endian `s` component.
    pub fn s(&self) -> &[u8] {
        &self.0[SCALAR_LEN..]
    }
}

impl From<[u8; 64]> for SignatureBytes {
    fn from(bytes: [u8; 64]) -> Self {
        SignatureBytes(bytes)
    }
}

impl AsRef<[u8; 64]> for SignatureBytes {
    fn as_ref(&self) -> &[u8; 64] {
        &self.0
    }
}

/// Caller-supplied key identifier (e.g. `did:key:...#keys-1`). Opaque, not validated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyId(pub String);

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for KeyId {
    fn from(kid: &str) -> Self {
        KeyId(kid.to_string())
    }
}

impl From<String> for KeyId {
    fn from(kid: String) -> Self {
        KeyId(kid)
    }
}
