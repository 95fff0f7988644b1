//! Cryptographic primitives for ES256 statements.
//!
//! The statement builder and verifier never touch `p256` directly: they are
//! handed a [`SigningBackend`] / [`VerifyingBackend`] at construction. The
//! software implementations here wrap RustCrypto's P-256 ECDSA.

use crate::codec::DerSignature;
use crate::error::KeyError;
use crate::types::Hash256;
use p256::ecdsa::signature::{Signer as _, Verifier as _};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePublicKey, LineEnding};
use sha2::{Digest, Sha256};

/// Compute SHA-256 hash of data.
pub fn sha256(data: &[u8]) -> Hash256 {
    let hash = Sha256::digest(data);
    hash.into()
}

/// Hex-encoded SHA-256 of data.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// ECDSA P-256 / SHA-256 signing primitive.
pub trait SigningBackend: Send + Sync {
    /// Sign `message` (hashed with SHA-256 internally) and return DER.
    fn sign_der(&self, message: &[u8]) -> Result<DerSignature, KeyError>;
}

/// ECDSA P-256 / SHA-256 verification primitive.
pub trait VerifyingBackend: Send + Sync {
    /// `true` iff `signature` is a valid signature over `message`.
    ///
    /// DER that the backend cannot interpret (e.g. `r` out of range) is a
    /// failed verification, not an error.
    fn verify_der(&self, message: &[u8], signature: &DerSignature) -> bool;
}

/// Software ES256 signer backed by a P-256 private key.
pub struct Es256Signer {
    signing_key: SigningKey,
}

impl Es256Signer {
    /// Create a new signer from a signing key.
    pub fn new(signing_key: SigningKey) -> Self {
        Self { signing_key }
    }

    /// Load an unencrypted P-256 private key from PEM.
    ///
    /// Accepts PKCS#8 (`BEGIN PRIVATE KEY`) and SEC1 (`BEGIN EC PRIVATE KEY`).
    pub fn from_pem(pem: &str) -> Result<Self, KeyError> {
        let signing_key = match SigningKey::from_pkcs8_pem(pem) {
            Ok(key) => key,
            Err(pkcs8_err) => {
                let secret = p256::SecretKey::from_sec1_pem(pem).map_err(|_| {
                    KeyError::InvalidPrivateKey(format!("not a P-256 PKCS#8 or SEC1 key: {pkcs8_err}"))
                })?;
                SigningKey::from(secret)
            }
        };
        Ok(Self { signing_key })
    }

    /// Get the matching verifier.
    pub fn verifier(&self) -> Es256Verifier {
        Es256Verifier::new(*self.signing_key.verifying_key())
    }

    /// SubjectPublicKeyInfo PEM of the public half.
    pub fn public_key_pem(&self) -> Result<String, KeyError> {
        self.signing_key
            .verifying_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| KeyError::Export(e.to_string()))
    }
}

impl SigningBackend for Es256Signer {
    fn sign_der(&self, message: &[u8]) -> Result<DerSignature, KeyError> {
        let signature: Signature = self
            .signing_key
            .try_sign(message)
            .map_err(|e| KeyError::Signing(e.to_string()))?;
        Ok(DerSignature::from_bytes(signature.to_der().as_bytes().to_vec()))
    }
}

impl std::fmt::Debug for Es256Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Es256Signer")
            .field("signing_key", &"[REDACTED]")
            .finish()
    }
}

/// Software ES256 verifier backed by a P-256 public key.
#[derive(Debug, Clone)]
pub struct Es256Verifier {
    verifying_key: VerifyingKey,
}

impl Es256Verifier {
    pub fn new(verifying_key: VerifyingKey) -> Self {
        Self { verifying_key }
    }

    /// Load a P-256 SubjectPublicKeyInfo PEM (`BEGIN PUBLIC KEY`).
    pub fn from_pem(pem: &str) -> Result<Self, KeyError> {
        let verifying_key = VerifyingKey::from_public_key_pem(pem)
            .map_err(|e| KeyError::InvalidPublicKey(e.to_string()))?;
        Ok(Self { verifying_key })
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }
}

impl VerifyingBackend for Es256Verifier {
    fn verify_der(&self, message: &[u8], signature: &DerSignature) -> bool {
        match Signature::from_der(signature.as_bytes()) {
            Ok(sig) => self.verifying_key.verify(message, &sig).is_ok(),
            Err(e) => {
                tracing::debug!("Backend rejected DER signature: {}", e);
                false
            }
        }
    }
}
