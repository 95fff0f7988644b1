//! Statement verification.
//!
//! Outcomes are three-way: `Ok(true)` accepted, `Ok(false)` well-formed but
//! the signature does not check out, `Err(_)` malformed input.

use crate::bundle::Bundle;
use crate::codec::from_fixed_width;
use crate::crypto::{Es256Verifier, VerifyingBackend};
use crate::error::{Result, VerificationError};
use crate::statement::{signing_input, SignedStatement, ALGORITHM, B64URL};
use crate::types::SignatureBytes;
use base64::Engine as _;

/// Verifies statements with an injected verification backend.
pub struct StatementVerifier<V: VerifyingBackend> {
    backend: V,
}

impl<V: VerifyingBackend> StatementVerifier<V> {
    pub fn new(backend: V) -> Self {
        Self { backend }
    }

    /// Recompute the signing input and check the signature.
    pub fn verify(&self, statement: &SignedStatement) -> std::result::Result<bool, VerificationError> {
        if statement.protected.alg != ALGORITHM {
            return Err(VerificationError::UnsupportedAlgorithm(
                statement.protected.alg.clone(),
            ));
        }

        // The payload is signed in its encoded form, but it must still decode.
        statement.payload_bytes()?;

        let raw = B64URL
            .decode(&statement.signature)
            .map_err(|e| VerificationError::InvalidBase64 {
                field: "signature",
                reason: e.to_string(),
            })?;
        let fixed = SignatureBytes::from_slice(&raw)?;

        if B64URL.encode(fixed.0) != statement.signature {
            tracing::debug!(kid = %statement.protected.kid, "Non-canonical signature encoding");
            return Ok(false);
        }

        let input = signing_input(&statement.protected, &statement.payload);
        let der = from_fixed_width(&fixed.0)?;
        let valid = self.backend.verify_der(&input, &der);

        tracing::debug!(kid = %statement.protected.kid, valid, "Verified statement");
        Ok(valid)
    }

    /// Verify the statement carried by a bundle.
    pub fn verify_bundle(&self, bundle: &Bundle) -> std::result::Result<bool, VerificationError> {
        self.verify(&bundle.statement)
    }
}

/// One-shot verification against a PEM public key.
pub fn verify_statement(statement: &SignedStatement, public_key_pem: &str) -> Result<bool> {
    let verifier = StatementVerifier::new(Es256Verifier::from_pem(public_key_pem)?);
    Ok(verifier.verify(statement)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Es256Signer;
    use crate::error::{EncodingError, KeyError, ScittError};
    use crate::statement::StatementBuilder;
    use crate::types::KeyId;
    use p256::ecdsa::SigningKey;
    use rand::rngs::OsRng;
    use serde_json::json;

    const P256_PKCS8: &str = include_str!("../tests/fixtures/p256.pem");
    const P256_PUBLIC: &str = include_str!("../tests/fixtures/p256.pub.pem");
    const P384_PUBLIC: &str = include_str!("../tests/fixtures/p384.pub.pem");
    const GOLDEN_STATEMENT: &str = include_str!("../tests/fixtures/golden_statement.json");

    const URL_SAFE_CHARS: &[u8] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

    fn signed(attestation: serde_json::Value) -> (SignedStatement, StatementVerifier<Es256Verifier>) {
        let signer = Es256Signer::new(SigningKey::random(&mut OsRng));
        let verifier = StatementVerifier::new(signer.verifier());
        let statement = StatementBuilder::new(signer, "did:example:issuer#keys-1")
            .build(&attestation)
            .unwrap();
        (statement, verifier)
    }

    fn replace_char(text: &str, index: usize, with: char) -> String {
        text.chars()
            .enumerate()
            .map(|(i, c)| if i == index { with } else { c })
            .collect()
    }

    fn other_char(current: char) -> char {
        if current == 'A' { 'B' } else { 'A' }
    }

    #[test]
    fn test_build_then_verify() {
        let (statement, verifier) = signed(json!({"id": "att-1", "claim": "x"}));
        assert!(verifier.verify(&statement).unwrap());
    }

    #[test]
    fn test_flipping_last_signature_char_fails() {
        let (mut statement, verifier) = signed(json!({"id": "att-1", "claim": "x"}));
        let last = statement.signature.len() - 1;
        let current = statement.signature.chars().last().unwrap();
        statement.signature = replace_char(&statement.signature, last, other_char(current));
        assert!(!verifier.verify(&statement).unwrap());
    }

    #[test]
    fn test_every_signature_char_flip_fails_without_error() {
        let (statement, verifier) = signed(json!({"id": "att-3", "n": 42}));
        for index in 0..statement.signature.len() {
            let current = statement.signature.chars().nth(index).unwrap();
            for replacement in URL_SAFE_CHARS.iter().map(|b| *b as char).filter(|c| *c != current).take(3) {
                let mut tampered = statement.clone();
                tampered.signature = replace_char(&statement.signature, index, replacement);
                assert!(!verifier.verify(&tampered).unwrap(), "signature index {index}");
            }
        }
    }

    #[test]
    fn test_every_payload_char_flip_fails_without_error() {
        let (statement, verifier) = signed(json!({"id": "att-4", "claim": "payload"}));
        for index in 0..statement.payload.len() {
            let current = statement.payload.chars().nth(index).unwrap();
            let mut tampered = statement.clone();
            tampered.payload = replace_char(&statement.payload, index, other_char(current));
            assert!(!verifier.verify(&tampered).unwrap(), "payload index {index}");
        }
    }

    #[test]
    fn test_header_tamper_fails() {
        let (mut statement, verifier) = signed(json!({"id": "att-1"}));
        statement.protected.kid = KeyId::from("did:example:mallory#keys-1");
        assert!(!verifier.verify(&statement).unwrap());

        let (mut statement, verifier) = signed(json!({"id": "att-1"}));
        statement.protected.typ = "application/json".to_string();
        assert!(!verifier.verify(&statement).unwrap());
    }

    #[test]
    fn test_unsupported_algorithm_is_error() {
        let (mut statement, verifier) = signed(json!({"id": "att-1"}));
        statement.protected.alg = "none".to_string();
        assert!(matches!(
            verifier.verify(&statement),
            Err(VerificationError::UnsupportedAlgorithm(alg)) if alg == "none"
        ));
    }

    #[test]
    fn test_wrong_key_is_false() {
        let (statement, _) = signed(json!({"id": "att-1"}));
        let other = StatementVerifier::new(Es256Signer::new(SigningKey::random(&mut OsRng)).verifier());
        assert!(!other.verify(&statement).unwrap());
    }

    #[test]
    fn test_malformed_signature_lengths_are_errors() {
        let (statement, verifier) = signed(json!({"id": "att-1"}));
        for len in [63usize, 65] {
            let mut tampered = statement.clone();
            tampered.signature = B64URL.encode(vec![1u8; len]);
            assert!(matches!(
                verifier.verify(&tampered),
                Err(VerificationError::Encoding(EncodingError::InvalidSignatureLength(l))) if l == len
            ));
        }
    }

    #[test]
    fn test_bad_base64_is_error() {
        let (statement, verifier) = signed(json!({"id": "att-1"}));

        let mut tampered = statement.clone();
        tampered.signature = format!("{}!", &statement.signature[1..]);
        assert!(matches!(
            verifier.verify(&tampered),
            Err(VerificationError::InvalidBase64 { field: "signature", .. })
        ));

        let mut tampered = statement.clone();
        tampered.payload = "not*base64".to_string();
        assert!(matches!(
            verifier.verify(&tampered),
            Err(VerificationError::InvalidBase64 { field: "payload", .. })
        ));
    }

    #[test]
    fn test_out_of_range_scalars_are_false() {
        let (mut statement, verifier) = signed(json!({"id": "att-1"}));
        statement.signature = B64URL.encode([0u8; 64]);
        assert!(!verifier.verify(&statement).unwrap());

        statement.signature = B64URL.encode([0xffu8; 64]);
        assert!(!verifier.verify(&statement).unwrap());
    }

    #[test]
    fn test_golden_statement_verifies() {
        let statement: SignedStatement = serde_json::from_str(GOLDEN_STATEMENT).unwrap();
        assert!(verify_statement(&statement, P256_PUBLIC).unwrap());
    }

    #[test]
    fn test_same_key_from_pem_roundtrip() {
        let signer = Es256Signer::from_pem(P256_PKCS8).unwrap();
        let statement = StatementBuilder::new(signer, "kid-1")
            .build(&json!({"id": "att-1", "claim": "x"}))
            .unwrap();
        assert!(verify_statement(&statement, P256_PUBLIC).unwrap());
    }

    #[test]
    fn test_wrong_curve_public_key_is_key_error() {
        let statement: SignedStatement = serde_json::from_str(GOLDEN_STATEMENT).unwrap();
        assert!(matches!(
            verify_statement(&statement, P384_PUBLIC),
            Err(ScittError::Key(KeyError::InvalidPublicKey(_)))
        ));
    }
}
