//! Signed statement envelope (compact JWS-style, ES256).
//!
//! A statement carries the protected header as a JSON object, the canonical
//! payload and the fixed-width signature, both base64url without padding.
//!
//! ## Signing input
//! ```text
//! base64url(compact-JSON(protected)) || "." || base64url(canonical payload)
//! ```
//! The builder and the verifier both derive it through [`signing_input`]; the
//! two computations must be byte-identical for a statement to verify.

use crate::canonical::{canonicalize, write_json_string};
use crate::codec::to_fixed_width;
use crate::crypto::{sha256_hex, SigningBackend};
use crate::error::{Result, VerificationError};
use crate::types::KeyId;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The one supported algorithm identifier.
pub const ALGORITHM: &str = "ES256";

/// Media type of the envelope.
pub const STATEMENT_MEDIA_TYPE: &str = "application/scitt+json";

/// base64url, no padding on output; trailing bits are tolerated on input so a
/// hand-edited signature reaches the signature check instead of erroring.
pub(crate) const B64URL: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Protected header of a signed statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedHeader {
    pub alg: String,
    pub typ: String,
    pub kid: KeyId,
}

impl ProtectedHeader {
    /// ES256 header for the given key id.
    pub fn es256(kid: KeyId) -> Self {
        Self {
            alg: ALGORITHM.to_string(),
            typ: STATEMENT_MEDIA_TYPE.to_string(),
            kid,
        }
    }

    /// Compact JSON in fixed `alg`, `typ`, `kid` order.
    pub fn to_compact_json(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(64 + self.kid.0.len());
        out.extend_from_slice(b"{\"alg\":");
        write_json_string(&self.alg, &mut out);
        out.extend_from_slice(b",\"typ\":");
        write_json_string(&self.typ, &mut out);
        out.extend_from_slice(b",\"kid\":");
        write_json_string(&self.kid.0, &mut out);
        out.push(b'}');
        out
    }

    fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("alg".to_string(), Value::String(self.alg.clone()));
        map.insert("typ".to_string(), Value::String(self.typ.clone()));
        map.insert("kid".to_string(), Value::String(self.kid.0.clone()));
        Value::Object(map)
    }
}

/// A signed attestation statement. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedStatement {
    pub protected: ProtectedHeader,
    /// base64url(canonical payload)
    pub payload: String,
    /// base64url(r || s)
    pub signature: String,
}

impl SignedStatement {
    /// Decode the payload bytes.
    pub fn payload_bytes(&self) -> std::result::Result<Vec<u8>, VerificationError> {
        B64URL
            .decode(&self.payload)
            .map_err(|e| VerificationError::InvalidBase64 {
                field: "payload",
                reason: e.to_string(),
            })
    }

    /// Decode the payload as JSON (the attestation document).
    pub fn payload_json(&self) -> std::result::Result<Value, VerificationError> {
        let bytes = self.payload_bytes()?;
        serde_json::from_slice(&bytes)
            .map_err(|e| VerificationError::MalformedBundle(format!("payload is not JSON: {e}")))
    }

    /// Hex SHA-256 of the decoded payload.
    pub fn payload_digest(&self) -> std::result::Result<String, VerificationError> {
        Ok(sha256_hex(&self.payload_bytes()?))
    }

    /// JSON value of the statement, built without going through serde.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("protected".to_string(), self.protected.to_value());
        map.insert("payload".to_string(), Value::String(self.payload.clone()));
        map.insert("signature".to_string(), Value::String(self.signature.clone()));
        Value::Object(map)
    }
}

/// Exact bytes that get signed for `protected` and an already-encoded payload.
pub fn signing_input(protected: &ProtectedHeader, encoded_payload: &str) -> Vec<u8> {
    let header = B64URL.encode(protected.to_compact_json());
    let mut input = Vec::with_capacity(header.len() + 1 + encoded_payload.len());
    input.extend_from_slice(header.as_bytes());
    input.push(b'.');
    input.extend_from_slice(encoded_payload.as_bytes());
    input
}

/// Builds signed statements with an injected signing backend.
pub struct StatementBuilder<S: SigningBackend> {
    signer: S,
    kid: KeyId,
}

impl<S: SigningBackend> StatementBuilder<S> {
    pub fn new(signer: S, kid: impl Into<KeyId>) -> Self {
        Self {
            signer,
            kid: kid.into(),
        }
    }

    pub fn kid(&self) -> &KeyId {
        &self.kid
    }

    /// Canonicalize `attestation`, sign it and package the envelope.
    pub fn build<T: Serialize + ?Sized>(&self, attestation: &T) -> Result<SignedStatement> {
        let payload = canonicalize(attestation)?;
        let protected = ProtectedHeader::es256(self.kid.clone());
        let encoded_payload = B64URL.encode(payload.as_bytes());

        let input = signing_input(&protected, &encoded_payload);
        let der = self.signer.sign_der(&input)?;
        let fixed = to_fixed_width(&der)?;

        tracing::debug!(
            kid = %self.kid,
            payload_len = payload.len(),
            "Built signed statement"
        );

        Ok(SignedStatement {
            protected,
            payload: encoded_payload,
            signature: B64URL.encode(fixed.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{from_fixed_width, DerSignature};
    use crate::crypto::{Es256Signer, VerifyingBackend};
    use crate::error::{KeyError, ScittError};
    use p256::ecdsa::SigningKey;
    use rand::rngs::OsRng;
    use serde_json::json;

    const GOLDEN_STATEMENT: &str = include_str!("../tests/fixtures/golden_statement.json");

    fn builder() -> StatementBuilder<Es256Signer> {
        StatementBuilder::new(
            Es256Signer::new(SigningKey::random(&mut OsRng)),
            "did:example:issuer#keys-1",
        )
    }

    #[test]
    fn test_payload_is_canonical_base64url() {
        let statement = builder().build(&json!({"id": "att-1", "claim": "x"})).unwrap();
        let golden: SignedStatement = serde_json::from_str(GOLDEN_STATEMENT).unwrap();

        assert_eq!(statement.payload, golden.payload);
        assert_eq!(statement.protected, golden.protected);
        assert_eq!(statement.payload_bytes().unwrap(), br#"{"claim":"x","id":"att-1"}"#);
        assert!(!statement.payload.contains('='));
    }

    #[test]
    fn test_header_json_field_order() {
        let header = ProtectedHeader::es256(KeyId::from("k1"));
        assert_eq!(
            header.to_compact_json(),
            br#"{"alg":"ES256","typ":"application/scitt+json","kid":"k1"}"#
        );
    }

    #[test]
    fn test_signing_input_shape() {
        let header = ProtectedHeader::es256(KeyId::from("k1"));
        let input = signing_input(&header, "eyJhIjoxfQ");
        let text = String::from_utf8(input).unwrap();
        let (head, payload) = text.split_once('.').unwrap();
        assert_eq!(payload, "eyJhIjoxfQ");
        assert_eq!(B64URL.decode(head).unwrap(), header.to_compact_json());
        assert!(text.is_ascii());
    }

    #[test]
    fn test_signature_is_fixed_width_and_verifies() {
        let b = builder();
        let statement = b.build(&json!({"id": "att-2", "nested": {"b": 1, "a": 2}})).unwrap();

        let raw = B64URL.decode(&statement.signature).unwrap();
        assert_eq!(raw.len(), 64);
        assert_eq!(statement.signature.len(), 86);

        let input = signing_input(&statement.protected, &statement.payload);
        let der = from_fixed_width(&raw).unwrap();
        assert!(b.signer.verifier().verify_der(&input, &der));
    }

    #[test]
    fn test_key_order_does_not_change_payload() {
        let b = builder();
        let one = b.build(&json!({"id": "x", "a": 1, "z": [1, 2]})).unwrap();
        let two = b.build(&json!({"z": [1, 2], "a": 1, "id": "x"})).unwrap();
        assert_eq!(one.payload, two.payload);
    }

    #[test]
    fn test_payload_digest_and_json() {
        let statement = builder().build(&json!({"id": "att-1", "claim": "x"})).unwrap();
        assert_eq!(
            statement.payload_digest().unwrap(),
            crate::crypto::sha256_hex(br#"{"claim":"x","id":"att-1"}"#)
        );
        assert_eq!(statement.payload_json().unwrap()["id"], "att-1");
    }

    #[test]
    fn test_to_value_matches_serde() {
        let statement = builder().build(&json!({"id": "att-1"})).unwrap();
        assert_eq!(statement.to_value(), serde_json::to_value(&statement).unwrap());
    }

    struct FailingSigner;

    impl SigningBackend for FailingSigner {
        fn sign_der(&self, _message: &[u8]) -> std::result::Result<DerSignature, KeyError> {
            Err(KeyError::Signing("hardware token unplugged".to_string()))
        }
    }

    struct GarbageSigner;

    impl SigningBackend for GarbageSigner {
        fn sign_der(&self, _message: &[u8]) -> std::result::Result<DerSignature, KeyError> {
            Ok(DerSignature::from_bytes(vec![0x30, 0x00]))
        }
    }

    #[test]
    fn test_backend_errors_propagate() {
        let err = StatementBuilder::new(FailingSigner, "k")
            .build(&json!({"id": "a"}))
            .unwrap_err();
        assert!(matches!(err, ScittError::Key(KeyError::Signing(_))));

        let err = StatementBuilder::new(GarbageSigner, "k")
            .build(&json!({"id": "a"}))
            .unwrap_err();
        assert!(matches!(err, ScittError::Encoding(_)));
    }
}
