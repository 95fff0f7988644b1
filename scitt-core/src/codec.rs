//! Conversion between the two ES256 signature encodings.
//!
//! The signing primitive speaks DER (`ECDSA-Sig-Value`), the envelope stores
//! the fixed-width JOSE form (`r || s`, 32 bytes each, big-endian).
//!
//! ## DER layout accepted and produced
//! ```text
//! 0x30 len                 SEQUENCE
//!   0x02 len r-bytes       INTEGER r (minimal, non-negative)
//!   0x02 len s-bytes       INTEGER s (minimal, non-negative)
//! ```
//! Only minimal encodings are accepted, which makes [`to_fixed_width`] and
//! [`from_fixed_width`] exact inverses over everything either one accepts.

use crate::error::EncodingError;
use crate::types::{SignatureBytes, SCALAR_LEN};

const TAG_SEQUENCE: u8 = 0x30;
const TAG_INTEGER: u8 = 0x02;

/// Structured (DER) ECDSA signature as produced by the signing primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerSignature(Vec<u8>);

impl DerSignature {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        DerSignature(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for DerSignature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Convert a DER signature into the 64-byte `r || s` form.
pub fn to_fixed_width(signature: &DerSignature) -> Result<SignatureBytes, EncodingError> {
    let der = signature.as_bytes();
    let mut pos = 0;

    if read_byte(der, &mut pos)? != TAG_SEQUENCE {
        return Err(EncodingError::MalformedDer("expected SEQUENCE"));
    }
    let seq_len = read_length(der, &mut pos)?;
    if der.len() - pos != seq_len {
        return Err(EncodingError::MalformedDer("SEQUENCE length mismatch"));
    }

    let r = read_integer(der, &mut pos, "r")?;
    let s = read_integer(der, &mut pos, "s")?;
    if pos != der.len() {
        return Err(EncodingError::MalformedDer("trailing bytes after s"));
    }

    let mut fixed = [0u8; 64];
    fixed[SCALAR_LEN - r.len()..SCALAR_LEN].copy_from_slice(r);
    fixed[2 * SCALAR_LEN - s.len()..].copy_from_slice(s);
    Ok(SignatureBytes(fixed))
}

/// Convert a 64-byte `r || s` signature back into minimal DER.
///
/// Fails with [`EncodingError::InvalidSignatureLength`] for any other length.
pub fn from_fixed_width(bytes: &[u8]) -> Result<DerSignature, EncodingError> {
    let fixed = SignatureBytes::from_slice(bytes)?;

    let mut body = Vec::with_capacity(2 * (SCALAR_LEN + 3));
    write_integer(fixed.r(), &mut body);
    write_integer(fixed.s(), &mut body);

    let mut der = Vec::with_capacity(body.len() + 2);
    der.push(TAG_SEQUENCE);
    write_length(body.len(), &mut der);
    der.extend_from_slice(&body);
    Ok(DerSignature(der))
}

fn read_byte(input: &[u8], pos: &mut usize) -> Result<u8, EncodingError> {
    let byte = *input
        .get(*pos)
        .ok_or(EncodingError::MalformedDer("unexpected end of input"))?;
    *pos += 1;
    Ok(byte)
}

fn read_length(input: &[u8], pos: &mut usize) -> Result<usize, EncodingError> {
    match read_byte(input, pos)? {
        short @ 0x00..=0x7f => Ok(short as usize),
        0x81 => {
            let len = read_byte(input, pos)?;
            if len < 0x80 {
                return Err(EncodingError::MalformedDer("non-minimal length"));
            }
            Ok(len as usize)
        }
        _ => Err(EncodingError::MalformedDer("unsupported length form")),
    }
}

/// Read one INTEGER and return its magnitude without leading zeros.
fn read_integer<'a>(
    input: &'a [u8],
    pos: &mut usize,
    component: &'static str,
) -> Result<&'a [u8], EncodingError> {
    if read_byte(input, pos)? != TAG_INTEGER {
        return Err(EncodingError::MalformedDer("expected INTEGER"));
    }
    let len = read_length(input, pos)?;
    if len == 0 {
        return Err(EncodingError::MalformedDer("empty INTEGER"));
    }
    let end = pos
        .checked_add(len)
        .filter(|end| *end <= input.len())
        .ok_or(EncodingError::MalformedDer("INTEGER overruns input"))?;
    let content = &input[*pos..end];
    *pos = end;

    if content[0] & 0x80 != 0 {
        return Err(EncodingError::MalformedDer("negative INTEGER"));
    }
    if len > 1 && content[0] == 0x00 && content[1] & 0x80 == 0 {
        return Err(EncodingError::MalformedDer("non-minimal INTEGER"));
    }

    let magnitude = strip_leading_zeros(content);
    if magnitude.len() > SCALAR_LEN {
        return Err(EncodingError::IntegerTooLarge {
            component,
            len: magnitude.len(),
        });
    }
    Ok(magnitude)
}

fn write_length(len: usize, out: &mut Vec<u8>) {
    // Two 33-byte integers never exceed the short form, but keep DER valid regardless.
    if len < 0x80 {
        out.push(len as u8);
    } else {
        out.push(0x81);
        out.push(len as u8);
    }
}

fn write_integer(value: &[u8], out: &mut Vec<u8>) {
    let magnitude = strip_leading_zeros(value);
    out.push(TAG_INTEGER);
    if magnitude.is_empty() {
        out.extend_from_slice(&[0x01, 0x00]);
        return;
    }
    let needs_pad = magnitude[0] & 0x80 != 0;
    write_length(magnitude.len() + usize::from(needs_pad), out);
    if needs_pad {
        out.push(0x00);
    }
    out.extend_from_slice(magnitude);
}

fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    &bytes[first..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn der(hex_str: &str) -> DerSignature {
        DerSignature::from_bytes(hex::decode(hex_str).unwrap())
    }

    fn scalar(last: &[u8]) -> [u8; 32] {
        let mut out = [0u8; 32];
        out[32 - last.len()..].copy_from_slice(last);
        out
    }

    #[test]
    fn test_small_integers_left_padded() {
        let fixed = to_fixed_width(&der("3006020101020102")).unwrap();
        assert_eq!(fixed.r(), scalar(&[1]));
        assert_eq!(fixed.s(), scalar(&[2]));
    }

    #[test]
    fn test_high_bit_integer_sign_byte_dropped() {
        // r = 2^255 + 5 is encoded with a 0x00 sign byte (33 bytes in DER).
        let sig = der("3026022100800000000000000000000000000000000000000000000000000000000000000502017f");
        let fixed = to_fixed_width(&sig).unwrap();
        let mut r = [0u8; 32];
        r[0] = 0x80;
        r[31] = 0x05;
        assert_eq!(fixed.r(), r);
        assert_eq!(fixed.s(), scalar(&[0x7f]));
        assert_eq!(from_fixed_width(&fixed.0).unwrap(), sig);
    }

    #[test]
    fn test_max_width_vectors_roundtrip() {
        let sig = der("3045022100ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff02200100000000000000000000000000000000000000000000000000000000000000");
        let fixed = to_fixed_width(&sig).unwrap();
        assert_eq!(fixed.r(), [0xff; 32]);
        assert_eq!(fixed.s()[0], 0x01);
        assert_eq!(from_fixed_width(&fixed.0).unwrap(), sig);
    }

    #[test]
    fn test_zero_integers() {
        let sig = der("3006020100020100");
        let fixed = to_fixed_width(&sig).unwrap();
        assert_eq!(fixed.0, [0u8; 64]);
        assert_eq!(from_fixed_width(&fixed.0).unwrap(), sig);
    }

    #[test]
    fn test_oversized_integer_rejected() {
        // r = 2^256 needs 33 bytes of magnitude.
        let mut bytes = vec![0x30, 0x26, 0x02, 0x21, 0x01];
        bytes.extend_from_slice(&[0u8; 32]);
        bytes.extend_from_slice(&[0x02, 0x01, 0x01]);
        let err = to_fixed_width(&DerSignature::from_bytes(bytes)).unwrap_err();
        assert!(matches!(
            err,
            EncodingError::IntegerTooLarge { component: "r", len: 33 }
        ));
    }

    #[test]
    fn test_malformed_der_rejected() {
        let cases = [
            "",                       // empty
            "3106020101020102",       // wrong outer tag
            "3007020101020102",       // sequence length mismatch
            "300602010102010200",     // trailing byte
            "3006030101020102",       // wrong integer tag
            "30050200020102",         // empty integer
            "30060201ff020102",       // negative integer
            "300702020001020102",     // non-minimal integer
            "3006020501020102",       // integer overruns
        ];
        for case in cases {
            let result = to_fixed_width(&der(case));
            assert!(
                matches!(result, Err(EncodingError::MalformedDer(_))),
                "expected MalformedDer for {case}, got {result:?}"
            );
        }
    }

    #[test]
    fn test_wrong_fixed_lengths_rejected() {
        for len in [63usize, 65, 0, 32] {
            let err = from_fixed_width(&vec![7u8; len]).unwrap_err();
            assert!(matches!(err, EncodingError::InvalidSignatureLength(l) if l == len));
        }
    }

    #[test]
    fn test_matches_p256_der_encoding() {
        use p256::ecdsa::{signature::Signer, Signature, SigningKey};
        use rand::rngs::OsRng;

        let key = SigningKey::random(&mut OsRng);
        for i in 0..16u8 {
            let sig: Signature = key.sign(&[i; 40]);
            let der_sig = DerSignature::from_bytes(sig.to_der().as_bytes().to_vec());

            let fixed = to_fixed_width(&der_sig).unwrap();
            assert_eq!(fixed.0.as_slice(), sig.to_bytes().as_slice());
            assert_eq!(from_fixed_width(&fixed.0).unwrap(), der_sig);
        }
    }

    proptest! {
        #[test]
        fn prop_fixed_der_fixed_inverse(bytes in proptest::collection::vec(any::<u8>(), 64)) {
            let der_sig = from_fixed_width(&bytes).unwrap();
            let fixed = to_fixed_width(&der_sig).unwrap();
            prop_assert_eq!(fixed.0.as_slice(), bytes.as_slice());
        }

        #[test]
        fn prop_der_fixed_der_inverse(r in proptest::collection::vec(any::<u8>(), 0..=32), s in proptest::collection::vec(any::<u8>(), 0..=32)) {
            let mut fixed = [0u8; 64];
            fixed[32 - r.len()..32].copy_from_slice(&r);
            fixed[64 - s.len()..].copy_from_slice(&s);
            let der_sig = from_fixed_width(&fixed).unwrap();
            let back = from_fixed_width(&to_fixed_width(&der_sig).unwrap().0).unwrap();
            prop_assert_eq!(back, der_sig);
        }
    }
}
