//! # scitt-cli
//!
//! The `scitt` command-line tool.
//!
//! ## Subcommands
//!
//! - `scitt sign`: canonicalize, sign, obtain a receipt and write artifacts.
//! - `scitt verify`: verify a persisted bundle against a public key.
//! - `scitt pubkey`: print the public key of an issuer private key.
//!
//! ```bash
//! scitt sign --attestation att.json --issuer-key issuer.pem \
//!     --issuer-kid did:example:issuer#keys-1 --out ./out
//! scitt verify out/att-1.bundle.json issuer.pub.pem
//! ```

pub mod output;
pub mod pubkey;
pub mod sign;
pub mod verify;

use anyhow::{Context, Result};
use std::path::Path;

/// Read a UTF-8 file, naming it in the error.
pub fn read_text(path: &Path, what: &str) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {what}: {}", path.display()))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_text_missing_file_names_path() {
        let err = read_text(Path::new("/nonexistent/key.pem"), "issuer key").unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("issuer key"));
        assert!(message.contains("/nonexistent/key.pem"));
    }
}
