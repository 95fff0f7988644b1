//! # Verify Subcommand
//!
//! Checks the statement inside a persisted bundle against an issuer public
//! key. The receipt is not checked.

use anyhow::{bail, Context, Result};
use clap::Args;
use scitt_core::{Bundle, Es256Verifier, StatementVerifier};
use std::path::{Path, PathBuf};

/// Arguments for `scitt verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Bundle JSON written by `scitt sign`.
    #[arg(value_name = "BUNDLE")]
    pub bundle: PathBuf,

    /// Issuer public key (SubjectPublicKeyInfo PEM, P-256).
    #[arg(value_name = "PUBLIC_KEY")]
    pub public_key: PathBuf,
}

/// Verify a bundle file and return the payload SHA-256 hex on success.
pub fn verify_bundle_file(bundle_path: &Path, public_key_path: &Path) -> Result<String> {
    let bundle = Bundle::from_json(&crate::read_text(bundle_path, "bundle")?)
        .with_context(|| format!("invalid bundle: {}", bundle_path.display()))?;

    let pem = crate::read_text(public_key_path, "public key")?;
    let verifier = StatementVerifier::new(
        Es256Verifier::from_pem(&pem)
            .with_context(|| format!("unusable public key: {}", public_key_path.display()))?,
    );

    if !verifier.verify_bundle(&bundle)? {
        bail!("signature verification failed");
    }

    Ok(bundle.statement.payload_digest()?)
}

/// Execute the verify subcommand.
pub fn run_verify(args: &VerifyArgs) -> Result<u8> {
    let digest = verify_bundle_file(&args.bundle, &args.public_key)?;
    println!("OK: signature valid; payload sha256 = {digest}");
    Ok(0)
}
