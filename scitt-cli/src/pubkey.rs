//! # Pubkey Subcommand
//!
//! Derives the SubjectPublicKeyInfo PEM for an issuer private key, for
//! distribution to verifiers.

use anyhow::{Context, Result};
use clap::Args;
use scitt_core::Es256Signer;
use std::path::{Path, PathBuf};

/// Arguments for `scitt pubkey`.
#[derive(Args, Debug)]
pub struct PubkeyArgs {
    /// Issuer private key (PKCS#8 or SEC1 PEM, P-256).
    #[arg(long)]
    pub issuer_key: PathBuf,
}

/// Public key PEM for the private key at `path`.
pub fn public_key_pem(path: &Path) -> Result<String> {
    let pem = crate::read_text(path, "issuer key")?;
    let signer = Es256Signer::from_pem(&pem)
        .with_context(|| format!("unusable issuer key: {}", path.display()))?;
    Ok(signer.public_key_pem()?)
}

/// Execute the pubkey subcommand.
pub fn run_pubkey(args: &PubkeyArgs) -> Result<u8> {
    let pem = public_key_pem(&args.issuer_key)?;
    print!("{pem}");
    Ok(0)
}
