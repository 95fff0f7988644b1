//! # Sign Subcommand
//!
//! Canonicalizes an attestation, signs it with the issuer key, obtains a
//! receipt and writes the statement, receipt and bundle to the output
//! directory.
//!
//! With `--log-url` (or `SCITT_LOG_URL`) the statement is registered with a
//! transparency log; a failed submission aborts the command. Without it the
//! receipt is synthesized offline.

use anyhow::{Context, Result};
use clap::Args;
use scitt_core::{
    artifact_basename, assemble, ArtifactPaths, BundleLinks, Es256Signer, ReceiptProvider,
    StatementBuilder,
};
use scitt_log::{HttpTransparencyLog, LogConfig, DEFAULT_TIMEOUT_SECS};
use std::path::PathBuf;
use std::sync::Arc;

use crate::output::{parse_attestation, write_artifacts};

/// Arguments for `scitt sign`.
#[derive(Args, Debug, Clone)]
pub struct SignArgs {
    /// Attestation JSON document.
    #[arg(long)]
    pub attestation: PathBuf,

    /// Issuer private key (PKCS#8 or SEC1 PEM, P-256).
    #[arg(long)]
    pub issuer_key: PathBuf,

    /// Key identifier placed in the protected header.
    #[arg(long)]
    pub issuer_kid: String,

    /// Transparency log base URL. Offline receipt when unset.
    #[arg(long, env = "SCITT_LOG_URL")]
    pub log_url: Option<String>,

    /// Transparency log request timeout in seconds.
    #[arg(long, env = "SCITT_LOG_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub log_timeout_secs: u64,

    /// Canon entry link.
    #[arg(long, default_value = "")]
    pub canon_link: String,

    /// CAP evidence link.
    #[arg(long, default_value = "")]
    pub cap_link: String,

    /// DBoM document link.
    #[arg(long, default_value = "")]
    pub dbom_link: String,

    /// Output directory.
    #[arg(long, default_value = "./out")]
    pub out: PathBuf,
}

impl SignArgs {
    fn receipt_provider(&self) -> Result<ReceiptProvider> {
        match self.log_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => {
                let config = LogConfig::new(url)?.with_timeout_secs(self.log_timeout_secs);
                let log = HttpTransparencyLog::new(config)?;
                Ok(ReceiptProvider::online(Arc::new(log)))
            }
            _ => Ok(ReceiptProvider::offline()),
        }
    }
}

/// Sign the attestation and write all artifacts.
pub async fn sign_attestation(args: &SignArgs) -> Result<ArtifactPaths> {
    let text = crate::read_text(&args.attestation, "attestation")?;
    let attestation = parse_attestation(&text, &args.attestation)?;

    let key_pem = crate::read_text(&args.issuer_key, "issuer key")?;
    let signer = Es256Signer::from_pem(&key_pem)
        .with_context(|| format!("unusable issuer key: {}", args.issuer_key.display()))?;

    let statement = StatementBuilder::new(signer, args.issuer_kid.as_str())
        .build(&attestation)
        .context("failed to build signed statement")?;

    let provider = args.receipt_provider()?;
    let receipt = provider
        .obtain(&statement)
        .await
        .context("failed to obtain receipt")?;

    let links = BundleLinks::standard(&args.canon_link, &args.cap_link, &args.dbom_link);
    let bundle = assemble(statement, receipt, links);

    let basename = artifact_basename(&attestation);
    tracing::info!(basename = %basename, online = provider.is_online(), "Signed attestation");
    write_artifacts(&args.out, &basename, &bundle)
}

/// Execute the sign subcommand.
pub async fn run_sign(args: &SignArgs) -> Result<u8> {
    let paths = sign_attestation(args).await?;
    println!("{}", paths.statement.display());
    println!("{}", paths.receipt.display());
    println!("{}", paths.bundle.display());
    Ok(0)
}
