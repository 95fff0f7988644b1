//! # scitt CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use scitt_cli::pubkey::{run_pubkey, PubkeyArgs};
use scitt_cli::sign::{run_sign, SignArgs};
use scitt_cli::verify::{run_verify, VerifyArgs};

/// Sign attestations as SCITT statements, attach transparency receipts and
/// verify the resulting bundles.
#[derive(Parser, Debug)]
#[command(name = "scitt", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign an attestation and write statement, receipt and bundle.
    Sign(SignArgs),

    /// Verify a bundle's signature against an issuer public key.
    Verify(VerifyArgs),

    /// Print the public key PEM of an issuer private key.
    Pubkey(PubkeyArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG overrides the default level.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Sign(args) => run_sign(&args).await,
        Commands::Verify(args) => run_verify(&args),
        Commands::Pubkey(args) => run_pubkey(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
