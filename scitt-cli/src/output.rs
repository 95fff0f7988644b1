//! Artifact persistence.

use anyhow::{Context, Result};
use scitt_core::{ArtifactPaths, Bundle};
use serde_json::Value;
use std::path::Path;

/// Write statement, receipt and bundle as two-space indented JSON.
///
/// Creates `out_dir` if needed. Existing files are overwritten.
pub fn write_artifacts(out_dir: &Path, basename: &str, bundle: &Bundle) -> Result<ArtifactPaths> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create output directory: {}", out_dir.display()))?;

    let paths = ArtifactPaths::new(out_dir, basename);

    let statement = serde_json::to_string_pretty(&bundle.statement)
        .context("failed to serialize statement")?;
    let receipt = serde_json::to_string_pretty(&bundle.receipt)
        .context("failed to serialize receipt")?;
    let bundle_json = bundle.to_pretty_json().context("failed to serialize bundle")?;

    write_file(&paths.statement, &statement)?;
    write_file(&paths.receipt, &receipt)?;
    write_file(&paths.bundle, &bundle_json)?;

    tracing::debug!(out_dir = %out_dir.display(), basename, "Wrote artifacts");
    Ok(paths)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents)
        .with_context(|| format!("failed to write {}", path.display()))
}

/// Parse an attestation document.
pub fn parse_attestation(text: &str, path: &Path) -> Result<Value> {
    serde_json::from_str(text)
        .with_context(|| format!("attestation is not valid JSON: {}", path.display()))
}
