//! Bundle: statement + receipt + cross-reference links, persisted as one unit.

use crate::error::{EncodingError, VerificationError};
use crate::receipt::Receipt;
use crate::statement::SignedStatement;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Link to the canon entry the attestation cites.
pub const LINK_CANON: &str = "canon";
/// Link to CAP evidence.
pub const LINK_CAP: &str = "cap";
/// Link to the DBoM attestation document.
pub const LINK_DBOM: &str = "dbom";

/// Basename used when the attestation has no `id`.
pub const DEFAULT_BASENAME: &str = "att";

/// Named cross-references carried in a bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BundleLinks(BTreeMap<String, String>);

impl BundleLinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The `canon`/`cap`/`dbom` triple; all three keys are always present.
    pub fn standard(
        canon: impl Into<String>,
        cap: impl Into<String>,
        dbom: impl Into<String>,
    ) -> Self {
        let mut links = Self::new();
        links.insert(LINK_CANON, canon);
        links.insert(LINK_CAP, cap);
        links.insert(LINK_DBOM, dbom);
        links
    }

    pub fn insert(&mut self, name: impl Into<String>, target: impl Into<String>) {
        self.0.insert(name.into(), target.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The persisted/transmitted artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    pub statement: SignedStatement,
    pub receipt: Receipt,
    pub links: BundleLinks,
}

impl Bundle {
    /// Two-space indented JSON.
    pub fn to_pretty_json(&self) -> Result<String, EncodingError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a persisted bundle.
    pub fn from_json(json: &str) -> Result<Self, VerificationError> {
        serde_json::from_str(json).map_err(|e| VerificationError::MalformedBundle(e.to_string()))
    }
}

/// Combine the parts into a bundle. No validation beyond structure.
pub fn assemble(statement: SignedStatement, receipt: Receipt, links: BundleLinks) -> Bundle {
    Bundle {
        statement,
        receipt,
        links,
    }
}

/// File basename for an attestation's artifacts, with `/` replaced by `_`.
pub fn artifact_basename(attestation: &Value) -> String {
    let id = match attestation.get("id") {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Null) | None => DEFAULT_BASENAME.to_string(),
        Some(other) => other.to_string(),
    };
    id.replace('/', "_")
}

/// Output paths for one attestation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub statement: PathBuf,
    pub receipt: PathBuf,
    pub bundle: PathBuf,
}

impl ArtifactPaths {
    pub fn new(out_dir: &Path, basename: &str) -> Self {
        Self {
            statement: out_dir.join(format!("{basename}.statement.jws.json")),
            receipt: out_dir.join(format!("{basename}.receipt.json")),
            bundle: out_dir.join(format!("{basename}.bundle.json")),
        }
    }
}
