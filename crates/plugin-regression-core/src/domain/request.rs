//! Comparison request identity.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::app::Variant;
use super::load::{Dataset, LoadProfile, Scenario};

/// The full set of inputs of one comparison.
///
/// Two requests with the same inputs share a digest, which links workspaces
/// and log lines of repeated runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRequest {
    pub feature: String,
    pub scenario: Scenario,
    pub target_version: String,
    pub dataset: Dataset,
    pub baseline: Variant,
    pub experiment: Variant,
    pub load: LoadProfile,
    pub load_artifact: PathBuf,
}

impl ComparisonRequest {
    /// SHA-256 hex digest of the canonical JSON encoding.
    pub fn digest(&self) -> crate::Result<String> {
        let bytes = serde_json::to_vec(self)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(hex::encode(hasher.finalize()))
    }
}
