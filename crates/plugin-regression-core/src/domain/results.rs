//! Raw and joined results of a comparison.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::cohort::Cohort;

/// Unprocessed outcome of one performance test unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawResult {
    pub cohort: Cohort,
    /// Directory holding whatever the unit collected.
    pub results_dir: PathBuf,
    /// Opaque metrics payload produced by the load collaborator.
    pub metrics: serde_json::Value,
    pub duration_ms: u64,
}

/// Paired outcome of a completed comparison.
///
/// Only ever built once both units succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionResults {
    pub baseline: RawResult,
    pub experiment: RawResult,
}

impl RegressionResults {
    pub fn new(baseline: RawResult, experiment: RawResult) -> Self {
        Self {
            baseline,
            experiment,
        }
    }

    /// The cohorts in baseline-then-experiment order.
    pub fn cohorts(&self) -> (&Cohort, &Cohort) {
        (&self.baseline.cohort, &self.experiment.cohort)
    }
}
