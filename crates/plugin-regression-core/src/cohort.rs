//! Cohort naming.
//!
//! A cohort is the label that groups one variant's infrastructure and results
//! within a comparison. The two cohorts of a comparison are always distinct,
//! even when both variants carry the same label.

use serde::{Deserialize, Serialize};

/// Appended to the experiment label when it collides with the baseline label.
pub const DISAMBIGUATION_SUFFIX: &str = "*";

/// Display/grouping identifier of one variant within a comparison run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cohort(String);

impl Cohort {
    pub fn new(label: impl Into<String>) -> Self {
        Cohort(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Cohort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Derive the baseline and experiment cohorts from their variant labels.
///
/// Only one level of disambiguation is applied: labels that already differ
/// only by [`DISAMBIGUATION_SUFFIX`] are left alone.
pub fn name_cohorts(baseline_label: &str, experiment_label: &str) -> (Cohort, Cohort) {
    let baseline = Cohort::new(baseline_label);
    let experiment = if baseline_label == experiment_label {
        Cohort::new(format!("{experiment_label}{DISAMBIGUATION_SUFFIX}"))
    } else {
        Cohort::new(experiment_label)
    };
    (baseline, experiment)
}
