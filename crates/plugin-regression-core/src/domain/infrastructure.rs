//! Provisioning parameters consumed by performance test units.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::app::AppSource;
use super::load::{duration_secs, Dataset};

/// Default lifetime of the resources provisioned for one cohort.
pub const DEFAULT_LIFESPAN: Duration = Duration::from_secs(60 * 60);

/// How long provisioned resources may live, and why they exist.
///
/// Units tear their resources down once the lifespan is spent; the harness
/// never extends it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceBudget {
    pub use_case: String,
    #[serde(with = "duration_secs")]
    pub lifespan: Duration,
}

impl ResourceBudget {
    /// Budget for catching regressions in `feature`.
    pub fn for_feature(feature: &str, lifespan: Duration) -> Self {
        Self {
            use_case: format!("Catch regressions in {feature}"),
            lifespan,
        }
    }
}

/// Everything a unit needs to stand up one cohort's environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvisioningParameters {
    /// Version of the host application to install.
    pub target_version: String,
    pub dataset: Dataset,
    /// The only part that differs between the two cohorts.
    pub app: AppSource,
    /// Build artifact that drives the virtual users.
    pub load_artifact: PathBuf,
    pub budget: ResourceBudget,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_for_feature() {
        let budget = ResourceBudget::for_feature("Plugin Test", DEFAULT_LIFESPAN);
        assert_eq!(budget.use_case, "Catch regressions in Plugin Test");
        assert_eq!(budget.lifespan, Duration::from_secs(3600));
    }
}
