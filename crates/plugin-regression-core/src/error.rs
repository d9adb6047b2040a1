//! Error taxonomy for the regression harness.

use crate::cohort::Cohort;

/// Failures raised by a performance test unit while provisioning,
/// installing or executing.
///
/// The runner never inspects the variant; it only cares that the unit failed.
#[derive(Debug, thiserror::Error)]
pub enum UnitError {
    #[error("provisioning failed: {0}")]
    Provisioning(String),

    #[error("installation failed: {0}")]
    Installation(String),

    #[error("execution failed: {0}")]
    Execution(String),
}

/// Result type for performance test units.
pub type UnitResult<T> = std::result::Result<T, UnitError>;

/// Errors produced by the harness layer.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("cohort {cohort}: {source}")]
    Unit {
        cohort: Cohort,
        #[source]
        source: UnitError,
    },

    #[error("cohort {cohort}: could not join pending result: {reason}")]
    Join { cohort: Cohort, reason: String },

    #[error("invalid harness configuration: {0}")]
    Config(String),

    #[error("workspace error: {0}")]
    Workspace(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl HarnessError {
    /// The cohort whose unit caused this error, if any.
    pub fn cohort(&self) -> Option<&Cohort> {
        match self {
            HarnessError::Unit { cohort, .. } | HarnessError::Join { cohort, .. } => Some(cohort),
            _ => None,
        }
    }
}

/// Result type for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_error_display_keeps_collaborator_detail() {
        let err = HarnessError::Unit {
            cohort: Cohort::new("7.2.0*"),
            source: UnitError::Installation("plugin rejected by host".to_string()),
        };
        let msg = err.to_string();
        assert!(msg.contains("7.2.0*"));
        assert!(msg.contains("installation failed"));
        assert!(msg.contains("plugin rejected by host"));
    }

    #[test]
    fn test_cohort_accessor() {
        let err = HarnessError::Join {
            cohort: Cohort::new("baseline"),
            reason: "task cancelled".to_string(),
        };
        assert_eq!(err.cohort().map(Cohort::as_str), Some("baseline"));

        let err = HarnessError::Config("lifespan must be positive".to_string());
        assert!(err.cohort().is_none());
    }
}
