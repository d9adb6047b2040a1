//! Harness configuration.
//!
//! Values come from code defaults, optionally overridden by
//! `PLUGIN_REGRESSION_*` environment variables via [`HarnessConfig::from_env`].

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::DEFAULT_LIFESPAN;
use crate::error::{HarnessError, Result};

pub const ENV_OUTPUT_DIR: &str = "PLUGIN_REGRESSION_OUTPUT_DIR";
pub const ENV_LABEL: &str = "PLUGIN_REGRESSION_LABEL";
pub const ENV_LIFESPAN_SECS: &str = "PLUGIN_REGRESSION_LIFESPAN_SECS";
pub const ENV_RESOLUTION: &str = "PLUGIN_REGRESSION_RESOLUTION";

/// Order in which the two pending results are resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionOrder {
    /// Await baseline, then experiment. A baseline failure always wins,
    /// even when the experiment failed earlier.
    #[default]
    BaselineFirst,

    /// Surface whichever failure happens first in wall-clock time.
    FirstInTime,
}

impl FromStr for ResolutionOrder {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "baseline-first" => Ok(ResolutionOrder::BaselineFirst),
            "first-in-time" => Ok(ResolutionOrder::FirstInTime),
            other => Err(HarnessError::Config(format!(
                "unknown resolution order '{other}' (expected baseline-first or first-in-time)"
            ))),
        }
    }
}

impl std::fmt::Display for ResolutionOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionOrder::BaselineFirst => write!(f, "baseline-first"),
            ResolutionOrder::FirstInTime => write!(f, "first-in-time"),
        }
    }
}

/// Configuration shared by every comparison run by one tester.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Root directory under which task workspaces are created.
    pub output_dir: PathBuf,
    /// Names the test workspace and the resource use case.
    pub feature_label: String,
    /// Lifetime budget of each cohort's resources.
    #[serde(with = "crate::domain::load::duration_secs")]
    pub lifespan: Duration,
    /// Prefix of the worker pool's span names.
    pub pool_name: String,
    pub resolution: ResolutionOrder,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("target/plugin-regression"),
            feature_label: "Plugin Test".to_string(),
            lifespan: DEFAULT_LIFESPAN,
            pool_name: "regression-test".to_string(),
            resolution: ResolutionOrder::default(),
        }
    }
}

impl HarnessConfig {
    /// Defaults overridden by any `PLUGIN_REGRESSION_*` variables present.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var(ENV_OUTPUT_DIR) {
            config.output_dir = PathBuf::from(dir);
        }
        if let Ok(label) = std::env::var(ENV_LABEL) {
            config.feature_label = label;
        }
        if let Ok(secs) = std::env::var(ENV_LIFESPAN_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                HarnessError::Config(format!("{ENV_LIFESPAN_SECS} must be a number of seconds"))
            })?;
            config.lifespan = Duration::from_secs(secs);
        }
        if let Ok(order) = std::env::var(ENV_RESOLUTION) {
            config.resolution = order.parse()?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_feature_label(mut self, label: &str) -> Self {
        self.feature_label = label.to_string();
        self
    }

    pub fn with_lifespan(mut self, lifespan: Duration) -> Self {
        self.lifespan = lifespan;
        self
    }

    pub fn with_pool_name(mut self, name: &str) -> Self {
        self.pool_name = name.to_string();
        self
    }

    pub fn with_resolution(mut self, resolution: ResolutionOrder) -> Self {
        self.resolution = resolution;
        self
    }

    /// Reject configurations no comparison could run with.
    pub fn validate(&self) -> Result<()> {
        if self.lifespan.is_zero() {
            return Err(HarnessError::Config("lifespan must be positive".to_string()));
        }
        if self.feature_label.trim().is_empty() {
            return Err(HarnessError::Config(
                "feature label must not be empty".to_string(),
            ));
        }
        if self.pool_name.trim().is_empty() {
            return Err(HarnessError::Config("pool name must not be empty".to_string()));
        }
        Ok(())
    }
}
