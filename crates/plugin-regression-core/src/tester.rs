//! Harness entry point.
//!
//! [`PluginTester`] is what callers invoke: it isolates a fresh workspace for
//! the comparison, records what is being compared, and hands over to the
//! [`RegressionRunner`]. Results and failures come back unchanged.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, Instrument};

use crate::config::HarnessConfig;
use crate::domain::{ComparisonRequest, Dataset, LoadProfile, RegressionResults, Scenario, Variant};
use crate::error::Result;
use crate::obs;
use crate::runner::RegressionRunner;
use crate::unit::PerformanceTestFactory;
use crate::workspace::{RootWorkspace, TestWorkspace};

#[derive(Serialize)]
struct Manifest<'a> {
    digest: &'a str,
    started_at: DateTime<Utc>,
    request: &'a ComparisonRequest,
}

/// Compares a baseline and an experiment build of an extension on one dataset.
pub struct PluginTester {
    root: RootWorkspace,
    dataset: Dataset,
    runner: RegressionRunner,
}

impl PluginTester {
    pub fn new(
        factory: Arc<dyn PerformanceTestFactory>,
        dataset: Dataset,
        config: HarnessConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            root: RootWorkspace::new(&config.output_dir),
            dataset,
            runner: RegressionRunner::new(factory, config),
        })
    }

    pub fn config(&self) -> &HarnessConfig {
        self.runner.config()
    }

    /// Run `scenario` under `load` against both variants on `target_version`.
    pub async fn run(
        &self,
        load_artifact: &Path,
        scenario: &Scenario,
        baseline: Variant,
        experiment: Variant,
        load: LoadProfile,
        target_version: &str,
    ) -> Result<RegressionResults> {
        let request = ComparisonRequest {
            feature: self.config().feature_label.clone(),
            scenario: scenario.clone(),
            target_version: target_version.to_string(),
            dataset: self.dataset.clone(),
            baseline,
            experiment,
            load,
            load_artifact: load_artifact.to_path_buf(),
        };
        self.run_request(&request).await
    }

    /// Run a fully specified comparison in a fresh workspace.
    pub async fn run_request(&self, request: &ComparisonRequest) -> Result<RegressionResults> {
        let digest = request.digest()?;
        let span = obs::comparison_span(&digest, &request.feature);

        let workspace = self.isolate(request, &digest)?;
        span.in_scope(|| info!(workspace = %workspace.directory().display(), "Workspace isolated"));

        self.runner.run(request, &workspace).instrument(span).await
    }

    fn isolate(&self, request: &ComparisonRequest, digest: &str) -> Result<TestWorkspace> {
        let workspace = self
            .root
            .current_task()?
            .isolate_test(&request.feature)?;
        workspace.write_manifest(&Manifest {
            digest,
            started_at: Utc::now(),
            request,
        })?;
        Ok(workspace)
    }
}
