//! Dual-cohort regression runner.
//!
//! Builds one performance test per variant, runs both on a worker pool with
//! exactly two slots, and joins their raw results. Either both cohorts
//! succeed and a [`RegressionResults`] comes back, or the first failure (in
//! the configured [`ResolutionOrder`]) is returned and the other cohort is
//! cancelled when the pool is released.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, instrument};

use crate::cohort::{name_cohorts, Cohort};
use crate::config::{HarnessConfig, ResolutionOrder};
use crate::domain::{
    AppSource, ComparisonRequest, LoadProfile, ProvisioningParameters, RawResult,
    RegressionResults, ResourceBudget, Scenario,
};
use crate::error::{HarnessError, Result};
use crate::metrics::METRICS;
use crate::obs;
use crate::pool::{PendingResult, WorkerPool};
use crate::unit::{PerformanceTest, PerformanceTestFactory};
use crate::workspace::TestWorkspace;

/// Number of cohorts in a comparison, and therefore the pool size.
pub const COHORT_COUNT: usize = 2;

type PendingRun = PendingResult<Result<RawResult>>;

/// Runs comparisons with units built by one factory.
#[derive(Clone)]
pub struct RegressionRunner {
    factory: Arc<dyn PerformanceTestFactory>,
    config: HarnessConfig,
}

impl RegressionRunner {
    pub fn new(factory: Arc<dyn PerformanceTestFactory>, config: HarnessConfig) -> Self {
        Self { factory, config }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Provisioning parameters for one side of `request`.
    ///
    /// Both sides get identical parameters apart from `app`.
    pub fn provisioning(&self, request: &ComparisonRequest, app: &AppSource) -> ProvisioningParameters {
        ProvisioningParameters {
            target_version: request.target_version.clone(),
            dataset: request.dataset.clone(),
            app: app.clone(),
            load_artifact: request.load_artifact.clone(),
            budget: ResourceBudget::for_feature(&request.feature, self.config.lifespan),
        }
    }

    /// Run one comparison inside `workspace`.
    #[instrument(skip_all, fields(scenario = %request.scenario, resolution = %self.config.resolution))]
    pub async fn run(
        &self,
        request: &ComparisonRequest,
        workspace: &TestWorkspace,
    ) -> Result<RegressionResults> {
        let start = Instant::now();

        let (baseline_cohort, experiment_cohort) =
            name_cohorts(request.baseline.label(), request.experiment.label());

        let baseline_test = self.factory.build(
            baseline_cohort.clone(),
            self.provisioning(request, request.baseline.source()),
        );
        let experiment_test = self.factory.build(
            experiment_cohort.clone(),
            self.provisioning(request, request.experiment.source()),
        );

        obs::emit_comparison_started(
            baseline_cohort.as_str(),
            experiment_cohort.as_str(),
            request.scenario.as_str(),
        );

        let mut pool = WorkerPool::new(self.config.pool_name.clone(), COHORT_COUNT);

        let mut baseline = pool.submit(
            baseline_cohort.as_str(),
            run_unit(baseline_test, workspace.clone(), request.load.clone(), request.scenario.clone()),
        );
        obs::emit_unit_submitted(baseline_cohort.as_str(), "baseline");

        let mut experiment = pool.submit(
            experiment_cohort.as_str(),
            run_unit(experiment_test, workspace.clone(), request.load.clone(), request.scenario.clone()),
        );
        obs::emit_unit_submitted(experiment_cohort.as_str(), "experiment");

        let joined = match self.config.resolution {
            ResolutionOrder::BaselineFirst => {
                join_in_order(&mut baseline, &baseline_cohort, &mut experiment, &experiment_cohort)
                    .await
            }
            ResolutionOrder::FirstInTime => {
                join_first_in_time(&mut baseline, &baseline_cohort, &mut experiment, &experiment_cohort)
                    .await
            }
        };

        if let Some(aborted) = pool.release() {
            METRICS.add_units_cancelled(aborted as u64);
        }

        match joined {
            Ok((baseline, experiment)) => {
                let duration_ms = start.elapsed().as_millis() as u64;
                METRICS.inc_comparisons_completed();
                obs::emit_comparison_finished(duration_ms);
                Ok(RegressionResults::new(baseline, experiment))
            }
            Err(e) => {
                METRICS.inc_comparisons_failed();
                obs::emit_comparison_failed(e.cohort().map(Cohort::as_str), &e);
                Err(e)
            }
        }
    }
}

/// Body of one pool submission.
async fn run_unit(
    test: Box<dyn PerformanceTest>,
    workspace: TestWorkspace,
    load: LoadProfile,
    scenario: Scenario,
) -> Result<RawResult> {
    let cohort = test.cohort().clone();
    let start = Instant::now();
    METRICS.inc_units_started();

    let outcome = test.run(&workspace, &load, &scenario).await;

    let duration_ms = start.elapsed().as_millis() as u64;
    obs::emit_unit_finished(cohort.as_str(), duration_ms, outcome.is_ok());
    outcome.map_err(|source| {
        METRICS.inc_units_failed();
        HarnessError::Unit { cohort, source }
    })
}

async fn resolve(pending: &mut PendingRun, cohort: &Cohort) -> Result<RawResult> {
    let outcome = pending.wait().await.map_err(|e| HarnessError::Join {
        cohort: cohort.clone(),
        reason: e.to_string(),
    })?;
    debug!(cohort = %cohort, ok = outcome.is_ok(), "pending result resolved");
    outcome
}

/// Baseline first, then experiment, regardless of which finishes first.
async fn join_in_order(
    baseline: &mut PendingRun,
    baseline_cohort: &Cohort,
    experiment: &mut PendingRun,
    experiment_cohort: &Cohort,
) -> Result<(RawResult, RawResult)> {
    let baseline = resolve(baseline, baseline_cohort).await?;
    let experiment = resolve(experiment, experiment_cohort).await?;
    Ok((baseline, experiment))
}

/// Whichever finishes first is inspected first; ties go to the baseline.
async fn join_first_in_time(
    baseline: &mut PendingRun,
    baseline_cohort: &Cohort,
    experiment: &mut PendingRun,
    experiment_cohort: &Cohort,
) -> Result<(RawResult, RawResult)> {
    tokio::select! {
        biased;
        first = resolve(&mut *baseline, baseline_cohort) => {
            let baseline = first?;
            let experiment = resolve(experiment, experiment_cohort).await?;
            Ok((baseline, experiment))
        }
        first = resolve(&mut *experiment, experiment_cohort) => {
            let experiment = first?;
            let baseline = resolve(baseline, baseline_cohort).await?;
            Ok((baseline, experiment))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Dataset, Variant};
    use crate::fakes::{Outcome, ScriptedTestFactory};
    use std::path::PathBuf;
    use std::time::Duration;

    fn request(baseline: Variant, experiment: Variant) -> ComparisonRequest {
        ComparisonRequest {
            feature: "Plugin Test".to_string(),
            scenario: Scenario::new("browse-boards"),
            target_version: "9.4.0".to_string(),
            dataset: Dataset::new("small", "home.zip", "db.zip"),
            baseline,
            experiment,
            load: LoadProfile::default(),
            load_artifact: PathBuf::from("load.jar"),
        }
    }

    #[test]
    fn test_provisioning_differs_only_by_app() {
        let factory = Arc::new(ScriptedTestFactory::new());
        let runner = RegressionRunner::new(factory, HarnessConfig::default());
        let req = request(
            Variant::new(AppSource::Empty),
            Variant::new(AppSource::maven("g", "a", "1.0")),
        );

        let b = runner.provisioning(&req, req.baseline.source());
        let e = runner.provisioning(&req, req.experiment.source());

        assert_ne!(b.app, e.app);
        assert_eq!(b.target_version, e.target_version);
        assert_eq!(b.dataset, e.dataset);
        assert_eq!(b.load_artifact, e.load_artifact);
        assert_eq!(b.budget, e.budget);
        assert_eq!(b.budget.lifespan, Duration::from_secs(3600));
        assert_eq!(b.budget.use_case, "Catch regressions in Plugin Test");
    }

    #[tokio::test]
    async fn test_same_labels_produce_distinct_cohorts() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = TestWorkspace::at(dir.path()).unwrap();
        let factory = Arc::new(ScriptedTestFactory::new());
        let runner = RegressionRunner::new(factory.clone(), HarnessConfig::default());

        let source = AppSource::maven("com.example", "plugin", "7.2.0");
        let results = runner
            .run(
                &request(Variant::new(source.clone()), Variant::new(source)),
                &workspace,
            )
            .await
            .unwrap();

        assert_eq!(results.baseline.cohort.as_str(), "7.2.0");
        assert_eq!(results.experiment.cohort.as_str(), "7.2.0*");
        assert_eq!(factory.built_cohorts(), vec!["7.2.0".to_string(), "7.2.0*".to_string()]);
    }

    #[tokio::test]
    async fn test_baseline_failure_voids_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = TestWorkspace::at(dir.path()).unwrap();
        let factory = Arc::new(
            ScriptedTestFactory::new()
                .script("no-app", Outcome::fail_execution(Duration::ZERO, "vu crashed"))
                .script("1.0", Outcome::succeed(Duration::from_millis(10))),
        );
        let runner = RegressionRunner::new(factory, HarnessConfig::default());

        let err = runner
            .run(
                &request(
                    Variant::new(AppSource::Empty),
                    Variant::new(AppSource::maven("g", "a", "1.0")),
                ),
                &workspace,
            )
            .await
            .unwrap_err();

        assert_eq!(err.cohort().map(Cohort::as_str), Some("no-app"));
        assert!(err.to_string().contains("vu crashed"));
    }
}
