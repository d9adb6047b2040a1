//! In-memory fakes for performance test units (testing only)
//!
//! [`ScriptedTestFactory`] builds [`ScriptedPerformanceTest`]s whose delay
//! and outcome are scripted per cohort. All units built by one factory share
//! an [`ExecutionProbe`] that records how many ran at once, how many finished
//! and how many were cancelled mid-flight.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::cohort::Cohort;
use crate::domain::{LoadProfile, ProvisioningParameters, RawResult, Scenario};
use crate::error::{UnitError, UnitResult};
use crate::unit::{PerformanceTest, PerformanceTestFactory};
use crate::workspace::TestWorkspace;

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Verdict {
    Succeed(Option<serde_json::Value>),
    Provisioning(String),
    Installation(String),
    Execution(String),
}

/// What a scripted unit does: wait `delay`, then succeed or fail.
#[derive(Debug, Clone)]
pub struct Outcome {
    delay: Duration,
    verdict: Verdict,
}

impl Outcome {
    pub fn succeed(delay: Duration) -> Self {
        Self {
            delay,
            verdict: Verdict::Succeed(None),
        }
    }

    /// Succeed with an explicit metrics payload.
    pub fn succeed_with(delay: Duration, metrics: serde_json::Value) -> Self {
        Self {
            delay,
            verdict: Verdict::Succeed(Some(metrics)),
        }
    }

    pub fn fail_provisioning(delay: Duration, reason: &str) -> Self {
        Self {
            delay,
            verdict: Verdict::Provisioning(reason.to_string()),
        }
    }

    pub fn fail_installation(delay: Duration, reason: &str) -> Self {
        Self {
            delay,
            verdict: Verdict::Installation(reason.to_string()),
        }
    }

    pub fn fail_execution(delay: Duration, reason: &str) -> Self {
        Self {
            delay,
            verdict: Verdict::Execution(reason.to_string()),
        }
    }
}

impl Default for Outcome {
    fn default() -> Self {
        Outcome::succeed(Duration::ZERO)
    }
}

// ---------------------------------------------------------------------------
// ExecutionProbe
// ---------------------------------------------------------------------------

/// Shared counters describing how scripted units were executed.
#[derive(Debug, Default)]
pub struct ExecutionProbe {
    running: AtomicUsize,
    peak: AtomicUsize,
    started: AtomicUsize,
    completed: AtomicUsize,
    cancelled: AtomicUsize,
}

impl ExecutionProbe {
    /// Highest number of units observed running at the same time.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    /// Units that ran to the end of their script, successfully or not.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Units dropped before finishing their script.
    pub fn cancelled(&self) -> usize {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn enter(self: &Arc<Self>) -> RunningGuard {
        self.started.fetch_add(1, Ordering::SeqCst);
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        RunningGuard {
            probe: Arc::clone(self),
            finished: false,
        }
    }
}

struct RunningGuard {
    probe: Arc<ExecutionProbe>,
    finished: bool,
}

impl RunningGuard {
    fn finish(mut self) {
        self.finished = true;
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.probe.running.fetch_sub(1, Ordering::SeqCst);
        if self.finished {
            self.probe.completed.fetch_add(1, Ordering::SeqCst);
        } else {
            self.probe.cancelled.fetch_add(1, Ordering::SeqCst);
        }
    }
}

// ---------------------------------------------------------------------------
// ScriptedTestFactory / ScriptedPerformanceTest
// ---------------------------------------------------------------------------

/// Factory whose units follow a per-cohort script.
///
/// Cohorts without a script succeed immediately.
#[derive(Debug, Default)]
pub struct ScriptedTestFactory {
    scripts: HashMap<String, Outcome>,
    probe: Arc<ExecutionProbe>,
    built: Mutex<Vec<String>>,
}

impl ScriptedTestFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the unit built for `cohort`.
    pub fn script(mut self, cohort: &str, outcome: Outcome) -> Self {
        self.scripts.insert(cohort.to_string(), outcome);
        self
    }

    pub fn probe(&self) -> Arc<ExecutionProbe> {
        Arc::clone(&self.probe)
    }

    /// Cohorts passed to `build`, in call order.
    pub fn built_cohorts(&self) -> Vec<String> {
        self.built.lock().unwrap().clone()
    }
}

impl PerformanceTestFactory for ScriptedTestFactory {
    fn build(&self, cohort: Cohort, params: ProvisioningParameters) -> Box<dyn PerformanceTest> {
        self.built.lock().unwrap().push(cohort.to_string());
        let outcome = self
            .scripts
            .get(cohort.as_str())
            .cloned()
            .unwrap_or_default();
        Box::new(ScriptedPerformanceTest {
            cohort,
            params,
            outcome,
            probe: Arc::clone(&self.probe),
        })
    }
}

/// Unit that sleeps for its scripted delay and then reports its verdict.
#[derive(Debug)]
pub struct ScriptedPerformanceTest {
    cohort: Cohort,
    params: ProvisioningParameters,
    outcome: Outcome,
    probe: Arc<ExecutionProbe>,
}

#[async_trait]
impl PerformanceTest for ScriptedPerformanceTest {
    fn cohort(&self) -> &Cohort {
        &self.cohort
    }

    async fn run(
        &self,
        workspace: &TestWorkspace,
        load: &LoadProfile,
        scenario: &Scenario,
    ) -> UnitResult<RawResult> {
        let guard = self.probe.enter();
        tokio::time::sleep(self.outcome.delay).await;
        guard.finish();

        let metrics = match &self.outcome.verdict {
            Verdict::Succeed(Some(metrics)) => metrics.clone(),
            Verdict::Succeed(None) => serde_json::json!({
                "cohort": self.cohort.as_str(),
                "app": self.params.app.label(),
                "scenario": scenario.as_str(),
                "virtual_users": load.virtual_users,
            }),
            Verdict::Provisioning(reason) => return Err(UnitError::Provisioning(reason.clone())),
            Verdict::Installation(reason) => return Err(UnitError::Installation(reason.clone())),
            Verdict::Execution(reason) => return Err(UnitError::Execution(reason.clone())),
        };

        let results_dir = workspace.isolate_cohort(&self.cohort).await.map_err(|e| {
            UnitError::Provisioning(format!("cannot create results directory: {e}"))
        })?;

        Ok(RawResult {
            cohort: self.cohort.clone(),
            results_dir,
            metrics,
            duration_ms: self.outcome.delay.as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AppSource, Dataset, ResourceBudget};
    use std::path::PathBuf;

    fn params() -> ProvisioningParameters {
        ProvisioningParameters {
            target_version: "9.4.0".to_string(),
            dataset: Dataset::new("small", "home", "db"),
            app: AppSource::Empty,
            load_artifact: PathBuf::from("load.jar"),
            budget: ResourceBudget::for_feature("fake", Duration::from_secs(60)),
        }
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = TestWorkspace::at(dir.path()).unwrap();
        let factory = ScriptedTestFactory::new()
            .script("a", Outcome::fail_installation(Duration::ZERO, "bad jar"));

        let err = factory
            .build(Cohort::new("a"), params())
            .run(&workspace, &LoadProfile::default(), &Scenario::new("s"))
            .await
            .unwrap_err();

        assert!(matches!(err, UnitError::Installation(_)));
        assert_eq!(factory.probe().completed(), 1);
    }

    #[tokio::test]
    async fn test_unscripted_cohort_succeeds_with_default_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = TestWorkspace::at(dir.path()).unwrap();
        let factory = ScriptedTestFactory::new();

        let result = factory
            .build(Cohort::new("b"), params())
            .run(&workspace, &LoadProfile::default(), &Scenario::new("s"))
            .await
            .unwrap();

        assert_eq!(result.metrics["cohort"], "b");
        assert_eq!(result.metrics["app"], "no-app");
        assert_eq!(factory.built_cohorts(), vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn test_results_dir_is_the_isolated_cohort_directory() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = TestWorkspace::at(dir.path()).unwrap();
        let cohort = Cohort::new("7.2.0*");

        let result = ScriptedTestFactory::new()
            .build(cohort.clone(), params())
            .run(&workspace, &LoadProfile::default(), &Scenario::new("s"))
            .await
            .unwrap();

        assert_eq!(result.results_dir, workspace.cohort_directory(&cohort));
        assert!(result.results_dir.is_dir());
        assert_ne!(result.results_dir, dir.path().join("7.2.0*"));
    }

    #[tokio::test]
    async fn test_dropped_run_counts_as_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = TestWorkspace::at(dir.path()).unwrap();
        let factory =
            ScriptedTestFactory::new().script("slow", Outcome::succeed(Duration::from_secs(30)));
        let unit = factory.build(Cohort::new("slow"), params());

        let load = LoadProfile::default();
        let scenario = Scenario::new("s");
        let timed_out = tokio::time::timeout(
            Duration::from_millis(20),
            unit.run(&workspace, &load, &scenario),
        )
        .await;

        assert!(timed_out.is_err());
        let probe = factory.probe();
        assert_eq!(probe.started(), 1);
        assert_eq!(probe.cancelled(), 1);
        assert_eq!(probe.completed(), 0);
    }
}
