//! Local command backed performance test.
//!
//! Runs a user supplied load driver once per cohort, inside the cohort's own
//! results directory, with the provisioning parameters exported as
//! `PLUGIN_REGRESSION_*` environment variables. Whatever the driver prints on
//! stdout becomes the cohort's metrics: parsed as JSON when possible, kept as
//! a plain string otherwise.

use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use super::{PerformanceTest, PerformanceTestFactory};
use crate::cohort::Cohort;
use crate::domain::{LoadProfile, ProvisioningParameters, RawResult, Scenario};
use crate::error::{UnitError, UnitResult};
use crate::workspace::TestWorkspace;

const STDOUT_LOG: &str = "stdout.log";
const STDERR_LOG: &str = "stderr.log";

/// Factory for [`CommandPerformanceTest`]s sharing one driver command.
#[derive(Debug, Clone)]
pub struct CommandTestFactory {
    command: Vec<String>,
}

impl CommandTestFactory {
    /// `command[0]` is the executable, the rest are its arguments.
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

impl PerformanceTestFactory for CommandTestFactory {
    fn build(&self, cohort: Cohort, params: ProvisioningParameters) -> Box<dyn PerformanceTest> {
        Box::new(CommandPerformanceTest {
            cohort,
            params,
            command: self.command.clone(),
        })
    }
}

/// One cohort driven by a local command.
#[derive(Debug, Clone)]
pub struct CommandPerformanceTest {
    cohort: Cohort,
    params: ProvisioningParameters,
    command: Vec<String>,
}

impl CommandPerformanceTest {
    /// Environment handed to the driver.
    pub fn environment(&self, load: &LoadProfile, scenario: &Scenario) -> Vec<(String, String)> {
        let p = &self.params;
        let mut env = vec![
            ("COHORT", self.cohort.to_string()),
            ("TARGET_VERSION", p.target_version.clone()),
            ("DATASET", p.dataset.name.clone()),
            ("DATASET_HOME", p.dataset.home_location.clone()),
            ("DATASET_DATABASE", p.dataset.database_location.clone()),
            ("APP_SOURCE", p.app.to_string()),
            ("APP_LABEL", p.app.label()),
            ("LOAD_ARTIFACT", p.load_artifact.to_string_lossy().into_owned()),
            ("USE_CASE", p.budget.use_case.clone()),
            ("LIFESPAN_SECS", p.budget.lifespan.as_secs().to_string()),
            ("SCENARIO", scenario.to_string()),
            ("VIRTUAL_USERS", load.virtual_users.to_string()),
            ("HOLD_SECS", load.hold.as_secs().to_string()),
            ("RAMP_SECS", load.ramp.as_secs().to_string()),
            ("SEED", load.seed.to_string()),
        ];
        if let Some(max) = load.max_overall_load {
            env.push(("MAX_OVERALL_LOAD", max.to_string()));
        }
        env.into_iter()
            .map(|(k, v)| (format!("PLUGIN_REGRESSION_{k}"), v))
            .collect()
    }
}

#[async_trait]
impl PerformanceTest for CommandPerformanceTest {
    fn cohort(&self) -> &Cohort {
        &self.cohort
    }

    async fn run(
        &self,
        workspace: &TestWorkspace,
        load: &LoadProfile,
        scenario: &Scenario,
    ) -> UnitResult<RawResult> {
        let start = Instant::now();

        let (exe, args) = self
            .command
            .split_first()
            .ok_or_else(|| UnitError::Provisioning("load command is empty".to_string()))?;

        if let Some(artifact) = self.params.app.local_artifact() {
            let is_file = tokio::fs::metadata(artifact)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false);
            if !is_file {
                return Err(UnitError::Installation(format!(
                    "app artifact {} does not exist",
                    artifact.display()
                )));
            }
        }

        let results_dir = workspace.isolate_cohort(&self.cohort).await.map_err(|e| {
            UnitError::Provisioning(format!("cannot create results directory: {e}"))
        })?;

        info!(cohort = %self.cohort, command = %exe, dir = %results_dir.display(), "Starting load driver");

        let child = Command::new(exe)
            .args(args)
            .current_dir(&results_dir)
            .envs(self.environment(load, scenario))
            .env("PLUGIN_REGRESSION_RESULTS_DIR", &results_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| UnitError::Provisioning(format!("cannot start {exe}: {e}")))?;

        let lifespan = self.params.budget.lifespan;
        let output = tokio::time::timeout(lifespan, child.wait_with_output())
            .await
            .map_err(|_| {
                UnitError::Execution(format!(
                    "load driver exceeded the {}s resource lifespan",
                    lifespan.as_secs()
                ))
            })?
            .map_err(|e| UnitError::Execution(format!("load driver I/O error: {e}")))?;

        let duration_ms = start.elapsed().as_millis() as u64;

        // Logs are best effort; losing them must not fail a finished run.
        if let Err(e) = tokio::fs::write(results_dir.join(STDOUT_LOG), &output.stdout).await {
            debug!(cohort = %self.cohort, error = %e, "could not persist stdout");
        }
        if let Err(e) = tokio::fs::write(results_dir.join(STDERR_LOG), &output.stderr).await {
            debug!(cohort = %self.cohort, error = %e, "could not persist stderr");
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(UnitError::Execution(format!(
                "load driver exited with code {}: {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }

        let metrics = serde_json::from_slice(&output.stdout).unwrap_or_else(|_| {
            serde_json::Value::String(String::from_utf8_lossy(&output.stdout).trim().to_string())
        });

        Ok(RawResult {
            cohort: self.cohort.clone(),
            results_dir,
            metrics,
            duration_ms,
        })
    }
}
