//! Performance test units.
//!
//! A unit provisions the infrastructure for one cohort, installs that
//! cohort's app, drives the load scenario against it and hands back a
//! [`RawResult`]. The harness treats units as opaque capabilities: it only
//! builds them, runs them, and looks at success vs failure.
//!
//! - [`PerformanceTestFactory`]: pure construction from cohort + parameters
//! - [`PerformanceTest`]: the long-running provision-then-run operation
//! - [`command`]: on-premises backing that shells out to a local load driver

use async_trait::async_trait;

use crate::cohort::Cohort;
use crate::domain::{LoadProfile, ProvisioningParameters, RawResult, Scenario};
use crate::error::UnitResult;
use crate::workspace::TestWorkspace;

pub mod command;

pub use command::{CommandPerformanceTest, CommandTestFactory};

/// Provision-then-run pipeline for a single cohort.
#[async_trait]
pub trait PerformanceTest: Send + Sync {
    /// Cohort this unit was built for.
    fn cohort(&self) -> &Cohort;

    /// Provision, install, run `scenario` under `load`, and collect results.
    ///
    /// May take hours. Resources must be released by the implementation
    /// before its [`crate::domain::ResourceBudget`] lifespan is spent.
    async fn run(
        &self,
        workspace: &TestWorkspace,
        load: &LoadProfile,
        scenario: &Scenario,
    ) -> UnitResult<RawResult>;
}

/// Builds units. Must not perform I/O.
pub trait PerformanceTestFactory: Send + Sync {
    fn build(&self, cohort: Cohort, params: ProvisioningParameters) -> Box<dyn PerformanceTest>;
}
