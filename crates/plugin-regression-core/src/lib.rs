//! Plugin Regression Core
//!
//! Runs a baseline and an experiment build of an application extension under
//! identical load, in two isolated environments at the same time, and
//! returns both raw result sets for downstream comparison.
//!
//! # Module layout
//!
//! - [`cohort`]: `name_cohorts`, `Cohort`
//! - [`domain`]: variants, datasets, load profiles, provisioning parameters, results
//! - [`unit`]: `PerformanceTest` / `PerformanceTestFactory` capabilities and the
//!   command-backed implementation
//! - [`pool`]: `WorkerPool`, `PendingResult`
//! - [`runner`]: `RegressionRunner`
//! - [`tester`]: `PluginTester`, the entry point
//! - [`workspace`]: `RootWorkspace` / `TaskWorkspace` / `TestWorkspace`
//! - [`fakes`]: scripted units for tests

pub mod cohort;
pub mod config;
pub mod domain;
pub mod error;
pub mod fakes;
pub mod metrics;
pub mod obs;
pub mod pool;
pub mod runner;
pub mod telemetry;
pub mod tester;
pub mod unit;
pub mod workspace;

pub use cohort::{name_cohorts, Cohort, DISAMBIGUATION_SUFFIX};
pub use config::{HarnessConfig, ResolutionOrder};
pub use domain::{
    AppSource, ComparisonRequest, Dataset, LoadProfile, ProvisioningParameters, RawResult,
    RegressionResults, ResourceBudget, Scenario, Variant, DEFAULT_LIFESPAN,
};
pub use error::{HarnessError, Result, UnitError, UnitResult};
pub use metrics::METRICS;
pub use pool::{PendingResult, PoolError, WorkerPool};
pub use runner::{RegressionRunner, COHORT_COUNT};
pub use telemetry::init_tracing;
pub use tester::PluginTester;
pub use unit::{CommandPerformanceTest, CommandTestFactory, PerformanceTest, PerformanceTestFactory};
pub use workspace::{RootWorkspace, TaskWorkspace, TestWorkspace};

/// Harness version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
