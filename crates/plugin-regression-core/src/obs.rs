//! Structured observability hooks for comparison lifecycle events.
//!
//! - [`comparison_span`] scoping all log lines of one comparison
//! - `emit_*` functions for start, unit submission/completion, finish and
//!   pool release

use tracing::{info, warn};

/// Span tagging everything logged during one comparison.
///
/// Attach with [`tracing::Instrument::instrument`]; the span must not be
/// entered across `.await` points.
pub fn comparison_span(digest: &str, feature: &str) -> tracing::Span {
    let short = &digest[..12.min(digest.len())];
    tracing::info_span!("comparison", digest = %short, feature = %feature)
}

/// Emit event: comparison started with both cohorts.
pub fn emit_comparison_started(baseline: &str, experiment: &str, scenario: &str) {
    info!(
        event = "comparison.started",
        baseline = %baseline,
        experiment = %experiment,
        scenario = %scenario,
    );
}

/// Emit event: a unit was handed to the worker pool.
pub fn emit_unit_submitted(cohort: &str, role: &str) {
    info!(event = "unit.submitted", cohort = %cohort, role = %role);
}

/// Emit event: a unit finished, successfully or not.
pub fn emit_unit_finished(cohort: &str, duration_ms: u64, success: bool) {
    info!(
        event = "unit.finished",
        cohort = %cohort,
        duration_ms = duration_ms,
        success = success,
    );
}

/// Emit event: both cohorts produced results.
pub fn emit_comparison_finished(duration_ms: u64) {
    info!(event = "comparison.finished", duration_ms = duration_ms);
}

/// Emit event: the comparison failed (warning level).
pub fn emit_comparison_failed(cohort: Option<&str>, error: &dyn std::fmt::Display) {
    warn!(
        event = "comparison.failed",
        cohort = cohort.unwrap_or("-"),
        error = %error,
    );
}

/// Emit event: a worker pool was released.
pub fn emit_pool_released(pool: &str, aborted: usize) {
    info!(event = "pool.released", pool = %pool, aborted = aborted);
}
