//! Global atomic counters for harness observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. before the process exits).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    units_started: AtomicU64,
    units_failed: AtomicU64,
    units_cancelled: AtomicU64,
    comparisons_completed: AtomicU64,
    comparisons_failed: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            units_started: AtomicU64::new(0),
            units_failed: AtomicU64::new(0),
            units_cancelled: AtomicU64::new(0),
            comparisons_completed: AtomicU64::new(0),
            comparisons_failed: AtomicU64::new(0),
        }
    }

    pub fn inc_units_started(&self) {
        self.units_started.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "units_started", "counter incremented");
    }

    pub fn inc_units_failed(&self) {
        self.units_failed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "units_failed", "counter incremented");
    }

    pub fn inc_units_cancelled(&self) {
        self.add_units_cancelled(1);
    }

    /// Record `n` units aborted in one pool release.
    pub fn add_units_cancelled(&self, n: u64) {
        if n == 0 {
            return;
        }
        self.units_cancelled.fetch_add(n, Ordering::Relaxed);
        tracing::trace!(metric = "units_cancelled", n, "counter incremented");
    }

    pub fn inc_comparisons_completed(&self) {
        self.comparisons_completed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "comparisons_completed", "counter incremented");
    }

    pub fn inc_comparisons_failed(&self) {
        self.comparisons_failed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "comparisons_failed", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            units_started = self.units_started(),
            units_failed = self.units_failed(),
            units_cancelled = self.units_cancelled(),
            comparisons_completed = self.comparisons_completed(),
            comparisons_failed = self.comparisons_failed(),
        );
    }

    pub fn units_started(&self) -> u64 {
        self.units_started.load(Ordering::Relaxed)
    }

    pub fn units_failed(&self) -> u64 {
        self.units_failed.load(Ordering::Relaxed)
    }

    pub fn units_cancelled(&self) -> u64 {
        self.units_cancelled.load(Ordering::Relaxed)
    }

    pub fn comparisons_completed(&self) -> u64 {
        self.comparisons_completed.load(Ordering::Relaxed)
    }

    pub fn comparisons_failed(&self) -> u64 {
        self.comparisons_failed.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.units_started.store(0, Ordering::Relaxed);
        self.units_failed.store(0, Ordering::Relaxed);
        self.units_cancelled.store(0, Ordering::Relaxed);
        self.comparisons_completed.store(0, Ordering::Relaxed);
        self.comparisons_failed.store(0, Ordering::Relaxed);
    }
}
