//! Bounded worker pool with scoped release.
//!
//! Work submitted to a [`WorkerPool`] runs on the Tokio runtime, but at most
//! `slots` submissions execute at any moment; the rest wait for a permit.
//! Each submission immediately yields a [`PendingResult`].
//!
//! Releasing the pool closes the semaphore and aborts every task that has
//! not finished yet. Release happens exactly once: either explicitly through
//! [`WorkerPool::release`] or when the pool is dropped, so an early `?`
//! return in the caller cannot leak running work.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, Instrument};

use crate::obs;

/// Why a pending result could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("task was cancelled")]
    Cancelled,

    #[error("task panicked: {0}")]
    Panicked(String),

    #[error("pool was released before the task obtained a slot")]
    Released,
}

/// Fixed-size pool of execution slots.
pub struct WorkerPool {
    name: String,
    capacity: usize,
    slots: Arc<Semaphore>,
    tasks: Vec<AbortHandle>,
    released: bool,
}

impl WorkerPool {
    /// Create a pool that runs at most `slots` submissions concurrently.
    ///
    /// `slots` is clamped to at least one.
    pub fn new(name: impl Into<String>, slots: usize) -> Self {
        let capacity = slots.max(1);
        Self {
            name: name.into(),
            capacity,
            slots: Arc::new(Semaphore::new(capacity)),
            tasks: Vec::new(),
            released: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Queue `work` and return its pending handle without waiting.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit<T, F>(&mut self, label: impl Into<String>, work: F) -> PendingResult<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let label = label.into();
        let worker = self.tasks.len();
        let slots = Arc::clone(&self.slots);
        let span = tracing::info_span!("pool.worker", pool = %self.name, worker, label = %label);

        let handle = tokio::spawn(
            async move {
                let permit = match slots.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return None,
                };
                debug!("slot acquired");
                let output = work.await;
                drop(permit);
                Some(output)
            }
            .instrument(span),
        );

        self.tasks.push(handle.abort_handle());
        PendingResult { label, handle }
    }

    /// Abort all unfinished work and stop handing out slots.
    ///
    /// Returns the number of tasks that were still running or queued, or
    /// `None` if the pool had already been released.
    pub fn release(&mut self) -> Option<usize> {
        if self.released {
            return None;
        }
        self.released = true;
        self.slots.close();

        let mut aborted = 0;
        for task in self.tasks.drain(..) {
            if !task.is_finished() {
                task.abort();
                aborted += 1;
            }
        }
        obs::emit_pool_released(&self.name, aborted);
        Some(aborted)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.release();
    }
}

/// Handle to the eventual output of one submission.
#[derive(Debug)]
pub struct PendingResult<T> {
    label: String,
    handle: JoinHandle<Option<T>>,
}

impl<T> PendingResult<T> {
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Wait for the submission to finish.
    ///
    /// Must not be called again after it returned.
    pub async fn wait(&mut self) -> Result<T, PoolError> {
        match (&mut self.handle).await {
            Ok(Some(output)) => Ok(output),
            Ok(None) => Err(PoolError::Released),
            Err(e) if e.is_cancelled() => Err(PoolError::Cancelled),
            Err(e) => Err(PoolError::Panicked(e.to_string())),
        }
    }

    /// Consume the handle and wait for the submission to finish.
    pub async fn resolve(mut self) -> Result<T, PoolError> {
        self.wait().await
    }
}
