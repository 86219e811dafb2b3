//! Tracer trait and in-process implementations

use crate::{Result, RunUpdate, TraceError, TraceRun};
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Destination for run records
///
/// Implementations must be cheap to share across requests; the orchestrator
/// holds one behind an `Arc` and calls it from every traced stage.
#[async_trait]
pub trait Tracer: Send + Sync {
    /// Register a run that has just started
    async fn create_run(&self, run: &TraceRun) -> Result<()>;

    /// Complete a previously created run
    async fn update_run(&self, run_id: Uuid, update: &RunUpdate) -> Result<()>;

    /// Whether runs should be recorded at all
    ///
    /// When `false`, [`crate::TraceScope::traced`] calls the wrapped
    /// operation directly without touching the tracer.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Tracer used when tracing is disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

#[async_trait]
impl Tracer for NoopTracer {
    async fn create_run(&self, _run: &TraceRun) -> Result<()> {
        Ok(())
    }

    async fn update_run(&self, _run_id: Uuid, _update: &RunUpdate) -> Result<()> {
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

/// Tracer that keeps every run in memory
///
/// Useful for tests and for printing a run tree after a command finishes.
/// It can be told to reject calls to exercise failure handling.
#[derive(Debug, Default)]
pub struct MemoryTracer {
    runs: Mutex<Vec<TraceRun>>,
    reject_creates: bool,
    reject_updates: bool,
}

impl MemoryTracer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A tracer whose `create_run` always fails
    pub fn rejecting_creates() -> Self {
        Self {
            reject_creates: true,
            ..Self::default()
        }
    }

    /// A tracer whose `update_run` always fails
    pub fn rejecting_updates() -> Self {
        Self {
            reject_updates: true,
            ..Self::default()
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<TraceRun>> {
        self.runs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of all runs in creation order
    pub fn runs(&self) -> Vec<TraceRun> {
        self.lock().clone()
    }

    /// First run with the given name
    pub fn find(&self, name: &str) -> Option<TraceRun> {
        self.lock().iter().find(|r| r.name == name).cloned()
    }

    /// Runs whose parent is `parent_id`
    pub fn children_of(&self, parent_id: Uuid) -> Vec<TraceRun> {
        self.lock()
            .iter()
            .filter(|r| r.parent_run_id == Some(parent_id))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Tracer for MemoryTracer {
    async fn create_run(&self, run: &TraceRun) -> Result<()> {
        if self.reject_creates {
            return Err(TraceError::Rejected(run.name.clone()));
        }
        self.lock().push(run.clone());
        Ok(())
    }

    async fn update_run(&self, run_id: Uuid, update: &RunUpdate) -> Result<()> {
        if self.reject_updates {
            return Err(TraceError::Rejected(run_id.to_string()));
        }
        let mut runs = self.lock();
        let run = runs
            .iter_mut()
            .find(|r| r.id == run_id)
            .ok_or(TraceError::UnknownRun(run_id))?;
        run.apply(update);
        Ok(())
    }
}
