//! Wrapping operations in runs

use crate::{NoopTracer, RunType, RunUpdate, TraceRun, Tracer};
use serde::Serialize;
use serde_json::Value;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// A tracer plus the run new runs should hang under
///
/// Scopes are cheap to clone. The closure passed to [`TraceScope::traced`]
/// receives a child scope, so nested calls form a run tree.
#[derive(Clone)]
pub struct TraceScope {
    tracer: Arc<dyn Tracer>,
    parent: Option<Uuid>,
}

impl TraceScope {
    /// Root scope over the given tracer
    pub fn new(tracer: Arc<dyn Tracer>) -> Self {
        Self {
            tracer,
            parent: None,
        }
    }

    /// Root scope that records nothing
    pub fn disabled() -> Self {
        Self::new(Arc::new(NoopTracer))
    }

    pub fn is_enabled(&self) -> bool {
        self.tracer.is_enabled()
    }

    /// Id of the run this scope belongs to, if any
    pub fn parent_run_id(&self) -> Option<Uuid> {
        self.parent
    }

    fn child(&self, run_id: Uuid) -> Self {
        Self {
            tracer: Arc::clone(&self.tracer),
            parent: Some(run_id),
        }
    }

    /// Run `operation` inside a named run
    ///
    /// The operation's result is returned unchanged. On success the run's
    /// outputs are `{"result": <value>}`; on failure its error is the
    /// display string of the error. Failures of the tracer itself are logged
    /// and never reach the caller. If the run cannot be created the operation
    /// still runs, untraced.
    pub async fn traced<T, E, F, Fut>(
        &self,
        name: &str,
        run_type: RunType,
        inputs: Value,
        operation: F,
    ) -> Result<T, E>
    where
        T: Serialize,
        E: Display,
        F: FnOnce(TraceScope) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.tracer.is_enabled() {
            return operation(self.clone()).await;
        }

        let run = TraceRun::start(name, run_type, inputs).with_parent(self.parent);
        let run_id = run.id;

        if let Err(e) = self.tracer.create_run(&run).await {
            warn!("Failed to create trace run '{name}': {e}");
            return operation(self.clone()).await;
        }
        debug!("Started trace run '{name}' ({run_id})");

        let result = operation(self.child(run_id)).await;

        let update = match &result {
            Ok(value) => match serde_json::to_value(value) {
                Ok(value) => RunUpdate::success(value),
                Err(e) => RunUpdate::failure(format!("unserializable output: {e}")),
            },
            Err(e) => RunUpdate::failure(e.to_string()),
        };

        if let Err(e) = self.tracer.update_run(run_id, &update).await {
            warn!("Failed to update trace run '{name}' ({run_id}): {e}");
        }

        result
    }
}

impl Default for TraceScope {
    fn default() -> Self {
        Self::disabled()
    }
}

impl std::fmt::Debug for TraceScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraceScope")
            .field("enabled", &self.tracer.is_enabled())
            .field("parent", &self.parent)
            .finish()
    }
}
