//! Run records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Kind of traced operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunType {
    /// A composite operation made of other runs
    Chain,
    /// A language-model call
    Llm,
    /// A call to an external tool or data source
    Tool,
}

/// One traced operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceRun {
    pub id: Uuid,
    pub name: String,
    pub run_type: RunType,
    pub inputs: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_run_id: Option<Uuid>,
}

impl TraceRun {
    /// Start a new run now with a fresh id
    pub fn start(name: impl Into<String>, run_type: RunType, inputs: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            run_type,
            inputs,
            outputs: None,
            error: None,
            start_time: Utc::now(),
            end_time: None,
            parent_run_id: None,
        }
    }

    /// Attach this run to a parent run
    pub fn with_parent(mut self, parent: Option<Uuid>) -> Self {
        self.parent_run_id = parent;
        self
    }

    /// Apply a completion update
    pub fn apply(&mut self, update: &RunUpdate) {
        self.outputs.clone_from(&update.outputs);
        self.error.clone_from(&update.error);
        self.end_time = Some(update.end_time);
    }

    /// Whether the run has been completed
    pub fn is_finished(&self) -> bool {
        self.end_time.is_some()
    }
}

/// Completion data for a run: outputs on success or an error message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub end_time: DateTime<Utc>,
}

impl RunUpdate {
    /// Successful completion; outputs are stored as `{"result": ...}`
    pub fn success(result: Value) -> Self {
        Self {
            outputs: Some(serde_json::json!({ "result": result })),
            error: None,
            end_time: Utc::now(),
        }
    }

    /// Failed completion
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            outputs: None,
            error: Some(error.into()),
            end_time: Utc::now(),
        }
    }
}
