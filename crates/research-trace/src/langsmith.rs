//! LangSmith HTTP tracer
//!
//! Runs are posted to `{endpoint}/runs` and completed with
//! `PATCH {endpoint}/runs/{id}`, authenticated by the `x-api-key` header.

use crate::{NoopTracer, Result, RunUpdate, TraceError, TraceRun, Tracer};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};
use uuid::Uuid;

const DEFAULT_ENDPOINT: &str = "https://api.smith.langchain.com";
const DEFAULT_PROJECT: &str = "financial-research-agent";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Configuration for the LangSmith tracer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceConfig {
    /// API key; tracing is disabled when absent
    pub api_key: Option<String>,

    /// Project (session) runs are filed under
    pub project: String,

    /// API endpoint
    pub endpoint: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            project: DEFAULT_PROJECT.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl TraceConfig {
    /// Read `LANGSMITH_API_KEY`, `LANGSMITH_PROJECT` and `LANGSMITH_ENDPOINT`
    pub fn from_env() -> Self {
        Self {
            api_key: research_utils::non_empty_env("LANGSMITH_API_KEY"),
            project: research_utils::non_empty_env_or("LANGSMITH_PROJECT", DEFAULT_PROJECT),
            endpoint: research_utils::non_empty_env_or("LANGSMITH_ENDPOINT", DEFAULT_ENDPOINT)
                .trim_end_matches('/')
                .to_string(),
            ..Self::default()
        }
    }

    /// Override the key when one is given; blank keys are ignored
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
        self
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = project.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Whether a key is present
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Build the tracer this config describes
    ///
    /// Returns a [`NoopTracer`] when no key is configured.
    pub fn into_tracer(self) -> Result<Arc<dyn Tracer>> {
        if self.is_configured() {
            Ok(Arc::new(LangSmithTracer::new(self)?))
        } else {
            Ok(Arc::new(NoopTracer))
        }
    }
}

/// Tracer backed by the LangSmith runs API
pub struct LangSmithTracer {
    client: Client,
    api_key: String,
    config: TraceConfig,
}

#[derive(Serialize)]
struct CreateRunBody<'a> {
    #[serde(flatten)]
    run: &'a TraceRun,
    session_name: &'a str,
}

impl LangSmithTracer {
    pub fn new(config: TraceConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| TraceError::NotConfigured("LANGSMITH_API_KEY not set".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            config,
        })
    }

    pub fn config(&self) -> &TraceConfig {
        &self.config
    }

    /// Verify the key by listing at most one project
    #[instrument(skip(self), fields(endpoint = %self.config.endpoint))]
    pub async fn check_connection(&self) -> Result<()> {
        let response = self
            .client
            .get(format!("{}/sessions", self.config.endpoint))
            .query(&[("limit", "1")])
            .header("x-api-key", &self.api_key)
            .send()
            .await?;

        check_status(response).await?;
        info!("LangSmith connection verified");
        Ok(())
    }
}

async fn check_status(response: reqwest::Response) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(TraceError::Api {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl Tracer for LangSmithTracer {
    async fn create_run(&self, run: &TraceRun) -> Result<()> {
        debug!("Creating LangSmith run {} ({})", run.name, run.id);

        let response = self
            .client
            .post(format!("{}/runs", self.config.endpoint))
            .header("x-api-key", &self.api_key)
            .json(&CreateRunBody {
                run,
                session_name: &self.config.project,
            })
            .send()
            .await?;

        check_status(response).await
    }

    async fn update_run(&self, run_id: Uuid, update: &RunUpdate) -> Result<()> {
        debug!("Updating LangSmith run {run_id}");

        let response = self
            .client
            .patch(format!("{}/runs/{run_id}", self.config.endpoint))
            .header("x-api-key", &self.api_key)
            .json(update)
            .send()
            .await?;

        check_status(response).await
    }
}
