//! HTTP clients for the research sources

pub mod arxiv;
pub mod tavily;
pub mod yahoo;

pub use arxiv::ArxivClient;
pub use tavily::TavilyClient;
pub use yahoo::YahooChartClient;

use crate::error::{ResearchError, Result};

/// Turn a non-success response into a transport error carrying the body
pub(crate) async fn ensure_success(
    source_name: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ResearchError::transport(
        source_name,
        format!("API error {status}: {body}"),
    ))
}
