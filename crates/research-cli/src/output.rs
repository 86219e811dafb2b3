//! Terminal rendering of research results

use chrono::{DateTime, Utc};
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use research_agent::{ResearchResult, SourceName, SourceResult, WebSearchResult};
use serde::Serialize;

/// Envelope printed by `research --json`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchResponse<'a> {
    pub success: bool,
    pub results: &'a ResearchResult,
    pub query: &'a str,
    pub model: &'a str,
    pub tracing_enabled: bool,
    pub timestamp: DateTime<Utc>,
}

impl<'a> ResearchResponse<'a> {
    pub fn new(results: &'a ResearchResult, model: &'a str, tracing_enabled: bool) -> Self {
        Self {
            success: true,
            results,
            query: &results.query,
            model,
            tracing_enabled,
            timestamp: Utc::now(),
        }
    }
}

fn status_cell<T>(result: &SourceResult<T>, detail: impl FnOnce(&T) -> String) -> (String, String) {
    match result {
        SourceResult::Success { data } => ("ok".to_string(), detail(data)),
        SourceResult::Failure { reason } => ("failed".to_string(), reason.clone()),
    }
}

/// One row per attempted stage with its status and a short detail
pub fn summary_table(result: &ResearchResult) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Stage", "Status", "Detail"]);

    let sources = &result.sources;
    if let Some(web) = &sources.web_search {
        let (status, detail) = status_cell(web, |hits| format!("{} results", hits.len()));
        table.add_row(vec![SourceName::WebSearch.to_string(), status, detail]);
    }
    if let Some(academic) = &sources.academic_research {
        let (status, detail) =
            status_cell(academic, |a| format!("{} papers", a.parsed.len()));
        table.add_row(vec![SourceName::AcademicResearch.to_string(), status, detail]);
    }
    if let Some(market) = &sources.market_data {
        let (status, detail) = status_cell(market, |snapshot| {
            snapshot
                .iter()
                .map(|(symbol, r)| {
                    if r.is_success() {
                        symbol.to_string()
                    } else {
                        format!("{symbol} (failed)")
                    }
                })
                .collect::<Vec<_>>()
                .join(", ")
        });
        table.add_row(vec![SourceName::MarketData.to_string(), status, detail]);
    }

    let (status, detail) = status_cell(&result.ai_analysis, |text| {
        format!("{} characters", text.chars().count())
    });
    table.add_row(vec!["AI Analysis".to_string(), status, detail]);

    table
}

/// Web search hits as a table
pub fn search_table(results: &[WebSearchResult]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Title", "URL", "Score"]);

    for (i, hit) in results.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            hit.title.clone().unwrap_or_else(|| "No title".to_string()),
            hit.url.clone(),
            hit.score.map(|s| format!("{s:.2}")).unwrap_or_default(),
        ]);
    }

    table
}
