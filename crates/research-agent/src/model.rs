//! Research request and result types

use crate::error::{ResearchError, Result};
use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Which sources a research request should consult
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchOptions {
    pub web_search: bool,
    pub academic_research: bool,
    pub market_data: bool,
}

impl Default for ResearchOptions {
    fn default() -> Self {
        Self::all()
    }
}

impl ResearchOptions {
    /// Every source enabled
    pub fn all() -> Self {
        Self {
            web_search: true,
            academic_research: true,
            market_data: true,
        }
    }

    /// Every source disabled; only the synthesis stage runs
    pub fn none() -> Self {
        Self {
            web_search: false,
            academic_research: false,
            market_data: false,
        }
    }

    pub fn enabled(&self, source: SourceName) -> bool {
        match source {
            SourceName::WebSearch => self.web_search,
            SourceName::AcademicResearch => self.academic_research,
            SourceName::MarketData => self.market_data,
        }
    }
}

/// A research request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchQuery {
    /// Free-text question
    pub query: String,

    /// Source inclusion flags
    #[serde(flatten)]
    pub options: ResearchOptions,

    /// Caller supplied ticker symbols, queried before extracted ones
    #[serde(default)]
    pub symbols: Vec<String>,

    /// Model identifier; the configured default is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ResearchQuery {
    /// Query consulting every source with no explicit symbols
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            options: ResearchOptions::all(),
            symbols: Vec::new(),
            model: None,
        }
    }

    pub fn with_options(mut self, options: ResearchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.symbols = symbols.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Reject requests whose query text is empty or blank
    pub fn validate(&self) -> Result<()> {
        if self.query.trim().is_empty() {
            return Err(ResearchError::Validation("Query is required".to_string()));
        }
        Ok(())
    }

    /// Caller symbols trimmed, upper-cased, blanks removed
    pub fn normalized_symbols(&self) -> Vec<String> {
        self.symbols
            .iter()
            .map(|s| s.trim().to_ascii_uppercase())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// The three external sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceName {
    WebSearch,
    AcademicResearch,
    MarketData,
}

impl SourceName {
    /// Key used in serialized results
    pub fn key(&self) -> &'static str {
        match self {
            Self::WebSearch => "webSearch",
            Self::AcademicResearch => "academicResearch",
            Self::MarketData => "marketData",
        }
    }

    /// Human readable stage name, also used for trace runs
    pub fn stage_name(&self) -> &'static str {
        match self {
            Self::WebSearch => "Web Search",
            Self::AcademicResearch => "Academic Research",
            Self::MarketData => "Market Data",
        }
    }
}

impl fmt::Display for SourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.stage_name())
    }
}

/// Outcome of one stage: its data, or why it failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceResult<T> {
    Success { data: T },
    Failure { reason: String },
}

impl<T> SourceResult<T> {
    pub fn success(data: T) -> Self {
        Self::Success { data }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Success { data } => Some(data),
            Self::Failure { .. } => None,
        }
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { reason } => Some(reason),
        }
    }
}

impl<T, E: fmt::Display> From<std::result::Result<T, E>> for SourceResult<T> {
    fn from(result: std::result::Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(e) => Self::failure(e.to_string()),
        }
    }
}

/// One web search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebSearchResult {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// One paper from the academic feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcademicRecord {
    pub title: String,
    pub summary: String,
    /// Empty when the entry carries no date
    pub published_date: String,
    /// Empty when the entry has no PDF link
    pub pdf_link: String,
    /// Empty when the entry has no identifier
    pub id: String,
}

/// Academic stage payload: the feed as received plus the parsed records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcademicResearch {
    pub raw: String,
    pub parsed: Vec<AcademicRecord>,
}

/// Market data keyed by symbol, in the order symbols were queried
///
/// Each symbol succeeds or fails on its own. Serializes as a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketSnapshot {
    entries: Vec<(String, SourceResult<Value>)>,
}

impl MarketSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for `symbol`
    pub fn insert(&mut self, symbol: impl Into<String>, result: SourceResult<Value>) {
        let symbol = symbol.into();
        match self.entries.iter_mut().find(|(s, _)| *s == symbol) {
            Some((_, existing)) => *existing = result,
            None => self.entries.push((symbol, result)),
        }
    }

    pub fn get(&self, symbol: &str) -> Option<&SourceResult<Value>> {
        self.entries
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, r)| r)
    }

    /// Symbols in query order
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(s, _)| s.as_str())
    }

    /// Symbols whose data arrived
    pub fn available_symbols(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, r)| r.is_success())
            .map(|(s, _)| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SourceResult<Value>)> {
        self.entries.iter().map(|(s, r)| (s.as_str(), r))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for MarketSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (symbol, result) in &self.entries {
            map.serialize_entry(symbol, result)?;
        }
        map.end()
    }
}

/// Per-source outcomes; `None` means the caller opted out
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sources {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_search: Option<SourceResult<Vec<WebSearchResult>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub academic_research: Option<SourceResult<AcademicResearch>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_data: Option<SourceResult<MarketSnapshot>>,
}

impl Sources {
    /// No source was requested
    pub fn is_empty(&self) -> bool {
        self.web_search.is_none() && self.academic_research.is_none() && self.market_data.is_none()
    }

    /// Sources that were attempted, with whether they succeeded
    pub fn attempted(&self) -> Vec<(SourceName, bool)> {
        let mut out = Vec::new();
        if let Some(r) = &self.web_search {
            out.push((SourceName::WebSearch, r.is_success()));
        }
        if let Some(r) = &self.academic_research {
            out.push((SourceName::AcademicResearch, r.is_success()));
        }
        if let Some(r) = &self.market_data {
            out.push((SourceName::MarketData, r.is_success()));
        }
        out
    }

    /// Failure reason for a source, if it was attempted and failed
    pub fn failure_reason(&self, source: SourceName) -> Option<&str> {
        match source {
            SourceName::WebSearch => self.web_search.as_ref()?.failure_reason(),
            SourceName::AcademicResearch => self.academic_research.as_ref()?.failure_reason(),
            SourceName::MarketData => self.market_data.as_ref()?.failure_reason(),
        }
    }
}

/// The complete outcome of one research request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchResult {
    pub query: String,
    pub timestamp: DateTime<Utc>,
    pub sources: Sources,
    pub ai_analysis: SourceResult<String>,
}
