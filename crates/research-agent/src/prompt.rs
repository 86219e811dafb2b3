//! Synthesis prompt assembly
//!
//! The prompt is built from whichever sources succeeded, always in the same
//! order: web results, academic papers, then the list of symbols with market
//! data. Failed or skipped sources add nothing. The closing instructions are
//! always present.

use crate::model::Sources;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Appended when a prompt is cut to its budget
pub const TRUNCATION_MARKER: &str = "\n\n[Content truncated due to length]";

const CLOSING_INSTRUCTIONS: &str = "Please provide:\n\
1. Key insights and trends\n\
2. Investment implications\n\
3. Risk considerations\n\
4. Recommendations for wealth management\n\
5. Academic research implications\n";

/// Prompt layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptStyle {
    /// Bounded excerpts and a 4000 character budget
    #[default]
    Detailed,
    /// Every result in full, no budget
    Simple,
}

impl PromptStyle {
    fn web_limit(self) -> Option<usize> {
        match self {
            Self::Detailed => Some(3),
            Self::Simple => None,
        }
    }

    fn web_excerpt(self) -> Option<usize> {
        match self {
            Self::Detailed => Some(500),
            Self::Simple => None,
        }
    }

    fn paper_limit(self) -> Option<usize> {
        match self {
            Self::Detailed => Some(2),
            Self::Simple => None,
        }
    }

    fn summary_excerpt(self) -> Option<usize> {
        match self {
            Self::Detailed => Some(300),
            Self::Simple => None,
        }
    }

    /// Maximum prompt length in characters, `None` when unbounded
    pub fn char_budget(self) -> Option<usize> {
        match self {
            Self::Detailed => Some(4000),
            Self::Simple => None,
        }
    }
}

impl std::str::FromStr for PromptStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "detailed" => Ok(Self::Detailed),
            "simple" => Ok(Self::Simple),
            other => Err(format!("unknown prompt style: {other}")),
        }
    }
}

/// Builds the synthesis prompt for a query and its collected sources
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder {
    style: PromptStyle,
}

impl PromptBuilder {
    pub fn new(style: PromptStyle) -> Self {
        Self { style }
    }

    pub fn build(&self, query: &str, sources: &Sources) -> String {
        let style = self.style;
        let mut prompt = format!(
            "You are a financial research analyst. Analyze the following information about \"{query}\" and provide comprehensive insights for wealth and asset management.\n\n"
        );

        if let Some(results) = sources.web_search.as_ref().and_then(|r| r.data()) {
            if !results.is_empty() {
                prompt.push_str("WEB SEARCH RESULTS:\n");
                for (i, result) in results
                    .iter()
                    .take(style.web_limit().unwrap_or(usize::MAX))
                    .enumerate()
                {
                    let title = result.title.as_deref().unwrap_or("No title");
                    let content = result
                        .content
                        .as_deref()
                        .map_or_else(|| "No content available".to_string(), |c| {
                            excerpt(c, style.web_excerpt())
                        });
                    let _ = writeln!(prompt, "{}. {title}: {content}", i + 1);
                }
                prompt.push('\n');
            }
        }

        if let Some(academic) = sources.academic_research.as_ref().and_then(|r| r.data()) {
            if !academic.parsed.is_empty() {
                prompt.push_str("ACADEMIC RESEARCH:\n");
                for (i, paper) in academic
                    .parsed
                    .iter()
                    .take(style.paper_limit().unwrap_or(usize::MAX))
                    .enumerate()
                {
                    let summary = excerpt(&paper.summary, style.summary_excerpt());
                    let _ = writeln!(prompt, "{}. {}: {summary}", i + 1, paper.title);
                }
                prompt.push('\n');
            }
        }

        if let Some(market) = sources.market_data.as_ref().and_then(|r| r.data()) {
            let symbols: Vec<&str> = market.symbols().collect();
            if !symbols.is_empty() {
                let _ = write!(
                    prompt,
                    "MARKET DATA AVAILABLE FOR: {}\n\n",
                    symbols.join(", ")
                );
            }
        }

        prompt.push_str(CLOSING_INSTRUCTIONS);

        match style.char_budget() {
            Some(budget) => truncate_to_budget(prompt, budget),
            None => prompt,
        }
    }
}

fn excerpt(text: &str, limit: Option<usize>) -> String {
    match limit {
        Some(limit) => text.chars().take(limit).collect(),
        None => text.to_string(),
    }
}

/// Cut `prompt` to `budget` characters and append [`TRUNCATION_MARKER`]
///
/// Prompts within budget are returned unchanged.
pub fn truncate_to_budget(prompt: String, budget: usize) -> String {
    match prompt.char_indices().nth(budget) {
        Some((cut, _)) => {
            let mut truncated = prompt[..cut].to_string();
            truncated.push_str(TRUNCATION_MARKER);
            truncated
        }
        None => prompt,
    }
}

/// Prefix a prompt with caller context
pub fn with_context(prompt: &str, context: Option<&str>) -> String {
    match context.map(str::trim).filter(|c| !c.is_empty()) {
        Some(context) => format!("Context: {context}\n\nAnalysis Request: {prompt}"),
        None => prompt.to_string(),
    }
}
