//! Ticker symbol heuristics
//!
//! Candidates are uppercase runs of 2 to 5 letters. They are not checked
//! against any exchange listing, so callers must treat them as guesses.

use crate::error::{ResearchError, Result};
use regex::Regex;
use std::collections::HashSet;

/// Uppercase finance and general acronyms that are almost never meant as tickers
const NON_TICKERS: &[&str] = &[
    "AI", "API", "AUM", "CAGR", "CEO", "CFO", "CPI", "CTO", "DCF", "EBIT", "EPS", "ESG", "ETF",
    "ETFS", "EU", "EUR", "FAQ", "FED", "FOMC", "FX", "GBP", "GDP", "IPO", "IRR", "JPY", "LLM",
    "ML", "NAV", "OTC", "PE", "PMI", "REIT", "ROA", "ROE", "ROI", "SEC", "UK", "US", "USA",
    "USD", "VC", "YOY", "YTD",
];

/// Finds probable ticker symbols in free text
#[derive(Debug, Clone)]
pub struct SymbolExtractor {
    pattern: Regex,
    ignored: HashSet<&'static str>,
}

impl SymbolExtractor {
    pub fn new() -> Result<Self> {
        let pattern = Regex::new(r"\b[A-Z]{1,5}\b")
            .map_err(|e| ResearchError::Config(format!("invalid symbol pattern: {e}")))?;

        Ok(Self {
            pattern,
            ignored: NON_TICKERS.iter().copied().collect(),
        })
    }

    /// Candidate symbols in order of first appearance, without duplicates
    pub fn extract(&self, text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        self.pattern
            .find_iter(text)
            .map(|m| m.as_str())
            .filter(|s| s.len() >= 2 && !self.ignored.contains(s))
            .filter(|s| seen.insert(*s))
            .map(str::to_string)
            .collect()
    }
}

/// Merge caller and extracted symbols, caller first, deduplicated, capped at `max`
pub fn select_symbols(caller: &[String], extracted: &[String], max: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    caller
        .iter()
        .chain(extracted)
        .filter(|s| seen.insert(s.as_str()))
        .take(max)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_extracts_tickers() {
        let extractor = SymbolExtractor::new().unwrap();
        let symbols = extractor.extract("Research AAPL and MSFT trends");
        assert_eq!(symbols, strings(&["AAPL", "MSFT"]));
    }

    #[test]
    fn test_no_uppercase_runs() {
        let extractor = SymbolExtractor::new().unwrap();
        assert!(extractor.extract("dividend growth in emerging markets").is_empty());
        assert!(extractor.extract("A single letter I is ignored").is_empty());
    }

    #[test]
    fn test_longer_runs_do_not_match() {
        let extractor = SymbolExtractor::new().unwrap();
        assert!(extractor.extract("BERKSHIRE holdings").is_empty());
    }

    #[test]
    fn test_finance_acronyms_are_not_tickers() {
        let extractor = SymbolExtractor::new().unwrap();
        assert!(extractor.extract("ESG investing strategies").is_empty());
        assert_eq!(
            extractor.extract("ETF flows into NVDA after the IPO"),
            strings(&["NVDA"])
        );
    }

    #[test]
    fn test_duplicates_removed() {
        let extractor = SymbolExtractor::new().unwrap();
        assert_eq!(
            extractor.extract("TSLA vs GM, then TSLA again"),
            strings(&["TSLA", "GM"])
        );
    }

    #[test]
    fn test_select_caps_at_five_caller_first() {
        let caller = strings(&["JPM", "GS"]);
        let extracted = strings(&["AAPL", "MSFT", "NVDA", "AMZN", "META"]);

        let selected = select_symbols(&caller, &extracted, 5);
        assert_eq!(selected, strings(&["JPM", "GS", "AAPL", "MSFT", "NVDA"]));
    }

    #[test]
    fn test_select_dedupes_across_lists() {
        let caller = strings(&["AAPL"]);
        let extracted = strings(&["AAPL", "MSFT"]);
        assert_eq!(
            select_symbols(&caller, &extracted, 5),
            strings(&["AAPL", "MSFT"])
        );
    }

    #[test]
    fn test_select_empty() {
        assert!(select_symbols(&[], &[], 5).is_empty());
    }
}
