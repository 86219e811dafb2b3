//! Atom feed parsing for academic search results
//!
//! The feed is scanned with patterns rather than a full XML parser. Anything
//! that does not look like an entry is ignored, so parsing never fails.

use crate::error::{ResearchError, Result};
use crate::model::AcademicRecord;
use regex::Regex;

/// Extracts [`AcademicRecord`]s from an Atom feed payload
#[derive(Debug, Clone)]
pub struct FeedParser {
    entry: Regex,
    title: Regex,
    summary: Regex,
    published: Regex,
    pdf_link: Regex,
    id: Regex,
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| ResearchError::Config(format!("invalid feed pattern: {e}")))
}

impl FeedParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            entry: compile(r"(?s)<entry>(.*?)</entry>")?,
            title: compile(r"(?s)<title[^>]*>(.*?)</title>")?,
            summary: compile(r"(?s)<summary[^>]*>(.*?)</summary>")?,
            published: compile(r"(?s)<published[^>]*>(.*?)</published>")?,
            pdf_link: compile(r#"<link[^>]*title="pdf"[^>]*href="([^"]*)"[^>]*>"#)?,
            id: compile(r"(?s)<id[^>]*>(.*?)</id>")?,
        })
    }

    /// Parse every well-formed entry in `feed`
    ///
    /// An entry needs a non-empty title and summary; entries missing either
    /// are dropped. Missing dates, PDF links and ids become empty strings.
    pub fn parse(&self, feed: &str) -> Vec<AcademicRecord> {
        self.entry
            .captures_iter(feed)
            .filter_map(|cap| cap.get(1))
            .filter_map(|entry| self.parse_entry(entry.as_str()))
            .collect()
    }

    fn parse_entry(&self, entry: &str) -> Option<AcademicRecord> {
        let title = capture(&self.title, entry).filter(|t| !t.is_empty())?;
        let summary = capture(&self.summary, entry).filter(|s| !s.is_empty())?;

        Some(AcademicRecord {
            title,
            summary,
            published_date: capture(&self.published, entry).unwrap_or_default(),
            pdf_link: capture(&self.pdf_link, entry).unwrap_or_default(),
            id: capture(&self.id, entry).unwrap_or_default(),
        })
    }
}

fn capture(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title type="html">ArXiv Query: search_query=all:finance</title>
  <id>http://arxiv.org/api/query-id</id>
  <entry>
    <id>http://arxiv.org/abs/2401.00001v1</id>
    <published>2024-01-01T00:00:00Z</published>
    <title>ESG Scores and
      Portfolio Returns</title>
    <summary>  We study the relation between ESG ratings and returns.  </summary>
    <link href="http://arxiv.org/abs/2401.00001v1" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/2401.00001v1" rel="related" type="application/pdf"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2401.00002v1</id>
    <title>Robo-Advisors in Wealth Management</title>
    <summary>A survey.</summary>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2401.00003v1</id>
    <title>No Abstract Here</title>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_feed() {
        let parser = FeedParser::new().unwrap();
        let records = parser.parse(FEED);

        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert!(first.title.starts_with("ESG Scores and"));
        assert_eq!(
            first.summary,
            "We study the relation between ESG ratings and returns."
        );
        assert_eq!(first.published_date, "2024-01-01T00:00:00Z");
        assert_eq!(first.pdf_link, "http://arxiv.org/pdf/2401.00001v1");
        assert_eq!(first.id, "http://arxiv.org/abs/2401.00001v1");
    }

    #[test]
    fn test_missing_optional_fields_are_empty() {
        let parser = FeedParser::new().unwrap();
        let records = parser.parse(FEED);

        let second = &records[1];
        assert_eq!(second.title, "Robo-Advisors in Wealth Management");
        assert_eq!(second.pdf_link, "");
        assert_eq!(second.published_date, "");
        assert_eq!(second.id, "http://arxiv.org/abs/2401.00002v1");
    }

    #[test]
    fn test_entry_without_summary_is_dropped() {
        let parser = FeedParser::new().unwrap();
        let records = parser.parse(FEED);
        assert!(records.iter().all(|r| r.title != "No Abstract Here"));
    }

    #[test]
    fn test_blank_summary_is_dropped() {
        let parser = FeedParser::new().unwrap();
        let feed = "<entry><title>T</title><summary>   </summary></entry>";
        assert!(parser.parse(feed).is_empty());
    }

    #[test]
    fn test_no_entries_yields_empty() {
        let parser = FeedParser::new().unwrap();
        assert!(parser.parse("").is_empty());
        assert!(parser.parse("<feed><title>nothing</title></feed>").is_empty());
        assert!(parser.parse("<<<not xml at all").is_empty());
        assert!(parser.parse("<entry><title>unterminated").is_empty());
    }

    #[test]
    fn test_n_entries_yield_n_records() {
        let parser = FeedParser::new().unwrap();
        let feed: String = (0..4)
            .map(|i| format!("<entry><title>Paper {i}</title><summary>S{i}</summary></entry>"))
            .collect();
        let records = parser.parse(&feed);
        assert_eq!(records.len(), 4);
        assert_eq!(records[3].title, "Paper 3");
    }
}
