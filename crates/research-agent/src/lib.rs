//! Multi-source financial research
//!
//! This crate gathers financial research from three external sources and
//! asks a language model to synthesize it. It includes:
//!
//! - Source clients for web search (Tavily), academic preprints (arXiv) and
//!   market charts (Yahoo Finance)
//! - An Atom feed parser and a ticker symbol heuristic
//! - A prompt builder with a bounded and an unbounded layout
//! - [`ResearchAgent`], which runs the stages in order and keeps going when a
//!   source fails
//!
//! # Example
//!
//! ```rust,no_run
//! use research_agent::{ResearchAgent, ResearchConfig, ResearchQuery};
//! use research_llm::providers::OpenAIProvider;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let agent = ResearchAgent::builder()
//!         .config(ResearchConfig::from_env()?)
//!         .provider(Arc::new(OpenAIProvider::from_env()?))
//!         .build()?;
//!
//!     let result = agent
//!         .research(&ResearchQuery::new("ESG investing strategies"))
//!         .await?;
//!     println!("{}", serde_json::to_string_pretty(&result)?);
//!
//!     Ok(())
//! }
//! ```

pub mod analyst;
pub mod api;
pub mod config;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod parser;
pub mod prompt;
pub mod retry;
pub mod sources;
pub mod symbols;

// Re-export main types for convenience
pub use analyst::Analyst;
pub use api::{ArxivClient, TavilyClient, YahooChartClient};
pub use config::ResearchConfig;
pub use error::{ResearchError, Result};
pub use model::{
    AcademicRecord, AcademicResearch, MarketSnapshot, ResearchOptions, ResearchQuery,
    ResearchResult, SourceName, SourceResult, Sources, WebSearchResult,
};
pub use orchestrator::{ResearchAgent, ResearchAgentBuilder};
pub use parser::FeedParser;
pub use prompt::{PromptBuilder, PromptStyle};
pub use sources::{AcademicFeed, MarketData, WebSearch};
pub use symbols::SymbolExtractor;
