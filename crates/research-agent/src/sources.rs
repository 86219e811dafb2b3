//! External source contracts
//!
//! Each source performs one outbound request per call and reports transport
//! problems as errors. Sources never retry on their own and hold no state
//! that one call could change for another.

use crate::error::Result;
use crate::model::WebSearchResult;
use async_trait::async_trait;
use serde_json::Value;

/// Web search provider
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Ordered search hits for `query`
    async fn search(&self, query: &str) -> Result<Vec<WebSearchResult>>;
}

/// Academic preprint feed
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AcademicFeed: Send + Sync {
    /// Raw feed text for `query`
    async fn fetch_feed(&self, query: &str) -> Result<String>;
}

/// Market data provider
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Opaque market payload for `symbol`
    async fn fetch_quote(&self, symbol: &str) -> Result<Value>;
}
