//! Configuration for research operations

use crate::error::{ResearchError, Result};
use crate::prompt::PromptStyle;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_TAVILY_API_BASE: &str = "https://api.tavily.com";
const DEFAULT_ARXIV_API_BASE: &str = "http://export.arxiv.org/api/query";
const DEFAULT_MARKET_API_BASE: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Configuration for research operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchConfig {
    /// Tavily API key; the web stage fails without one
    #[serde(skip_serializing)]
    pub tavily_api_key: Option<String>,

    /// Tavily API base URL
    pub tavily_api_base: String,

    /// arXiv query endpoint
    pub arxiv_api_base: String,

    /// Chart endpoint; the symbol is appended as a path segment
    pub market_api_base: String,

    /// Model used when a query does not name one
    pub default_model: String,

    /// Time budget for a single source call
    pub request_timeout: Duration,

    /// Time budget for the model call
    pub model_timeout: Duration,

    /// Attempts per source call (1 means no retries)
    pub max_attempts: u32,

    /// Initial backoff duration for retries
    pub retry_backoff_base: Duration,

    /// Maximum number of symbols queried per request
    pub max_symbols: usize,

    /// Symbol queried when no symbol is supplied or found
    pub default_index_symbol: String,

    /// Results requested from web search
    pub web_max_results: usize,

    /// Papers requested from the academic feed
    pub academic_max_results: usize,

    /// Market data requests allowed per minute
    pub market_rate_limit_per_minute: u32,

    /// Prompt layout and length budget
    pub prompt_style: PromptStyle,

    /// Sampling temperature for the model call
    pub temperature: f32,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            tavily_api_key: None,
            tavily_api_base: DEFAULT_TAVILY_API_BASE.to_string(),
            arxiv_api_base: DEFAULT_ARXIV_API_BASE.to_string(),
            market_api_base: DEFAULT_MARKET_API_BASE.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            request_timeout: Duration::from_secs(10),
            model_timeout: Duration::from_secs(60),
            max_attempts: 1,
            retry_backoff_base: Duration::from_millis(500),
            max_symbols: 5,
            default_index_symbol: "SPY".to_string(),
            web_max_results: 10,
            academic_max_results: 5,
            market_rate_limit_per_minute: 60,
            prompt_style: PromptStyle::Detailed,
            temperature: 0.1,
        }
    }
}

impl ResearchConfig {
    /// Create a new configuration builder
    pub fn builder() -> ResearchConfigBuilder {
        ResearchConfigBuilder::default()
    }

    /// Defaults overlaid with `TAVILY_API_KEY` and `OPENAI_MODEL`
    pub fn from_env() -> Result<Self> {
        let config = Self::default().with_env();
        config.validate()?;
        Ok(config)
    }

    /// Fill unset values from the environment
    pub fn with_env(mut self) -> Self {
        if self.tavily_api_key.is_none() {
            self.tavily_api_key = research_utils::non_empty_env("TAVILY_API_KEY");
        }
        if let Some(model) = research_utils::non_empty_env("OPENAI_MODEL") {
            self.default_model = model;
        }
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(ResearchError::Config(
                "max_attempts must be greater than 0".to_string(),
            ));
        }

        if self.max_symbols == 0 {
            return Err(ResearchError::Config(
                "max_symbols must be greater than 0".to_string(),
            ));
        }

        if self.default_index_symbol.trim().is_empty() {
            return Err(ResearchError::Config(
                "default_index_symbol must not be empty".to_string(),
            ));
        }

        if self.web_max_results == 0 || self.academic_max_results == 0 {
            return Err(ResearchError::Config(
                "result limits must be greater than 0".to_string(),
            ));
        }

        if self.request_timeout.is_zero() || self.model_timeout.is_zero() {
            return Err(ResearchError::Config(
                "timeouts must be greater than 0".to_string(),
            ));
        }

        if self.market_rate_limit_per_minute == 0 {
            return Err(ResearchError::Config(
                "market_rate_limit_per_minute must be greater than 0".to_string(),
            ));
        }

        if self.default_model.trim().is_empty() {
            return Err(ResearchError::Config(
                "default_model must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Get retry backoff duration before the given retry (1-based)
    pub fn retry_backoff(&self, retry: u32) -> Duration {
        self.retry_backoff_base * 2_u32.saturating_pow(retry.saturating_sub(1))
    }
}

/// Builder for ResearchConfig
#[derive(Debug, Default)]
pub struct ResearchConfigBuilder {
    tavily_api_key: Option<String>,
    tavily_api_base: Option<String>,
    arxiv_api_base: Option<String>,
    market_api_base: Option<String>,
    default_model: Option<String>,
    request_timeout: Option<Duration>,
    model_timeout: Option<Duration>,
    max_attempts: Option<u32>,
    retry_backoff_base: Option<Duration>,
    max_symbols: Option<usize>,
    default_index_symbol: Option<String>,
    web_max_results: Option<usize>,
    academic_max_results: Option<usize>,
    market_rate_limit_per_minute: Option<u32>,
    prompt_style: Option<PromptStyle>,
    temperature: Option<f32>,
}

impl ResearchConfigBuilder {
    /// Set the Tavily API key
    pub fn tavily_api_key(mut self, key: impl Into<String>) -> Self {
        self.tavily_api_key = Some(key.into());
        self
    }

    /// Set the Tavily base URL
    pub fn tavily_api_base(mut self, base: impl Into<String>) -> Self {
        self.tavily_api_base = Some(base.into());
        self
    }

    /// Set the arXiv query endpoint
    pub fn arxiv_api_base(mut self, base: impl Into<String>) -> Self {
        self.arxiv_api_base = Some(base.into());
        self
    }

    /// Set the market chart endpoint
    pub fn market_api_base(mut self, base: impl Into<String>) -> Self {
        self.market_api_base = Some(base.into());
        self
    }

    /// Set the default model
    pub fn default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    /// Set the per-source timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Set the model call timeout
    pub fn model_timeout(mut self, duration: Duration) -> Self {
        self.model_timeout = Some(duration);
        self
    }

    /// Set attempts per source call
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Set retry backoff base duration
    pub fn retry_backoff_base(mut self, duration: Duration) -> Self {
        self.retry_backoff_base = Some(duration);
        self
    }

    /// Set the symbol cap
    pub fn max_symbols(mut self, max: usize) -> Self {
        self.max_symbols = Some(max);
        self
    }

    /// Set the fallback index symbol
    pub fn default_index_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.default_index_symbol = Some(symbol.into());
        self
    }

    /// Set the number of web search results requested
    pub fn web_max_results(mut self, max: usize) -> Self {
        self.web_max_results = Some(max);
        self
    }

    /// Set the number of papers requested from the academic feed
    pub fn academic_max_results(mut self, max: usize) -> Self {
        self.academic_max_results = Some(max);
        self
    }

    /// Set the market request rate limit
    pub fn market_rate_limit_per_minute(mut self, limit: u32) -> Self {
        self.market_rate_limit_per_minute = Some(limit);
        self
    }

    /// Set the prompt style
    pub fn prompt_style(mut self, style: PromptStyle) -> Self {
        self.prompt_style = Some(style);
        self
    }

    /// Set the sampling temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Load the Tavily API key from environment
    pub fn with_env_api_key(mut self) -> Self {
        if self.tavily_api_key.is_none() {
            self.tavily_api_key = research_utils::non_empty_env("TAVILY_API_KEY");
        }
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<ResearchConfig> {
        let defaults = ResearchConfig::default();

        let config = ResearchConfig {
            tavily_api_key: self.tavily_api_key,
            tavily_api_base: self.tavily_api_base.unwrap_or(defaults.tavily_api_base),
            arxiv_api_base: self.arxiv_api_base.unwrap_or(defaults.arxiv_api_base),
            market_api_base: self.market_api_base.unwrap_or(defaults.market_api_base),
            default_model: self.default_model.unwrap_or(defaults.default_model),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            model_timeout: self.model_timeout.unwrap_or(defaults.model_timeout),
            max_attempts: self.max_attempts.unwrap_or(defaults.max_attempts),
            retry_backoff_base: self
                .retry_backoff_base
                .unwrap_or(defaults.retry_backoff_base),
            max_symbols: self.max_symbols.unwrap_or(defaults.max_symbols),
            default_index_symbol: self
                .default_index_symbol
                .unwrap_or(defaults.default_index_symbol),
            web_max_results: self.web_max_results.unwrap_or(defaults.web_max_results),
            academic_max_results: self
                .academic_max_results
                .unwrap_or(defaults.academic_max_results),
            market_rate_limit_per_minute: self
                .market_rate_limit_per_minute
                .unwrap_or(defaults.market_rate_limit_per_minute),
            prompt_style: self.prompt_style.unwrap_or(defaults.prompt_style),
            temperature: self.temperature.unwrap_or(defaults.temperature),
        };

        config.validate()?;
        Ok(config)
    }
}
