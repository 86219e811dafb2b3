//! Research orchestration
//!
//! [`ResearchAgent::research`] runs four stages in a fixed order: web search,
//! academic search, market data, then AI synthesis. Every stage is isolated.
//! A failing source becomes a [`SourceResult::Failure`] in its slot and the
//! later stages still run; synthesis always runs, with whatever succeeded.
//! Only an invalid query is reported as an error.
//!
//! Tracing goes through an injected [`Tracer`]. With [`NoopTracer`] the
//! agent produces the same result without recording anything.

use crate::analyst::Analyst;
use crate::api::{ArxivClient, TavilyClient, YahooChartClient};
use crate::config::ResearchConfig;
use crate::error::{ResearchError, Result};
use crate::model::{
    AcademicResearch, MarketSnapshot, ResearchQuery, ResearchResult, SourceName, SourceResult,
    Sources, WebSearchResult,
};
use crate::parser::FeedParser;
use crate::prompt::PromptBuilder;
use crate::retry::{RetryPolicy, with_timeout};
use crate::sources::{AcademicFeed, MarketData, WebSearch};
use crate::symbols::{SymbolExtractor, select_symbols};
use chrono::Utc;
use research_llm::LLMProvider;
use research_trace::{NoopTracer, RunType, TraceScope, Tracer};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Name of the parent trace run for one research request
pub const RESEARCH_RUN_NAME: &str = "Financial Research Agent";

/// Name of the synthesis stage and its trace run
pub const ANALYSIS_STAGE: &str = "AI Analysis";

/// Query sent to web search for a research question
pub fn web_search_query(query: &str) -> String {
    format!("financial research {query} wealth management asset management")
}

/// Query sent to the academic feed for a research question
pub fn academic_query(query: &str) -> String {
    format!("finance wealth management asset management {query}")
}

/// Multi-source research agent
pub struct ResearchAgent {
    config: Arc<ResearchConfig>,
    web: Arc<dyn WebSearch>,
    academic: Arc<dyn AcademicFeed>,
    market: Arc<dyn MarketData>,
    analyst: Analyst,
    tracer: Arc<dyn Tracer>,
    parser: FeedParser,
    extractor: SymbolExtractor,
    prompts: PromptBuilder,
    retry: RetryPolicy,
}

impl ResearchAgent {
    /// Create a builder
    pub fn builder() -> ResearchAgentBuilder {
        ResearchAgentBuilder::default()
    }

    pub fn config(&self) -> &ResearchConfig {
        &self.config
    }

    /// Whether research runs are recorded by the tracer
    pub fn tracing_enabled(&self) -> bool {
        self.tracer.is_enabled()
    }

    /// Model used when a query does not name one
    pub fn default_model(&self) -> &str {
        &self.config.default_model
    }

    /// Research a query across the requested sources
    ///
    /// Fails only when the query is invalid. Every other failure is recorded
    /// in the returned result.
    #[instrument(skip(self, query), fields(query = %query.query))]
    pub async fn research(&self, query: &ResearchQuery) -> Result<ResearchResult> {
        query.validate()?;

        let model = query
            .model
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.config.default_model.clone());

        let inputs = json!({
            "query": query.query,
            "options": query.options,
            "symbols": query.symbols,
            "model": model,
        });

        TraceScope::new(Arc::clone(&self.tracer))
            .traced(RESEARCH_RUN_NAME, RunType::Chain, inputs, |scope| async move {
                Ok::<_, ResearchError>(self.run_stages(query, &model, &scope).await)
            })
            .await
    }

    /// Ask the model directly, optionally with caller context
    pub async fn analyze(
        &self,
        prompt: &str,
        context: Option<&str>,
        model: Option<&str>,
    ) -> Result<String> {
        if prompt.trim().is_empty() {
            return Err(ResearchError::Validation("Prompt is required".to_string()));
        }
        let model = model.unwrap_or(&self.config.default_model);
        let inputs = json!({ "prompt": prompt, "context": context, "model": model });

        TraceScope::new(Arc::clone(&self.tracer))
            .traced(ANALYSIS_STAGE, RunType::Llm, inputs, |_| {
                with_timeout(
                    ANALYSIS_STAGE,
                    self.config.model_timeout,
                    self.analyst.analyze(prompt, context, model),
                )
            })
            .await
    }

    async fn run_stages(
        &self,
        query: &ResearchQuery,
        model: &str,
        scope: &TraceScope,
    ) -> ResearchResult {
        let timestamp = Utc::now();
        let options = query.options;
        let mut sources = Sources::default();

        if options.web_search {
            sources.web_search = Some(self.web_stage(&query.query, scope).await);
        }

        if options.academic_research {
            sources.academic_research = Some(self.academic_stage(&query.query, scope).await);
        }

        if options.market_data {
            sources.market_data = Some(self.market_stage(query, scope).await);
        }

        let prompt = self.prompts.build(&query.query, &sources);
        info!(
            "Built analysis prompt ({} characters) from {} source(s)",
            prompt.chars().count(),
            sources.attempted().iter().filter(|(_, ok)| *ok).count()
        );

        let ai_analysis = self.synthesis_stage(&prompt, model, scope).await;

        ResearchResult {
            query: query.query.clone(),
            timestamp,
            sources,
            ai_analysis,
        }
    }

    /// One source call under the per-call time budget and retry policy
    async fn guarded<T, F, Fut>(&self, stage: &str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let budget = self.config.request_timeout;
        self.retry
            .execute(stage, || with_timeout(stage, budget, call()))
            .await
    }

    async fn web_stage(
        &self,
        query: &str,
        scope: &TraceScope,
    ) -> SourceResult<Vec<WebSearchResult>> {
        let stage = SourceName::WebSearch.stage_name();
        let shaped = web_search_query(query);
        info!("Starting {stage}");

        let result = scope
            .traced(stage, RunType::Tool, json!({ "query": shaped }), |_| {
                self.guarded(stage, || self.web.search(&shaped))
            })
            .await;

        log_outcome(stage, &result, |results| format!("{} results", results.len()));
        result.into()
    }

    async fn academic_stage(
        &self,
        query: &str,
        scope: &TraceScope,
    ) -> SourceResult<AcademicResearch> {
        let stage = SourceName::AcademicResearch.stage_name();
        let shaped = academic_query(query);
        info!("Starting {stage}");

        let result = scope
            .traced(stage, RunType::Tool, json!({ "query": shaped }), |_| async {
                let raw = self
                    .guarded(stage, || self.academic.fetch_feed(&shaped))
                    .await?;
                let parsed = self.parser.parse(&raw);
                Ok::<_, ResearchError>(AcademicResearch { raw, parsed })
            })
            .await;

        log_outcome(stage, &result, |academic| {
            format!("{} papers", academic.parsed.len())
        });
        result.into()
    }

    /// Symbols queried for a request: caller first, then extracted, capped;
    /// the default index when none remain
    pub fn market_symbols(&self, query: &ResearchQuery) -> Vec<String> {
        let extracted = self.extractor.extract(&query.query);
        let mut symbols = select_symbols(
            &query.normalized_symbols(),
            &extracted,
            self.config.max_symbols,
        );
        if symbols.is_empty() {
            symbols.push(self.config.default_index_symbol.clone());
        }
        symbols
    }

    async fn market_stage(
        &self,
        query: &ResearchQuery,
        scope: &TraceScope,
    ) -> SourceResult<MarketSnapshot> {
        let stage = SourceName::MarketData.stage_name();
        let symbols = self.market_symbols(query);
        info!("Starting {stage} for {}", symbols.join(", "));

        let result = scope
            .traced(stage, RunType::Tool, json!({ "symbols": symbols }), |_| async {
                let mut snapshot = MarketSnapshot::new();
                for symbol in &symbols {
                    let outcome = self
                        .guarded(stage, || self.market.fetch_quote(symbol))
                        .await;
                    let entry = match outcome {
                        Ok(payload) => SourceResult::success(payload),
                        Err(e) => {
                            warn!("Market data for {symbol} failed: {e}");
                            SourceResult::failure(format!("Failed to fetch data for {symbol}: {e}"))
                        }
                    };
                    snapshot.insert(symbol.clone(), entry);
                }

                if snapshot.available_symbols().next().is_none() {
                    let reasons: Vec<&str> = snapshot
                        .iter()
                        .filter_map(|(_, r)| r.failure_reason())
                        .collect();
                    return Err(ResearchError::transport(
                        "Market data",
                        format!("no symbol returned data ({})", reasons.join("; ")),
                    ));
                }
                Ok(snapshot)
            })
            .await;

        log_outcome(stage, &result, |snapshot| {
            format!(
                "{}/{} symbols",
                snapshot.available_symbols().count(),
                snapshot.len()
            )
        });
        result.into()
    }

    async fn synthesis_stage(
        &self,
        prompt: &str,
        model: &str,
        scope: &TraceScope,
    ) -> SourceResult<String> {
        info!("Starting {ANALYSIS_STAGE} with model {model}");
        debug!("Analysis prompt:\n{prompt}");

        let result = scope
            .traced(
                ANALYSIS_STAGE,
                RunType::Llm,
                json!({ "prompt": prompt, "model": model }),
                |_| {
                    with_timeout(
                        ANALYSIS_STAGE,
                        self.config.model_timeout,
                        self.analyst.analyze(prompt, None, model),
                    )
                },
            )
            .await;

        log_outcome(ANALYSIS_STAGE, &result, |text| {
            format!("{} characters", text.chars().count())
        });
        result.into()
    }
}

fn log_outcome<T>(stage: &str, result: &Result<T>, summary: impl FnOnce(&T) -> String) {
    match result {
        Ok(value) => info!("{stage} completed: {}", summary(value)),
        Err(e) => warn!("{stage} failed: {e}"),
    }
}

impl std::fmt::Debug for ResearchAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResearchAgent")
            .field("config", &self.config)
            .field("analyst", &self.analyst)
            .field("tracing_enabled", &self.tracer.is_enabled())
            .finish_non_exhaustive()
    }
}

/// Builder for ResearchAgent
///
/// Sources left unset are created from the configuration as HTTP clients.
/// A language-model provider is required.
#[derive(Default)]
pub struct ResearchAgentBuilder {
    config: Option<ResearchConfig>,
    web: Option<Arc<dyn WebSearch>>,
    academic: Option<Arc<dyn AcademicFeed>>,
    market: Option<Arc<dyn MarketData>>,
    provider: Option<Arc<dyn LLMProvider>>,
    tracer: Option<Arc<dyn Tracer>>,
}

impl ResearchAgentBuilder {
    /// Set the configuration
    pub fn config(mut self, config: ResearchConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the web search source
    pub fn web_search(mut self, web: Arc<dyn WebSearch>) -> Self {
        self.web = Some(web);
        self
    }

    /// Set the academic feed source
    pub fn academic_feed(mut self, academic: Arc<dyn AcademicFeed>) -> Self {
        self.academic = Some(academic);
        self
    }

    /// Set the market data source
    pub fn market_data(mut self, market: Arc<dyn MarketData>) -> Self {
        self.market = Some(market);
        self
    }

    /// Set the language-model provider
    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the tracer; defaults to [`NoopTracer`]
    pub fn tracer(mut self, tracer: Arc<dyn Tracer>) -> Self {
        self.tracer = Some(tracer);
        self
    }

    /// Build the agent
    pub fn build(self) -> Result<ResearchAgent> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let provider = self.provider.ok_or_else(|| {
            ResearchError::Config("a language model provider is required".to_string())
        })?;

        let web: Arc<dyn WebSearch> = match self.web {
            Some(web) => web,
            None => Arc::new(TavilyClient::new(&config)?),
        };
        let academic: Arc<dyn AcademicFeed> = match self.academic {
            Some(academic) => academic,
            None => Arc::new(ArxivClient::new(&config)?),
        };
        let market: Arc<dyn MarketData> = match self.market {
            Some(market) => market,
            None => Arc::new(YahooChartClient::new(&config)?),
        };

        Ok(ResearchAgent {
            analyst: Analyst::new(provider, config.temperature),
            prompts: PromptBuilder::new(config.prompt_style),
            retry: RetryPolicy::from_config(&config),
            parser: FeedParser::new()?,
            extractor: SymbolExtractor::new()?,
            tracer: self.tracer.unwrap_or_else(|| Arc::new(NoopTracer)),
            config: Arc::new(config),
            web,
            academic,
            market,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ResearchOptions;
    use crate::prompt::{PromptStyle, TRUNCATION_MARKER};
    use crate::sources::{MockAcademicFeed, MockMarketData, MockWebSearch};
    use async_trait::async_trait;
    use research_llm::{
        CompletionRequest, CompletionResponse, LLMError, Message, StopReason, TokenUsage,
    };
    use research_trace::MemoryTracer;
    use std::sync::Mutex;
    use std::time::Duration;

    const FEED_ONE_ENTRY: &str = "<feed><entry><id>http://arxiv.org/abs/1</id>\
        <title>ESG Portfolios</title><summary>Returns of ESG tilts.</summary>\
        <link title=\"pdf\" href=\"http://arxiv.org/pdf/1\"/></entry></feed>";

    /// Provider that answers with fixed text and records the prompts it saw
    struct ScriptedProvider {
        reply: std::result::Result<String, String>,
        prompts: Mutex<Vec<String>>,
        models: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
                models: Mutex::new(Vec::new()),
            })
        }

        fn failing(reason: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(reason.to_string()),
                prompts: Mutex::new(Vec::new()),
                models: Mutex::new(Vec::new()),
            })
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LLMProvider for ScriptedProvider {
        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> research_llm::Result<CompletionResponse> {
            assert_eq!(request.messages.len(), 1);
            assert_eq!(request.temperature, Some(0.1));
            self.prompts
                .lock()
                .unwrap()
                .push(request.messages[0].content.clone());
            self.models.lock().unwrap().push(request.model.clone());

            match &self.reply {
                Ok(text) => Ok(CompletionResponse {
                    message: Message::assistant(text.clone()),
                    stop_reason: StopReason::EndTurn,
                    usage: TokenUsage::default(),
                }),
                Err(reason) => Err(LLMError::RequestFailed(reason.clone())),
            }
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn hit(title: &str, content: &str) -> WebSearchResult {
        WebSearchResult {
            title: Some(title.to_string()),
            url: format!("https://news.example.com/{title}"),
            content: Some(content.to_string()),
            score: Some(0.9),
        }
    }

    fn failing_web() -> MockWebSearch {
        let mut web = MockWebSearch::new();
        web.expect_search()
            .returning(|_| Err(ResearchError::transport("Tavily", "API error 500: down")));
        web
    }

    fn failing_academic() -> MockAcademicFeed {
        let mut academic = MockAcademicFeed::new();
        academic
            .expect_fetch_feed()
            .returning(|_| Err(ResearchError::transport("arXiv", "connection reset")));
        academic
    }

    fn failing_market() -> MockMarketData {
        let mut market = MockMarketData::new();
        market
            .expect_fetch_quote()
            .returning(|_| Err(ResearchError::transport("Yahoo Finance", "API error 404")));
        market
    }

    fn agent(
        web: MockWebSearch,
        academic: MockAcademicFeed,
        market: MockMarketData,
        provider: Arc<ScriptedProvider>,
    ) -> ResearchAgent {
        ResearchAgent::builder()
            .web_search(Arc::new(web))
            .academic_feed(Arc::new(academic))
            .market_data(Arc::new(market))
            .provider(provider)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_all_flags_off_still_synthesizes() {
        let mut web = MockWebSearch::new();
        web.expect_search().never();
        let mut academic = MockAcademicFeed::new();
        academic.expect_fetch_feed().never();
        let mut market = MockMarketData::new();
        market.expect_fetch_quote().never();

        let provider = ScriptedProvider::replying("General guidance");
        let agent = agent(web, academic, market, provider.clone());

        let query = ResearchQuery::new("retirement income").with_options(ResearchOptions::none());
        let result = agent.research(&query).await.unwrap();

        assert!(result.sources.is_empty());
        assert_eq!(result.ai_analysis.data().map(String::as_str), Some("General guidance"));
        assert_eq!(provider.prompts().len(), 1);
        assert!(provider.prompts()[0].contains("\"retirement income\""));
    }

    #[tokio::test]
    async fn test_model_failure_is_recorded_not_raised() {
        let mut web = MockWebSearch::new();
        web.expect_search().never();
        let agent = agent(
            web,
            MockAcademicFeed::new(),
            MockMarketData::new(),
            ScriptedProvider::failing("upstream 503"),
        );

        let query = ResearchQuery::new("bonds").with_options(ResearchOptions::none());
        let result = agent.research(&query).await.unwrap();

        let reason = result.ai_analysis.failure_reason().unwrap();
        assert!(reason.contains("upstream 503"));
    }

    #[tokio::test]
    async fn test_every_source_failing_still_returns_result() {
        let provider = ScriptedProvider::replying("Limited data analysis");
        let agent = agent(
            failing_web(),
            failing_academic(),
            failing_market(),
            provider.clone(),
        );

        let result = agent
            .research(&ResearchQuery::new("Research AAPL outlook"))
            .await
            .unwrap();

        assert!(result.sources.failure_reason(SourceName::WebSearch).is_some());
        assert!(
            result
                .sources
                .failure_reason(SourceName::AcademicResearch)
                .unwrap()
                .contains("connection reset")
        );
        let market_reason = result.sources.failure_reason(SourceName::MarketData).unwrap();
        assert!(market_reason.contains("Failed to fetch data for AAPL"));
        assert!(result.ai_analysis.is_success());

        let prompt = &provider.prompts()[0];
        assert!(!prompt.contains("WEB SEARCH RESULTS"));
        assert!(!prompt.contains("ACADEMIC RESEARCH"));
        assert!(!prompt.contains("MARKET DATA AVAILABLE"));
        assert!(prompt.contains("Please provide:"));
    }

    #[tokio::test]
    async fn test_each_source_fails_independently() {
        // Only the web source fails
        let mut academic = MockAcademicFeed::new();
        academic
            .expect_fetch_feed()
            .returning(|_| Ok(FEED_ONE_ENTRY.to_string()));
        let mut market = MockMarketData::new();
        market
            .expect_fetch_quote()
            .returning(|s| Ok(json!({ "symbol": s })));

        let agent = agent(
            failing_web(),
            academic,
            market,
            ScriptedProvider::replying("ok"),
        );
        let result = agent.research(&ResearchQuery::new("bonds")).await.unwrap();

        assert!(!result.sources.web_search.as_ref().unwrap().is_success());
        assert!(result.sources.academic_research.as_ref().unwrap().is_success());
        assert!(result.sources.market_data.as_ref().unwrap().is_success());
    }

    #[tokio::test]
    async fn test_per_symbol_isolation() {
        let mut market = MockMarketData::new();
        market.expect_fetch_quote().returning(|s| {
            if s == "MSFT" {
                Err(ResearchError::transport("Yahoo Finance", "API error 404"))
            } else {
                Ok(json!({ "symbol": s }))
            }
        });

        let provider = ScriptedProvider::replying("ok");
        let agent = agent(
            MockWebSearch::new(),
            MockAcademicFeed::new(),
            market,
            provider.clone(),
        );
        let query = ResearchQuery::new("Research AAPL and MSFT trends").with_options(
            ResearchOptions {
                market_data: true,
                ..ResearchOptions::none()
            },
        );
        let result = agent.research(&query).await.unwrap();

        let snapshot = result.sources.market_data.unwrap();
        let snapshot = snapshot.data().unwrap();
        assert!(snapshot.get("AAPL").unwrap().is_success());
        assert!(
            snapshot
                .get("MSFT")
                .unwrap()
                .failure_reason()
                .unwrap()
                .starts_with("Failed to fetch data for MSFT")
        );
        assert!(provider.prompts()[0].contains("MARKET DATA AVAILABLE FOR: AAPL, MSFT\n"));
    }

    #[tokio::test]
    async fn test_market_fan_out_is_capped_caller_first() {
        let queried = Arc::new(Mutex::new(Vec::new()));
        let seen = queried.clone();
        let mut market = MockMarketData::new();
        market.expect_fetch_quote().times(5).returning(move |s| {
            seen.lock().unwrap().push(s.to_string());
            Ok(json!({}))
        });

        let agent = agent(
            MockWebSearch::new(),
            MockAcademicFeed::new(),
            market,
            ScriptedProvider::replying("ok"),
        );
        let query = ResearchQuery::new("Compare AAPL MSFT NVDA AMZN META")
            .with_symbols(["jpm", "GS"])
            .with_options(ResearchOptions {
                market_data: true,
                ..ResearchOptions::none()
            });

        let result = agent.research(&query).await.unwrap();
        let expected = vec!["JPM", "GS", "AAPL", "MSFT", "NVDA"];
        assert_eq!(*queried.lock().unwrap(), expected);

        let snapshot = result.sources.market_data.unwrap();
        assert_eq!(
            snapshot.data().unwrap().symbols().collect::<Vec<_>>(),
            expected
        );
    }

    #[tokio::test]
    async fn test_validation_fails_before_any_stage() {
        let mut web = MockWebSearch::new();
        web.expect_search().never();
        let provider = ScriptedProvider::replying("unused");
        let tracer = Arc::new(MemoryTracer::new());

        let agent = ResearchAgent::builder()
            .web_search(Arc::new(web))
            .academic_feed(Arc::new(MockAcademicFeed::new()))
            .market_data(Arc::new(MockMarketData::new()))
            .provider(provider.clone())
            .tracer(tracer.clone())
            .build()
            .unwrap();

        let err = agent.research(&ResearchQuery::new("  ")).await.unwrap_err();
        assert!(matches!(err, ResearchError::Validation(_)));
        assert!(provider.prompts().is_empty());
        assert!(tracer.runs().is_empty());
    }

    #[tokio::test]
    async fn test_esg_scenario_end_to_end() {
        let mut web = MockWebSearch::new();
        web.expect_search()
            .withf(|q| {
                q == "financial research ESG investing strategies wealth management asset management"
            })
            .times(1)
            .returning(|_| {
                Ok(vec![
                    hit("ESG flows", "Record inflows"),
                    hit("Green bonds", "Issuance up"),
                ])
            });

        let mut academic = MockAcademicFeed::new();
        academic
            .expect_fetch_feed()
            .withf(|q| q == "finance wealth management asset management ESG investing strategies")
            .times(1)
            .returning(|_| Ok(FEED_ONE_ENTRY.to_string()));

        let mut market = MockMarketData::new();
        market
            .expect_fetch_quote()
            .withf(|s| s == "SPY")
            .times(1)
            .returning(|_| Ok(json!({ "chart": { "result": [] } })));

        let provider = ScriptedProvider::replying("ESG strategies show durable demand.");
        let agent = agent(web, academic, market, provider.clone());

        let result = agent
            .research(&ResearchQuery::new("ESG investing strategies"))
            .await
            .unwrap();

        assert_eq!(result.query, "ESG investing strategies");
        assert_eq!(result.sources.web_search.as_ref().unwrap().data().unwrap().len(), 2);

        let academic = result.sources.academic_research.as_ref().unwrap().data().unwrap();
        assert_eq!(academic.parsed.len(), 1);
        assert_eq!(academic.raw, FEED_ONE_ENTRY);
        assert_eq!(academic.parsed[0].pdf_link, "http://arxiv.org/pdf/1");

        let market = result.sources.market_data.as_ref().unwrap().data().unwrap();
        assert_eq!(market.symbols().collect::<Vec<_>>(), vec!["SPY"]);

        assert_eq!(
            result.ai_analysis.data().map(String::as_str),
            Some("ESG strategies show durable demand.")
        );

        let prompt = &provider.prompts()[0];
        assert!(prompt.contains("1. ESG flows: Record inflows\n2. Green bonds: Issuance up\n"));
        assert!(prompt.contains("1. ESG Portfolios: Returns of ESG tilts.\n"));
        assert!(prompt.contains("MARKET DATA AVAILABLE FOR: SPY\n"));

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["sources"]["webSearch"]["status"], "success");
        assert_eq!(json["sources"]["marketData"]["data"]["SPY"]["status"], "success");
        assert_eq!(json["aiAnalysis"]["status"], "success");
    }

    #[tokio::test]
    async fn test_query_model_overrides_default() {
        let provider = ScriptedProvider::replying("ok");
        let agent = agent(
            MockWebSearch::new(),
            MockAcademicFeed::new(),
            MockMarketData::new(),
            provider.clone(),
        );

        let query = ResearchQuery::new("q")
            .with_options(ResearchOptions::none())
            .with_model("gpt-4o-mini");
        agent.research(&query).await.unwrap();
        agent
            .research(&ResearchQuery::new("q").with_options(ResearchOptions::none()))
            .await
            .unwrap();

        let models = provider.models.lock().unwrap().clone();
        assert_eq!(models, vec!["gpt-4o-mini", "gpt-3.5-turbo"]);
    }

    #[tokio::test]
    async fn test_long_prompt_is_truncated_before_model_call() {
        let long = "z".repeat(2000);
        let mut web = MockWebSearch::new();
        web.expect_search().returning(move |_| {
            Ok((0..3).map(|i| hit(&format!("{i}{}", "T".repeat(1500)), &long)).collect())
        });

        let provider = ScriptedProvider::replying("ok");
        let agent = agent(
            web,
            MockAcademicFeed::new(),
            MockMarketData::new(),
            provider.clone(),
        );
        let query = ResearchQuery::new("q").with_options(ResearchOptions {
            web_search: true,
            ..ResearchOptions::none()
        });
        agent.research(&query).await.unwrap();

        let prompt = &provider.prompts()[0];
        assert!(prompt.ends_with(TRUNCATION_MARKER));
        assert_eq!(prompt.chars().count(), 4000 + TRUNCATION_MARKER.chars().count());
    }

    #[tokio::test]
    async fn test_simple_style_is_unbounded() {
        let long = "z".repeat(2000);
        let mut web = MockWebSearch::new();
        web.expect_search()
            .returning(move |_| Ok((0..5).map(|i| hit(&i.to_string(), &long)).collect()));

        let provider = ScriptedProvider::replying("ok");
        let agent = ResearchAgent::builder()
            .config(
                ResearchConfig::builder()
                    .prompt_style(PromptStyle::Simple)
                    .build()
                    .unwrap(),
            )
            .web_search(Arc::new(web))
            .academic_feed(Arc::new(MockAcademicFeed::new()))
            .market_data(Arc::new(MockMarketData::new()))
            .provider(provider.clone())
            .build()
            .unwrap();

        let query = ResearchQuery::new("q").with_options(ResearchOptions {
            web_search: true,
            ..ResearchOptions::none()
        });
        agent.research(&query).await.unwrap();

        let prompt = &provider.prompts()[0];
        assert!(prompt.chars().count() > 10_000);
        assert!(!prompt.contains("[Content truncated"));
    }

    #[tokio::test]
    async fn test_slow_source_times_out() {
        struct SlowFeed;

        #[async_trait]
        impl AcademicFeed for SlowFeed {
            async fn fetch_feed(&self, _query: &str) -> Result<String> {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(String::new())
            }
        }

        let agent = ResearchAgent::builder()
            .config(
                ResearchConfig::builder()
                    .request_timeout(Duration::from_millis(20))
                    .build()
                    .unwrap(),
            )
            .web_search(Arc::new(MockWebSearch::new()))
            .academic_feed(Arc::new(SlowFeed))
            .market_data(Arc::new(MockMarketData::new()))
            .provider(ScriptedProvider::replying("ok"))
            .build()
            .unwrap();

        let query = ResearchQuery::new("q").with_options(ResearchOptions {
            academic_research: true,
            ..ResearchOptions::none()
        });
        let result = agent.research(&query).await.unwrap();

        let reason = result
            .sources
            .failure_reason(SourceName::AcademicResearch)
            .unwrap();
        assert!(reason.contains("timed out"));
        assert!(result.ai_analysis.is_success());
    }

    #[tokio::test]
    async fn test_retries_when_configured() {
        let mut web = MockWebSearch::new();
        let mut calls = 0;
        web.expect_search().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Err(ResearchError::transport("Tavily", "API error 502"))
            } else {
                Ok(vec![hit("A", "a")])
            }
        });

        let agent = ResearchAgent::builder()
            .config(
                ResearchConfig::builder()
                    .max_attempts(2)
                    .retry_backoff_base(Duration::from_millis(1))
                    .build()
                    .unwrap(),
            )
            .web_search(Arc::new(web))
            .academic_feed(Arc::new(MockAcademicFeed::new()))
            .market_data(Arc::new(MockMarketData::new()))
            .provider(ScriptedProvider::replying("ok"))
            .build()
            .unwrap();

        let query = ResearchQuery::new("q").with_options(ResearchOptions {
            web_search: true,
            ..ResearchOptions::none()
        });
        let result = agent.research(&query).await.unwrap();
        assert!(result.sources.web_search.unwrap().is_success());
    }

    #[tokio::test]
    async fn test_traced_and_untraced_results_match() {
        fn sources() -> (MockWebSearch, MockAcademicFeed, MockMarketData) {
            let mut web = MockWebSearch::new();
            web.expect_search().returning(|_| Ok(vec![hit("A", "a")]));
            (web, failing_academic(), failing_market())
        }

        let (web, academic, market) = sources();
        let untraced = agent(web, academic, market, ScriptedProvider::replying("same"));

        let (web, academic, market) = sources();
        let tracer = Arc::new(MemoryTracer::new());
        let traced = ResearchAgent::builder()
            .web_search(Arc::new(web))
            .academic_feed(Arc::new(academic))
            .market_data(Arc::new(market))
            .provider(ScriptedProvider::replying("same"))
            .tracer(tracer.clone())
            .build()
            .unwrap();
        assert!(traced.tracing_enabled());
        assert!(!untraced.tracing_enabled());

        let query = ResearchQuery::new("Research AAPL");
        let a = untraced.research(&query).await.unwrap();
        let b = traced.research(&query).await.unwrap();

        assert_eq!(a.sources, b.sources);
        assert_eq!(a.ai_analysis, b.ai_analysis);

        let root = tracer.find(RESEARCH_RUN_NAME).unwrap();
        assert_eq!(root.run_type, RunType::Chain);
        assert_eq!(root.inputs["query"], "Research AAPL");
        assert!(root.is_finished());

        let children = tracer.children_of(root.id);
        let names: Vec<&str> = children.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Web Search", "Academic Research", "Market Data", ANALYSIS_STAGE]
        );
        assert!(children[1].error.as_deref().unwrap().contains("connection reset"));
        assert_eq!(children[3].run_type, RunType::Llm);
    }

    #[tokio::test]
    async fn test_tracer_failures_do_not_change_result() {
        let mut web = MockWebSearch::new();
        web.expect_search().returning(|_| Ok(vec![hit("A", "a")]));

        let agent = ResearchAgent::builder()
            .web_search(Arc::new(web))
            .academic_feed(Arc::new(MockAcademicFeed::new()))
            .market_data(Arc::new(MockMarketData::new()))
            .provider(ScriptedProvider::replying("fine"))
            .tracer(Arc::new(MemoryTracer::rejecting_creates()))
            .build()
            .unwrap();

        let query = ResearchQuery::new("q").with_options(ResearchOptions {
            web_search: true,
            ..ResearchOptions::none()
        });
        let result = agent.research(&query).await.unwrap();
        assert!(result.sources.web_search.unwrap().is_success());
        assert_eq!(result.ai_analysis.data().map(String::as_str), Some("fine"));
    }

    #[tokio::test]
    async fn test_analyze_with_context() {
        let provider = ScriptedProvider::replying("Reduce duration");
        let agent = agent(
            MockWebSearch::new(),
            MockAcademicFeed::new(),
            MockMarketData::new(),
            provider.clone(),
        );

        let text = agent
            .analyze("Assess rate risk", Some("Bond-heavy portfolio"), None)
            .await
            .unwrap();
        assert_eq!(text, "Reduce duration");
        assert_eq!(
            provider.prompts()[0],
            "Context: Bond-heavy portfolio\n\nAnalysis Request: Assess rate risk"
        );

        let err = agent.analyze(" ", None, None).await.unwrap_err();
        assert!(matches!(err, ResearchError::Validation(_)));
    }

    #[test]
    fn test_builder_requires_provider() {
        let err = ResearchAgent::builder().build().unwrap_err();
        assert!(matches!(err, ResearchError::Config(_)));
    }

    #[test]
    fn test_market_symbols_default_index() {
        let agent = agent(
            MockWebSearch::new(),
            MockAcademicFeed::new(),
            MockMarketData::new(),
            ScriptedProvider::replying("ok"),
        );
        assert_eq!(
            agent.market_symbols(&ResearchQuery::new("ESG investing strategies")),
            vec!["SPY"]
        );
        assert_eq!(
            agent.market_symbols(&ResearchQuery::new("Research AAPL and MSFT trends")),
            vec!["AAPL", "MSFT"]
        );
    }

    #[test]
    fn test_query_shaping() {
        assert_eq!(
            web_search_query("ESG"),
            "financial research ESG wealth management asset management"
        );
        assert_eq!(
            academic_query("ESG"),
            "finance wealth management asset management ESG"
        );
    }
}
