//! Subcommand handlers

use crate::cli::{ApiKeys, ResearchArgs};
use crate::output::{ResearchResponse, search_table, summary_table};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use research_agent::{
    PromptStyle, ResearchAgent, ResearchConfig, ResearchOptions, ResearchQuery, TavilyClient,
    WebSearch,
};
use research_llm::providers::{OpenAIConfig, OpenAIProvider};
use research_llm::{CompletionRequest, CompletionResponse, LLMError, LLMProvider};
use research_trace::{LangSmithTracer, NoopTracer, RunType, TraceConfig, TraceScope, Tracer};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// Stands in for the model when no OpenAI key is available
///
/// Research still runs; the analysis section reports the missing key.
struct MissingKeyProvider;

#[async_trait]
impl LLMProvider for MissingKeyProvider {
    async fn complete(&self, _request: CompletionRequest) -> research_llm::Result<CompletionResponse> {
        Err(LLMError::ConfigurationError(
            "OpenAI API key not configured".to_string(),
        ))
    }

    fn name(&self) -> &str {
        "unconfigured"
    }
}

fn research_config(keys: &ApiKeys, style: PromptStyle) -> Result<ResearchConfig> {
    let mut config = ResearchConfig::default();
    config.tavily_api_key.clone_from(&keys.tavily_key);
    config.prompt_style = style;
    let config = config.with_env();
    config.validate()?;
    Ok(config)
}

fn build_provider(keys: &ApiKeys) -> Result<Arc<dyn LLMProvider>> {
    match OpenAIConfig::from_key_or_env(keys.openai_key.clone()) {
        Ok(config) => Ok(Arc::new(OpenAIProvider::with_config(config)?)),
        Err(e) => {
            warn!("{e}; analysis will be unavailable");
            Ok(Arc::new(MissingKeyProvider))
        }
    }
}

fn build_tracer(keys: &ApiKeys) -> Result<Arc<dyn Tracer>> {
    let config = TraceConfig::from_env().with_api_key(keys.langsmith_key.clone());
    Ok(config.into_tracer()?)
}

pub async fn research(keys: &ApiKeys, args: ResearchArgs) -> Result<()> {
    let style = if args.simple {
        PromptStyle::Simple
    } else {
        PromptStyle::Detailed
    };
    let tracer: Arc<dyn Tracer> = if args.simple {
        Arc::new(NoopTracer)
    } else {
        build_tracer(keys)?
    };

    let agent = ResearchAgent::builder()
        .config(research_config(keys, style)?)
        .provider(build_provider(keys)?)
        .tracer(tracer)
        .build()?;

    let mut query = ResearchQuery::new(args.query)
        .with_options(ResearchOptions {
            web_search: !args.no_web,
            academic_research: !args.no_academic,
            market_data: !args.no_market,
        })
        .with_symbols(args.symbols);
    if let Some(model) = args.model {
        query = query.with_model(model);
    }

    info!(
        "Researching \"{}\" (tracing {})",
        query.query,
        if agent.tracing_enabled() { "on" } else { "off" }
    );
    let result = agent.research(&query).await?;
    let model = query.model.as_deref().unwrap_or(agent.default_model());

    if args.json {
        let response = ResearchResponse::new(&result, model, agent.tracing_enabled());
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!("{}", summary_table(&result));
    println!();
    match result.ai_analysis.data() {
        Some(text) => println!("{text}"),
        None => println!(
            "AI analysis unavailable: {}",
            result.ai_analysis.failure_reason().unwrap_or("unknown error")
        ),
    }
    Ok(())
}

pub async fn search(keys: &ApiKeys, query: &str, as_json: bool) -> Result<()> {
    let config = research_config(keys, PromptStyle::default())?;
    let client = TavilyClient::new(&config)?;
    if !client.has_api_key() {
        bail!("Tavily API key not configured (set TAVILY_API_KEY or pass --tavily-key)");
    }

    let results = client.search(query).await?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&json!({ "results": results }))?);
    } else {
        println!("{}", search_table(&results));
    }
    Ok(())
}

pub async fn analyze(
    keys: &ApiKeys,
    prompt: &str,
    context: Option<&str>,
    model: Option<&str>,
) -> Result<()> {
    let config = OpenAIConfig::from_key_or_env(keys.openai_key.clone())
        .context("OpenAI API key not configured (set OPENAI_API_KEY or pass --openai-key)")?;

    let agent = ResearchAgent::builder()
        .config(research_config(keys, PromptStyle::default())?)
        .provider(Arc::new(OpenAIProvider::with_config(config)?))
        .tracer(build_tracer(keys)?)
        .build()?;

    let text = agent.analyze(prompt, context, model).await?;
    println!("{text}");
    Ok(())
}

pub async fn trace_check(keys: &ApiKeys) -> Result<()> {
    let config = TraceConfig::from_env().with_api_key(keys.langsmith_key.clone());
    if !config.is_configured() {
        bail!("LangSmith API key not configured (set LANGSMITH_API_KEY or pass --langsmith-key)");
    }

    let project = config.project.clone();
    let tracer = LangSmithTracer::new(config)?;
    tracer
        .check_connection()
        .await
        .context("LangSmith rejected the API key")?;

    let scope = TraceScope::new(Arc::new(tracer));
    let echoed: std::result::Result<String, anyhow::Error> = scope
        .traced(
            "LangSmith Connection Test",
            RunType::Tool,
            json!({ "test": "Hello, LangSmith!" }),
            |_| async { Ok("Tracing test successful".to_string()) },
        )
        .await;

    println!("LangSmith connection ok (project: {project})");
    println!("{}", echoed?);
    Ok(())
}

pub fn info() {
    println!("Financial Research Agent");
    println!();
    println!("Gathers research on a question from three sources, then asks a language");
    println!("model to synthesize it for wealth and asset management.");
    println!();
    println!("Sources:");
    println!("  web search        Tavily search API (needs TAVILY_API_KEY)");
    println!("  academic research arXiv preprint feed");
    println!("  market data       Yahoo Finance charts for up to 5 ticker symbols");
    println!();
    println!("Parameters (research):");
    println!("  QUERY             research question (required)");
    println!("  --no-web          skip web search");
    println!("  --no-academic     skip academic research");
    println!("  --no-market       skip market data");
    println!("  -s, --symbol      ticker symbol to include, repeatable");
    println!("  --model           model identifier (default gpt-3.5-turbo or OPENAI_MODEL)");
    println!("  --simple          include every result in full, without tracing");
    println!();
    println!("Tracing is enabled when LANGSMITH_API_KEY is set.");
}
