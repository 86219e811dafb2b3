//! Argument parsing for the finresearch binary

use clap::{Args, Parser, Subcommand};
use research_utils::LogFormat;

/// finresearch - multi-source financial research from the terminal
///
/// Gathers web search results, academic preprints and market data, then asks
/// a language model to synthesize them for wealth and asset management.
#[derive(Parser, Debug)]
#[command(
    name = "finresearch",
    version,
    about = "Multi-source financial research with LLM synthesis",
    after_help = "EXAMPLES:\n    \
                  finresearch research \"ESG investing strategies\"\n    \
                  finresearch research \"Research AAPL and MSFT trends\" --json\n    \
                  finresearch research \"bond ladders\" --no-market -s TLT\n    \
                  finresearch analyze \"Assess rate risk\" --context \"Bond-heavy portfolio\"\n    \
                  finresearch trace-check"
)]
pub struct Cli {
    #[command(flatten)]
    pub keys: ApiKeys,

    /// Log output format (text or json)
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Credentials; flags win over the environment
#[derive(Args, Debug, Clone, Default)]
pub struct ApiKeys {
    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    pub openai_key: Option<String>,

    /// Tavily API key
    #[arg(long, env = "TAVILY_API_KEY", hide_env_values = true, global = true)]
    pub tavily_key: Option<String>,

    /// LangSmith API key; enables run tracing
    #[arg(long, env = "LANGSMITH_API_KEY", hide_env_values = true, global = true)]
    pub langsmith_key: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Research a question across web, academic and market sources
    Research(ResearchArgs),

    /// Run a web search only
    Search {
        /// Search text, sent as-is
        query: String,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Ask the model directly
    Analyze {
        /// Analysis request
        prompt: String,

        /// Background prepended to the request
        #[arg(long)]
        context: Option<String>,

        /// Model identifier
        #[arg(long)]
        model: Option<String>,
    },

    /// Verify the LangSmith key and record a test run
    TraceCheck,

    /// Describe the research tool and its parameters
    Info,
}

#[derive(Args, Debug)]
pub struct ResearchArgs {
    /// Research question
    pub query: String,

    /// Skip web search
    #[arg(long)]
    pub no_web: bool,

    /// Skip academic research
    #[arg(long)]
    pub no_academic: bool,

    /// Skip market data
    #[arg(long)]
    pub no_market: bool,

    /// Ticker symbol to include (repeatable)
    #[arg(short = 's', long = "symbol")]
    pub symbols: Vec<String>,

    /// Model identifier
    #[arg(long)]
    pub model: Option<String>,

    /// Unbounded prompt with every result and no tracing
    #[arg(long)]
    pub simple: bool,

    /// Print the response envelope as JSON
    #[arg(long)]
    pub json: bool,
}
