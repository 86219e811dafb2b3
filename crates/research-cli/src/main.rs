//! Command-line interface for finresearch

mod cli;
mod commands;
mod output;

use clap::Parser;
use cli::{Cli, Commands};
use tracing::debug;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Keys in .env must be visible before clap reads the environment
    let dotenv = research_utils::load_dotenv();

    let cli = Cli::parse();
    research_utils::init_tracing_with(cli.log_format, "info");

    if let Some(path) = dotenv {
        debug!("Loaded environment from {}", path.display());
    }

    match cli.command {
        Commands::Research(args) => commands::research(&cli.keys, args).await,
        Commands::Search { query, json } => commands::search(&cli.keys, &query, json).await,
        Commands::Analyze {
            prompt,
            context,
            model,
        } => {
            commands::analyze(&cli.keys, &prompt, context.as_deref(), model.as_deref()).await
        }
        Commands::TraceCheck => commands::trace_check(&cli.keys).await,
        Commands::Info => {
            commands::info();
            Ok(())
        }
    }
}
