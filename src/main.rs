//! Concierge - conversational assistant orchestration core
//!
//! Usage:
//!   concierge chat "message"          One-shot chat turn
//!   concierge chat --stream "..."     Streamed chat turn
//!   concierge sweep                   Run the handoff delivery loop
//!   concierge memory search "query"   Inspect hybrid retrieval
//!   concierge --help                  Show all commands

use anyhow::Result;
use clap::Parser;

use concierge::cli::{handlers, Cli, Commands, MemoryCommands};
use concierge::init::AppContext;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("concierge=info".parse()?),
        )
        .init();

    let ctx = AppContext::new(cli.data_path.clone()).await?;

    match &cli.command {
        Commands::Chat {
            message,
            owner,
            session,
            mode,
            stream,
        } => {
            handlers::chat(&ctx, message, owner, session.clone(), mode.clone(), *stream).await?;
        }
        Commands::Sweep { once } => {
            handlers::sweep(&ctx, *once).await?;
        }
        Commands::Memory { command } => match command {
            MemoryCommands::Search {
                query,
                owner,
                mode,
                limit,
            } => {
                handlers::memory_search(&ctx, query, owner, mode.as_deref(), *limit).await?;
            }
        },
    }

    Ok(())
}
