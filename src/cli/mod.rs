//! CLI interface for Concierge.

pub mod handlers;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Concierge - conversational assistant orchestration core
#[derive(Parser)]
#[command(name = "concierge", version, about, long_about = None)]
pub struct Cli {
    /// Override data directory (default: ~/.concierge)
    #[arg(long, env = "CONCIERGE_DATA_PATH", global = true)]
    pub data_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send one message through the orchestrator
    Chat {
        /// The message text
        message: String,
        /// Owner identity the conversation belongs to
        #[arg(long, default_value = "default")]
        owner: String,
        /// Resume a specific session instead of resolving one
        #[arg(long)]
        session: Option<String>,
        /// Pin the reply to a mode
        #[arg(long)]
        mode: Option<String>,
        /// Stream the reply chunk by chunk
        #[arg(long)]
        stream: bool,
    },

    /// Run the handoff delivery sweep
    Sweep {
        /// Run a single pass instead of the loop
        #[arg(long)]
        once: bool,
    },

    /// Memory inspection
    Memory {
        #[command(subcommand)]
        command: MemoryCommands,
    },
}

#[derive(Subcommand)]
pub enum MemoryCommands {
    /// Run a hybrid retrieval query and show the ranked results
    Search {
        /// The query text
        query: String,
        #[arg(long, default_value = "default")]
        owner: String,
        /// Narrow to a mode
        #[arg(long)]
        mode: Option<String>,
        #[arg(long, default_value = "5")]
        limit: usize,
    },
}
