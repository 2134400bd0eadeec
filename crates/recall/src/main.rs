// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recall - long-term memory for multi-agent assistants.
//!
//! This is the binary entry point: a thin CLI over the memory router.

mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use recall_memory::{MemoryType, Scope};
use recall_security::RedactingWriter;

/// Recall - long-term memory for multi-agent assistants.
#[derive(Parser, Debug)]
#[command(name = "recall", version, about, long_about = None)]
struct Cli {
    /// Config file to load instead of the standard lookup paths.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the normalized form of a personal statement without storing it.
    Normalize { raw: String },
    #[command(flatten)]
    Store(StoreCommands),
}

/// Subcommands that work on the memory database.
#[derive(Subcommand, Debug)]
enum StoreCommands {
    /// Store a memory item.
    Remember {
        /// Item content.
        content: String,
        /// Visibility: `agent` or `global`.
        #[arg(long, default_value = "global")]
        scope: Scope,
        /// Item kind: `fact`, `episode`, `profile` or `doc_ref`.
        #[arg(long = "type", default_value = "fact")]
        item_type: MemoryType,
        #[arg(long)]
        agent: Option<String>,
        #[arg(long)]
        thread: Option<String>,
        #[arg(long, default_value_t = 0.5)]
        importance: f64,
    },
    /// Search stored memory.
    Search(SearchArgs),
    /// Normalize a personal statement and store it as a profile item.
    Personal {
        raw: String,
        #[arg(long)]
        agent: Option<String>,
        #[arg(long)]
        thread: Option<String>,
    },
    /// Summarize a thread's recent episodes into a global fact.
    Reflect {
        #[arg(long)]
        agent: String,
        #[arg(long)]
        thread: String,
    },
    /// Manage artifacts.
    Artifact {
        #[command(subcommand)]
        action: ArtifactCommands,
    },
    /// Delete every memory item and its search index entry. Artifacts are kept.
    Clear {
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args, Debug)]
struct SearchArgs {
    query: String,
    /// Restrict to one agent's items.
    #[arg(long)]
    agent: Option<String>,
    /// Also return global items.
    #[arg(long)]
    global: bool,
    /// Fuse keyword, vector and tag scores.
    #[arg(long)]
    hybrid: bool,
    /// Tag to match (repeatable).
    #[arg(long = "tag")]
    tags: Vec<String>,
    /// Restrict to one item kind (repeatable).
    #[arg(long = "type")]
    types: Vec<MemoryType>,
    #[arg(long)]
    min_importance: Option<f64>,
    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Subcommand, Debug)]
enum ArtifactCommands {
    /// Store a document.
    Add {
        body: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        agent: Option<String>,
        #[arg(long)]
        thread: Option<String>,
    },
    /// Print one artifact by id.
    Get { id: i64 },
    /// List artifacts newest first.
    List {
        #[arg(long)]
        agent: Option<String>,
        #[arg(long)]
        global: bool,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => recall_config::load_and_validate_path(path),
        None => recall_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            recall_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.agent.log_level);

    if let Err(e) = commands::run(&config, cli.command).await {
        eprintln!("recall: {e}");
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber with the given log level.
///
/// Output goes to stderr through the secret-redacting writer so stdout
/// stays machine-readable.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("recall={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(RedactingWriter::stderr)
        .init();
}
