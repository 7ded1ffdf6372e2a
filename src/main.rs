//! # intellibot CLI
//!
//! ## Usage
//!
//! ```bash
//! intellibot --config ./config/intellibot.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `intellibot chat` | Interactive chat, optionally about a document |
//! | `intellibot ask "<question>"` | Ask one question and print the reply |
//! | `intellibot chunks <path>` | Show how a document is segmented |
//! | `intellibot retrieve <path> "<query>"` | Show ranked chunks and the assembled prompt |
//!
//! The bearer token is read from the environment variable named by
//! `[model] api_key_env` (default `HF_TOKEN`); a `.env` file in the working
//! directory is loaded first.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use intellibot::{chat, config, inspect, logging};

/// intellibot: chat with a hosted model about a PDF or text document.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/intellibot.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "intellibot",
    about = "Chat with a hosted language model about a PDF or text document",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/intellibot.toml`. A missing file means
    /// built-in defaults.
    #[arg(long, global = true, default_value = "./config/intellibot.toml")]
    config: PathBuf,

    /// Log debug output to stderr (overridden by RUST_LOG).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session.
    ///
    /// Type questions at the prompt; `/help` lists the slash commands
    /// (`/load`, `/export`, `/clear`, ...).
    Chat {
        /// Document to load before the first question.
        #[arg(long)]
        document: Option<PathBuf>,
    },

    /// Ask a single question and print the reply.
    Ask {
        question: String,

        /// Document to answer from.
        #[arg(long)]
        document: Option<PathBuf>,

        /// Number of chunks to retrieve (overrides `[retrieval] top_k`).
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Show the chunks a document is split into.
    Chunks {
        path: PathBuf,

        /// Print JSON instead of a listing.
        #[arg(long)]
        json: bool,
    },

    /// Rank a document's chunks against a query without calling the model.
    Retrieve {
        path: PathBuf,
        query: String,

        #[arg(long)]
        top_k: Option<usize>,

        /// Print JSON instead of a listing.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    logging::init(cli.verbose);

    let cfg = config::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Chat { document } => {
            chat::run_chat(&cfg, document.as_deref()).await?;
        }
        Commands::Ask {
            question,
            document,
            top_k,
        } => {
            chat::run_ask(&cfg, &question, document.as_deref(), top_k).await?;
        }
        Commands::Chunks { path, json } => {
            inspect::run_chunks(&cfg, &path, json)?;
        }
        Commands::Retrieve {
            path,
            query,
            top_k,
            json,
        } => {
            inspect::run_retrieve(&cfg, &path, &query, top_k, json)?;
        }
    }

    Ok(())
}
