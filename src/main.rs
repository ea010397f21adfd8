//! # ragbase CLI
//!
//! Build retrieval-augmented knowledge bases from local folders and ask
//! questions against them with Ollama models.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ragbase rag <model> <name> <folder>` | Index a folder into a new RAG |
//! | `ragbase run <name>` | Interactive question loop |
//! | `ragbase query <name> "<question>"` | One-shot answer |
//! | `ragbase list` | List RAG systems |
//! | `ragbase info <name>` | Show RAG metadata and documents |
//! | `ragbase delete <name>` | Delete a RAG |
//! | `ragbase serve` | Start the HTTP API |
//!
//! ## Examples
//!
//! ```bash
//! ragbase rag llama3.2 notes ~/Documents/notes
//! ragbase query notes "what did we decide about the launch date?" --show-sources
//! ragbase run notes
//! ragbase serve --config ./ragbase.toml
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use ragbase::progress::ProgressMode;
use ragbase::{commands, config, server};

/// ragbase: local RAG knowledge bases on top of Ollama.
#[derive(Parser)]
#[command(
    name = "ragbase",
    about = "ragbase: build local RAG knowledge bases from folders and query them with Ollama",
    version,
    long_about = "ragbase extracts text from the documents in a folder, embeds each document \
    with an Ollama model, stores the vectors on disk, and answers questions by retrieving the \
    most similar documents and passing them to the model as context."
)]
struct Cli {
    /// Path to a configuration file (TOML).
    ///
    /// Defaults to `~/.ragbase/config.toml` when that file exists; otherwise
    /// built-in defaults are used.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging on stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Progress output for long-running commands.
    ///
    /// Defaults to `human` when stderr is a terminal, otherwise `off`.
    #[arg(long, global = true, value_enum)]
    progress: Option<ProgressMode>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Create a RAG system from a folder of documents.
    ///
    /// Every supported file under the folder (recursively, hidden entries
    /// skipped) is extracted, embedded with the model and saved under the
    /// data directory. Fails if the name is already taken.
    Rag {
        /// Ollama model used for embeddings and answers (e.g. `llama3.2`).
        model: String,
        /// Name of the new RAG.
        name: String,
        /// Folder to index.
        folder: PathBuf,
    },

    /// Start an interactive question session with a RAG.
    ///
    /// Type `exit` to quit.
    Run {
        /// Name of the RAG.
        name: String,
    },

    /// Answer a single question and exit.
    Query {
        /// Name of the RAG.
        name: String,
        /// The question.
        question: String,
        /// Print the retrieved documents and their scores after the answer.
        #[arg(long)]
        show_sources: bool,
    },

    /// List all RAG systems.
    List,

    /// Show a RAG's metadata and documents.
    Info {
        /// Name of the RAG.
        name: String,
    },

    /// Delete a RAG system.
    Delete {
        /// Name of the RAG.
        name: String,
        /// Skip the confirmation prompt.
        #[arg(long, short)]
        force: bool,
    },

    /// Start the HTTP API server.
    ///
    /// Binds to `[server].bind` (default `127.0.0.1:3001`).
    Serve,
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = config::resolve_config(cli.config.as_deref())?;
    let progress = cli.progress.unwrap_or_else(ProgressMode::default_for_tty);

    match cli.command {
        Commands::Rag {
            model,
            name,
            folder,
        } => {
            commands::run_rag(&cfg, &model, &name, &folder, progress).await?;
        }
        Commands::Run { name } => {
            commands::run_chat(&cfg, &name).await?;
        }
        Commands::Query {
            name,
            question,
            show_sources,
        } => {
            commands::run_query(&cfg, &name, &question, show_sources).await?;
        }
        Commands::List => {
            commands::run_list(&cfg)?;
        }
        Commands::Info { name } => {
            commands::run_info(&cfg, &name)?;
        }
        Commands::Delete { name, force } => {
            commands::run_delete(&cfg, &name, force).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
