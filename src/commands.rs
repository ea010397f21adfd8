//! Implementations of the `ragbase` subcommands.
//!
//! Results go to stdout; diagnostics and progress go to stderr.

use anyhow::{Context, Result};
use ragbase_core::repository::validate_name;
use ragbase_core::{IngestionPipeline, QueryPipeline, RagError, Repository};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::Config;
use crate::extract::FileExtractor;
use crate::ollama::OllamaClient;
use crate::progress::ProgressMode;

fn repository(config: &Config) -> Repository {
    Repository::new(&config.storage.data_dir)
}

fn ollama(config: &Config) -> Result<OllamaClient> {
    OllamaClient::new(&config.ollama, &config.generation)
}

/// `ragbase rag <model> <name> <folder>`
pub async fn run_rag(
    config: &Config,
    model: &str,
    name: &str,
    folder: &Path,
    progress: ProgressMode,
) -> Result<()> {
    let repo = repository(config);
    validate_name(name)?;
    if repo.exists(name) {
        return Err(RagError::AlreadyExists(name.to_string()).into());
    }

    let client = ollama(config)?;
    client.check_model(model).await.with_context(|| {
        format!(
            "Ollama at {} cannot serve model '{}'. \
             Is Ollama running, and has the model been pulled (`ollama pull {}`)?",
            client.base_url(),
            model,
            model
        )
    })?;

    let extractor = Arc::new(FileExtractor::new(&config.extraction));
    let reporter = progress.reporter();

    let rag = IngestionPipeline::new(&repo, extractor, &client)
        .with_progress(reporter.as_ref())
        .create(model, name, folder)
        .await?;

    println!(
        "RAG '{}' created with {} documents (model {}).",
        rag.name,
        rag.documents.len(),
        rag.model_name
    );
    Ok(())
}

/// `ragbase run <name>`: interactive question loop on stdin.
pub async fn run_chat(config: &Config, name: &str) -> Result<()> {
    let rag = repository(config).load(name)?;
    let client = ollama(config)?;
    let pipeline = QueryPipeline::new(&client, &client);

    println!(
        "RAG '{}' loaded ({} documents, model {}).",
        rag.name,
        rag.documents.len(),
        rag.model_name
    );
    println!("Type your question, or 'exit' to quit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\n> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question == "exit" {
            break;
        }

        match pipeline.answer(&rag, question).await {
            Ok(answer) => println!("\n{}", answer),
            Err(e) => eprintln!("Error: {}", e),
        }
    }
    Ok(())
}

/// `ragbase query <name> <question>`
pub async fn run_query(
    config: &Config,
    name: &str,
    question: &str,
    show_sources: bool,
) -> Result<()> {
    if question.trim().is_empty() {
        anyhow::bail!("question must not be empty");
    }
    let rag = repository(config).load(name)?;
    let client = ollama(config)?;

    let answer = QueryPipeline::new(&client, &client)
        .answer_with_sources(&rag, question)
        .await?;

    println!("{}", answer.response);
    if show_sources {
        println!();
        println!("Sources:");
        for source in &answer.sources {
            println!(
                "  {:.4}  {}  ({})",
                source.score,
                source.document.name,
                source.document.path.display()
            );
        }
    }
    Ok(())
}

/// `ragbase list`
pub fn run_list(config: &Config) -> Result<()> {
    let repo = repository(config);
    let names = repo.list()?;
    if names.is_empty() {
        println!("No RAG systems found in {}.", repo.root().display());
        return Ok(());
    }

    println!("{:<24} {:<20} {:<20} {:>9}", "NAME", "MODEL", "CREATED", "DOCUMENTS");
    for name in names {
        match repo.load(&name) {
            Ok(rag) => println!(
                "{:<24} {:<20} {:<20} {:>9}",
                rag.name,
                rag.model_name,
                rag.created_at.format("%Y-%m-%d %H:%M:%S"),
                rag.documents.len()
            ),
            Err(e) => {
                tracing::warn!("cannot load RAG '{}': {}", name, e);
                println!("{:<24} {:<20} {:<20} {:>9}", name, "error", "-", "-");
            }
        }
    }
    Ok(())
}

/// `ragbase info <name>`
pub fn run_info(config: &Config, name: &str) -> Result<()> {
    let rag = repository(config).load(name)?;

    println!("Name:        {}", rag.name);
    println!("Model:       {}", rag.model_name);
    println!("Created:     {}", rag.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("Updated:     {}", rag.updated_at.format("%Y-%m-%d %H:%M:%S UTC"));
    if !rag.description.is_empty() {
        println!("Description: {}", rag.description);
    }
    println!(
        "Vectors:     {} ({} dimensions)",
        rag.vector_store.len(),
        rag.vector_store.dimensions().unwrap_or(0)
    );
    println!("Documents:   {}", rag.documents.len());
    for doc in &rag.documents {
        println!("  {}  {}  {} bytes", doc.name, doc.content_type, doc.size);
    }
    Ok(())
}

/// `ragbase delete <name>`
pub async fn run_delete(config: &Config, name: &str, force: bool) -> Result<()> {
    let repo = repository(config);
    if !repo.exists(name) {
        return Err(RagError::NotFound(name.to_string()).into());
    }

    if !force {
        print!("Delete RAG '{}'? This cannot be undone. [y/N] ", name);
        std::io::stdout().flush()?;
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let answer = lines.next_line().await?.unwrap_or_default();
        if !matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
            println!("Deletion cancelled.");
            return Ok(());
        }
    }

    repo.delete(name)?;
    println!("RAG '{}' deleted.", name);
    Ok(())
}
