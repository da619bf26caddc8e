use std::path::Path;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::FileVectorError;
use crate::config::Config;
use crate::database::VectorStore;
use crate::embeddings::{Embedder, OllamaClient};
use crate::indexer::{IgnoreSet, Indexer, IngestStats};
use crate::search::QueryEngine;

/// Read the ignore list, reporting a missing file and continuing with nothing ignored
#[inline]
pub fn load_ignore_list(path: Option<&Path>) -> Result<IgnoreSet> {
    let Some(path) = path else {
        return Ok(IgnoreSet::new());
    };

    match IgnoreSet::load(path)
        .with_context(|| format!("Failed to read ignore list {}", path.display()))?
    {
        Some(set) => {
            println!("Ignoring {} path(s) from {}", set.len(), path.display());
            for ignored in set.iter() {
                info!("Ignoring {}", ignored.display());
            }
            Ok(set)
        }
        None => {
            warn!("Ignore list {} does not exist", path.display());
            println!(
                "Error: The ignore list file '{}' does not exist.",
                path.display()
            );
            Ok(IgnoreSet::new())
        }
    }
}

/// Ingest a directory tree using the configured Ollama model
#[inline]
pub async fn ingest(config: &Config, root: &Path, ignore_list: Option<&Path>) -> Result<()> {
    let client = OllamaClient::new(&config.ollama).context("Failed to create Ollama client")?;
    ingest_with(client, config, root, ignore_list).await?;
    Ok(())
}

/// Ingest a directory tree with any embedder.
///
/// Returns `None` when the root is not a directory; that case is reported
/// on stdout and is not treated as a failure.
#[inline]
pub async fn ingest_with<E: Embedder>(
    embedder: E,
    config: &Config,
    root: &Path,
    ignore_list: Option<&Path>,
) -> Result<Option<IngestStats>> {
    let ignore = load_ignore_list(ignore_list)?;
    let store = VectorStore::new(config).context("Failed to initialize vector store")?;
    let indexer = Indexer::new(embedder, store);

    println!("Starting at: {}", root.display());
    match indexer.ingest_directory(root, &ignore).await {
        Ok(stats) => {
            println!();
            println!("Ingestion complete: {stats}");
            Ok(Some(stats))
        }
        Err(FileVectorError::InvalidRoot(path)) => {
            warn!("Refusing to ingest {}: not a directory", path.display());
            println!(
                "Error: The path '{}' is not a valid directory.",
                root.display()
            );
            Ok(None)
        }
        Err(e) => {
            error!("Ingestion failed: {}", e);
            Err(e).context("Ingestion failed")
        }
    }
}

/// Answer a question with the configured Ollama model
#[inline]
pub async fn query(config: &Config, question: &str, limit: Option<usize>) -> Result<()> {
    let client = OllamaClient::new(&config.ollama).context("Failed to create Ollama client")?;
    let report = query_with(client, config, question, limit).await?;
    print!("{report}");
    Ok(())
}

/// Build the ranked report for a question with any embedder
#[inline]
pub async fn query_with<E: Embedder>(
    embedder: E,
    config: &Config,
    question: &str,
    limit: Option<usize>,
) -> Result<String> {
    let limit = limit.unwrap_or(config.search.limit);
    let store = VectorStore::new(config).context("Failed to initialize vector store")?;
    let engine = QueryEngine::new(embedder, store);

    engine
        .answer(question, limit)
        .await
        .with_context(|| format!("Query failed for {question:?}"))
}

/// Print configuration, Ollama health and database contents
#[inline]
pub async fn show_status(config: &Config) -> Result<()> {
    println!("📊 File Vector Status Report");
    println!("{}", "=".repeat(50));
    println!();

    println!("🤖 Ollama Status:");
    match OllamaClient::new(&config.ollama) {
        Ok(client) => match client.health_check() {
            Ok(()) => {
                println!("   ✅ Ollama: Connected at {}", client.base_url());
                println!("   📋 Model: {}", config.ollama.model);
            }
            Err(e) => {
                println!("   ⚠️  Ollama: Unhealthy - {e}");
            }
        },
        Err(e) => {
            println!("   ❌ Ollama: Invalid configuration - {e}");
        }
    }

    println!();
    println!("🗄️  Database Status:");
    println!("   URI: {}", config.database_uri());
    println!("   Table: {}", config.database.table_name);
    println!("   Upsert mode: {}", config.database.upsert_mode);

    let store = VectorStore::new(config).context("Failed to initialize vector store")?;
    match store.count().await {
        Ok(count) => println!("   📄 Indexed files: {count}"),
        Err(e) => println!("   ❌ Failed to count rows: {e}"),
    }
    match store.dimension().await {
        Ok(Some(dimension)) => println!("   🔢 Vector dimension: {dimension}"),
        Ok(None) => println!("   📭 No embeddings stored yet"),
        Err(e) => println!("   ❌ Failed to read vector dimension: {e}"),
    }

    println!();
    println!("💡 Next Steps:");
    println!("   • Use 'file-vector ingest --path <dir>' to index a directory");
    println!("   • Use 'file-vector query <question>' to find relevant files");

    Ok(())
}
