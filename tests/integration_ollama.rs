#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// Integration tests that require a local Ollama instance
// Run with: cargo test --test integration_ollama -- --ignored

use file_vector::config::{Config, OllamaConfig};
use file_vector::embeddings::{Embedder, OllamaClient, cosine_similarity};
use file_vector::indexer::{IgnoreSet, Indexer};
use file_vector::database::VectorStore;
use file_vector::search::QueryEngine;
use std::env;
use std::time::Duration;
use tempfile::TempDir;
use tracing::info;

const TEST_MODEL: &str = "nomic-embed-text:latest";
const DEFAULT_OLLAMA_HOST: &str = "localhost";
const DEFAULT_OLLAMA_PORT: u16 = 11434;

fn ollama_config() -> OllamaConfig {
    OllamaConfig {
        host: env::var("OLLAMA_HOST").unwrap_or_else(|_| DEFAULT_OLLAMA_HOST.to_string()),
        port: env::var("OLLAMA_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_OLLAMA_PORT),
        model: env::var("OLLAMA_MODEL").unwrap_or_else(|_| TEST_MODEL.to_string()),
        ..OllamaConfig::default()
    }
}

fn create_integration_test_client() -> OllamaClient {
    OllamaClient::new(&ollama_config())
        .expect("Failed to create Ollama client")
        .with_timeout(Duration::from_secs(60))
}

fn init_test_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init()
        .ok();
}

#[test]
#[ignore = "requires a running Ollama instance"]
fn real_ollama_health_check() {
    init_test_tracing();

    let client = create_integration_test_client();
    let result = client.health_check();

    assert!(
        result.is_ok(),
        "Health check should succeed with local Ollama: {result:?}"
    );
}

#[test]
#[ignore = "requires a running Ollama instance"]
fn real_ollama_embedding_is_deterministic() {
    init_test_tracing();

    let client = create_integration_test_client();
    let text = "Rust is a systems programming language focused on safety.";

    let first = client.embed(text).expect("embedding should succeed");
    let second = client.embed(text).expect("embedding should succeed");

    info!("Generated embedding with {} dimensions", first.len());
    assert!(!first.is_empty(), "Embedding should not be empty");
    assert_eq!(first.len(), second.len());

    let similarity = cosine_similarity(&first, &second).expect("vectors are comparable");
    assert!(
        (similarity - 1.0).abs() < 1e-3,
        "Repeated embeddings should match, cosine similarity was {similarity}"
    );
}

#[test]
#[ignore = "requires a running Ollama instance"]
fn real_ollama_embeds_empty_text() {
    init_test_tracing();

    let client = create_integration_test_client();
    assert!(client.embed("").is_ok(), "Empty input must not fail");
}

#[tokio::test]
#[ignore = "requires a running Ollama instance"]
async fn real_ollama_ranks_related_file_first() {
    init_test_tracing();

    let db_dir = TempDir::new().expect("should create temp dir");
    let data_dir = TempDir::new().expect("should create temp dir");
    let cats = data_dir.path().join("a.txt");
    std::fs::write(&cats, "cats are great").expect("should write file");
    std::fs::write(data_dir.path().join("b.txt"), "dogs are great").expect("should write file");

    let config = Config {
        ollama: ollama_config(),
        base_dir: db_dir.path().to_path_buf(),
        ..Config::default()
    };

    let indexer = Indexer::new(
        create_integration_test_client(),
        VectorStore::new(&config).expect("should create vector store"),
    );
    let stats = indexer
        .ingest_directory(data_dir.path(), &IgnoreSet::new())
        .await
        .expect("ingestion should succeed");
    assert_eq!(stats.files_stored(), 2);

    let engine = QueryEngine::new(
        create_integration_test_client(),
        VectorStore::new(&config).expect("should create vector store"),
    );
    let matches = engine
        .search("feline pets", 5)
        .await
        .expect("search should succeed");

    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].file_path, cats.to_str().expect("UTF-8"));
}
