use std::path::PathBuf;

use clap::{Parser, Subcommand};
use file_vector::commands::{ingest, query, show_status};
use file_vector::config::{Config, resolve_config_dir, run_interactive_config, show_config};
use file_vector::{FileVectorError, Result};

#[derive(Parser)]
#[command(name = "file-vector")]
#[command(about = "Embed the files of a directory tree and find the ones most relevant to a question")]
#[command(version)]
struct Cli {
    /// Directory holding config.toml and the default vector database
    #[arg(long, global = true, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure Ollama connection and database settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Embed every file below a directory
    Ingest {
        /// Directory to walk
        #[arg(long, value_name = "DIR")]
        path: PathBuf,
        /// File listing paths to skip, one per line
        #[arg(long, value_name = "FILE")]
        ignore_list: Option<PathBuf>,
    },
    /// List the indexed files most relevant to a question
    Query {
        /// Free-text question
        question: String,
        /// Number of files to return
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show Ollama health and database contents
    Status,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_dir =
        resolve_config_dir(cli.config_dir).map_err(|e| FileVectorError::Config(e.to_string()))?;

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config(&Config::load(&config_dir)?);
            } else {
                run_interactive_config(&config_dir)?;
            }
        }
        Commands::Ingest { path, ignore_list } => {
            let config = Config::load(&config_dir)?;
            ingest(&config, &path, ignore_list.as_deref()).await?;
        }
        Commands::Query { question, limit } => {
            let config = Config::load(&config_dir)?;
            query(&config, &question, limit).await?;
        }
        Commands::Status => {
            let config = Config::load(&config_dir)?;
            show_status(&config).await?;
        }
    }

    Ok(())
}
