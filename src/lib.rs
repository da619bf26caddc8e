use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FileVectorError>;

#[derive(Error, Debug)]
pub enum FileVectorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Cannot normalize a vector with norm {norm}")]
    DegenerateVector { norm: f32 },

    #[error("Vector dimension mismatch: table stores {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("The path '{}' is not a valid directory", .0.display())]
    InvalidRoot(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod commands;
pub mod config;
pub mod database;
pub mod embeddings;
pub mod indexer;
pub mod search;

#[cfg(test)]
mod testing;
