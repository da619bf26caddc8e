// LanceDB vector database module
// One row per file path holding its unit-length embedding


pub mod vector_store;

pub use vector_store::VectorStore;

use std::fmt;

/// Embedding row stored in LanceDB
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEmbedding {
    /// Absolute path of the file; unique within the table
    pub file_path: String,
    /// L2-normalized embedding of the file's content
    pub embedding: Vec<f32>,
    /// RFC 3339 timestamp of the last write
    pub indexed_at: String,
}

/// A stored row returned by nearest-neighbor retrieval
#[derive(Debug, Clone, PartialEq)]
pub struct NearestMatch {
    pub file_path: String,
    pub embedding: Vec<f32>,
    /// Cosine distance from the query; smaller is closer
    pub distance: f32,
}

impl NearestMatch {
    #[inline]
    pub fn similarity(&self) -> f32 {
        1.0 - self.distance
    }
}

/// What `upsert` did with a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    /// Written by a merge-insert, which does not report which branch ran
    Merged,
}

impl fmt::Display for UpsertOutcome {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inserted => write!(f, "Inserted"),
            Self::Updated => write!(f, "Updated"),
            Self::Merged => write!(f, "Stored"),
        }
    }
}

/// Quote a string for use inside a LanceDB filter predicate
#[inline]
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
