// Database module
// Persistence of file embeddings in LanceDB

pub mod lancedb;

pub use self::lancedb::{NearestMatch, StoredEmbedding, UpsertOutcome, VectorStore};
