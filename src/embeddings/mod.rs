// Embeddings module
// Embedding provider abstraction, the Ollama adapter, and vector math

pub mod ollama;
pub mod vector;

pub use ollama::OllamaClient;
pub use vector::{cosine_similarity, l2_norm, normalize};

/// A source of fixed-length embedding vectors for text.
///
/// Implementations return whatever the underlying model produces. Failures
/// from the model are passed through to the caller; nothing is retried.
pub trait Embedder: Send + Sync {
    /// Embed a single piece of text. Empty text is valid input.
    fn embed(&self, text: &str) -> crate::Result<Vec<f32>>;

    /// Identifier of the model producing the vectors
    fn model_name(&self) -> &str;
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    #[inline]
    fn embed(&self, text: &str) -> crate::Result<Vec<f32>> {
        (**self).embed(text)
    }

    #[inline]
    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}
