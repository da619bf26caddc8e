// Deterministic stand-in for an embedding model

use crate::embeddings::Embedder;
use crate::{FileVectorError, Result};

const CONCEPTS: &[&[&str]] = &[
    &["cat", "cats", "feline", "felines", "kitten", "kittens"],
    &["dog", "dogs", "canine", "canines", "puppy", "puppies"],
    &["great", "good", "pet", "pets", "love"],
    &["rust", "code", "compiler", "crate"],
];

/// Embeds text as concept counts, with one extra axis for unknown words.
///
/// Text containing `fail_marker` fails to embed.
#[derive(Debug, Default)]
pub(crate) struct KeywordEmbedder {
    fail_marker: Option<String>,
}

impl KeywordEmbedder {
    pub(crate) fn failing_on(marker: &str) -> Self {
        Self {
            fail_marker: Some(marker.to_string()),
        }
    }

    pub(crate) const fn dimension() -> usize {
        CONCEPTS.len() + 1
    }
}

impl Embedder for KeywordEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if let Some(marker) = self.fail_marker.as_deref().filter(|m| text.contains(m)) {
            return Err(FileVectorError::Embedding(format!(
                "refusing to embed text containing {marker}"
            )));
        }

        let mut vector = vec![0.0; Self::dimension()];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let word = word.to_lowercase();
            let axis = CONCEPTS
                .iter()
                .position(|group| group.contains(&word.as_str()))
                .unwrap_or(CONCEPTS.len());
            vector[axis] += 1.0;
        }
        Ok(vector)
    }

    fn model_name(&self) -> &str {
        "keyword-test"
    }
}
