// Query pipeline: embed a question and rank stored files against it


use std::fmt::Write as _;

use tracing::{debug, info};

use crate::database::{NearestMatch, VectorStore};
use crate::embeddings::Embedder;
use crate::Result;

pub const REPORT_HEADER: &str = "The most relevant files are:";
pub const EMPTY_REPORT: &str = "(no indexed files)";

pub struct QueryEngine<E> {
    embedder: E,
    store: VectorStore,
}

impl<E: Embedder> QueryEngine<E> {
    #[inline]
    pub const fn new(embedder: E, store: VectorStore) -> Self {
        Self { embedder, store }
    }

    /// Return up to `limit` stored files ordered from most to least similar
    #[inline]
    pub async fn search(&self, question: &str, limit: usize) -> Result<Vec<NearestMatch>> {
        info!(
            "Searching {} for {:?} with model {}",
            self.store.table_name(),
            question,
            self.embedder.model_name()
        );

        let query_vector = self.embedder.embed(question)?;
        let matches = self.store.nearest(&query_vector, limit).await?;

        debug!("Query returned {} matches", matches.len());
        Ok(matches)
    }

    /// Search and render the ranked path report
    #[inline]
    pub async fn answer(&self, question: &str, limit: usize) -> Result<String> {
        let matches = self.search(question, limit).await?;
        Ok(render_report(&matches))
    }
}

/// Format matches as a header followed by one `File:` line per path
#[inline]
pub fn render_report(matches: &[NearestMatch]) -> String {
    let mut report = String::from(REPORT_HEADER);
    report.push('\n');

    if matches.is_empty() {
        report.push_str(EMPTY_REPORT);
        report.push('\n');
        return report;
    }

    for found in matches {
        let _ = writeln!(report, "File: {}", found.file_path);
    }
    report
}
