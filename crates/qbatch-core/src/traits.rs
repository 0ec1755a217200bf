use crate::error::Result;
use crate::types::{DocRef, DocumentRecord, QueryTree, TopHits};

/// Read-only access to a pre-built full-text index.
pub trait IndexService {
    /// Run `query` and return at most `limit` hits plus the true match count.
    fn search(&self, query: &QueryTree, limit: usize) -> Result<TopHits>;
    /// Fetch the stored fields of one document.
    fn lookup(&self, doc: DocRef) -> Result<DocumentRecord>;
}

/// Turns text into a fixed-length vector comparable with the index's vectors.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed_text(&self, text: &str) -> Result<Vec<f32>>;
}

