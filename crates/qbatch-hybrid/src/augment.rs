use qbatch_core::error::Result;
use qbatch_core::traits::Embedder;
use qbatch_core::types::{Clause, Occur, QueryTree};
use tracing::debug;

use crate::extract::TermExtractor;

/// Adds a vector-similarity clause to lexical queries.
///
/// The terms a query targets in the text field are joined into one string,
/// embedded, and turned into a `Knn` clause on the vector field that is
/// OR-ed with the original query. Embedding failures propagate; there is no
/// silent fallback to the lexical query.
pub struct SemanticAugmenter<'a> {
    embedder: &'a dyn Embedder,
    extractor: TermExtractor,
    vector_field: String,
}

impl<'a> SemanticAugmenter<'a> {
    pub fn new(embedder: &'a dyn Embedder, text_field: impl Into<String>, vector_field: impl Into<String>) -> Self {
        Self { embedder, extractor: TermExtractor::new(text_field), vector_field: vector_field.into() }
    }

    /// Extract the text-field terms of `query` and augment with them.
    pub fn augment_query(&self, query: QueryTree, k: usize) -> Result<QueryTree> {
        let terms = self.extractor.extract(&query);
        self.augment(query, &terms, k)
    }

    /// Combine `query` with the `k` nearest neighbours of the embedded `terms`.
    ///
    /// Returns `query` unchanged when `k` is 0, when there are no terms, or when
    /// `query` already carries a vector clause from an earlier augmentation.
    pub fn augment(&self, query: QueryTree, terms: &[String], k: usize) -> Result<QueryTree> {
        if k == 0 || self.is_augmented(&query) {
            return Ok(query);
        }
        let text = terms.join(" ");
        if text.is_empty() {
            debug!("no terms for semantic augmentation");
            return Ok(query);
        }
        let vector = self.embedder.embed_text(&text)?;
        debug!(text = %text, dim = vector.len(), k, "semantic clause added");
        let knn = QueryTree::Knn { field: self.vector_field.clone(), vector, k };
        Ok(QueryTree::Boolean(vec![Clause::should(query), Clause::should(knn)]))
    }

    fn is_augmented(&self, query: &QueryTree) -> bool {
        match query {
            QueryTree::Boolean(clauses) => matches!(
                clauses.as_slice(),
                [Clause { occur: Occur::Should, .. }, Clause { occur: Occur::Should, query: QueryTree::Knn { field, .. } }]
                    if *field == self.vector_field
            ),
            _ => false,
        }
    }
}
