use qbatch_core::types::{Occur, QueryTree};

/// Collects the terms a query would match against one field.
///
/// Subtrees reached through a `MustNot` clause are never entered: terms a
/// document must not contain are not terms the user is looking for. Field
/// matching is exact; there is no default-field fallback, so unqualified
/// terms must already carry the default field (the parser guarantees this).
#[derive(Debug, Clone)]
pub struct TermExtractor {
    field: String,
}

impl TermExtractor {
    pub fn new(field: impl Into<String>) -> Self { Self { field: field.into() } }

    /// Terms in traversal order, duplicates kept.
    pub fn extract(&self, query: &QueryTree) -> Vec<String> {
        let mut terms = Vec::new();
        self.collect(query, &mut terms);
        terms
    }

    fn collect(&self, query: &QueryTree, terms: &mut Vec<String>) {
        match query {
            QueryTree::Term { field, text } => {
                if *field == self.field { terms.push(text.clone()); }
            }
            QueryTree::Phrase { field, terms: phrase } => {
                if *field == self.field { terms.extend(phrase.iter().cloned()); }
            }
            QueryTree::Boolean(clauses) => {
                for clause in clauses.iter().filter(|c| c.occur != Occur::MustNot) {
                    self.collect(&clause.query, terms);
                }
            }
            QueryTree::Knn { .. } => {}
        }
    }
}
