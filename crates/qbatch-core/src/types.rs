//! Domain types shared by the parser, the search collaborators and the runner.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Occurrence requirement of a clause inside a boolean group.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Occur {
    Must,
    Should,
    MustNot,
}

impl Occur {
    fn prefix(self) -> &'static str {
        match self {
            Occur::Must => "+",
            Occur::Should => "",
            Occur::MustNot => "-",
        }
    }
}

/// One `(sub-query, occurrence)` pair of a boolean group.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub occur: Occur,
    pub query: QueryTree,
}

impl Clause {
    pub fn new(occur: Occur, query: QueryTree) -> Self {
        Self { occur, query }
    }

    pub fn should(query: QueryTree) -> Self {
        Self::new(Occur::Should, query)
    }
}

/// Structured form of a parsed search expression.
///
/// - `Term`: one analysed term matched against one field
/// - `Phrase`: ordered terms that must appear adjacent in one field
/// - `Boolean`: ordered clauses, each with its own occurrence requirement
/// - `Knn`: the `k` documents whose `field` vector is closest to `vector`
///
/// Every atomic node names its field explicitly; the parser fills in the
/// default field for unqualified terms.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryTree {
    Term { field: String, text: String },
    Phrase { field: String, terms: Vec<String> },
    Boolean(Vec<Clause>),
    Knn { field: String, vector: Vec<f32>, k: usize },
}

impl QueryTree {
    pub fn term(field: impl Into<String>, text: impl Into<String>) -> Self {
        QueryTree::Term { field: field.into(), text: text.into() }
    }

    /// A boolean group matching no document.
    pub fn empty() -> Self {
        QueryTree::Boolean(Vec::new())
    }
}

impl fmt::Display for QueryTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryTree::Term { field, text } => write!(f, "{field}:{text}"),
            QueryTree::Phrase { field, terms } => write!(f, "{field}:\"{}\"", terms.join(" ")),
            QueryTree::Boolean(clauses) => {
                for (i, clause) in clauses.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    f.write_str(clause.occur.prefix())?;
                    match &clause.query {
                        QueryTree::Boolean(_) => write!(f, "({})", clause.query)?,
                        other => write!(f, "{other}")?,
                    }
                }
                Ok(())
            }
            QueryTree::Knn { field, k, .. } => write!(f, "[knn {field} k={k}]"),
        }
    }
}

/// Address of a document inside the index: segment ordinal plus the
/// segment-local document number.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocRef {
    pub segment: u32,
    pub doc: u32,
}

impl DocRef {
    pub fn new(segment: u32, doc: u32) -> Self {
        Self { segment, doc }
    }
}

impl fmt::Display for DocRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.segment, self.doc)
    }
}

/// A ranked result. Higher `score` is better.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScoredDoc {
    pub doc: DocRef,
    pub score: f32,
}

/// The bounded result window of one search.
///
/// `total_hits` is the true number of matching documents, which may exceed
/// `hits.len()`; `hits` is ordered by score descending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopHits {
    pub total_hits: usize,
    pub hits: Vec<ScoredDoc>,
}

/// Stored fields of a matched document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentRecord {
    pub path: Option<String>,
    pub title: Option<String>,
}
