//! qbatch-text
//!
//! Tantivy-backed lexical side of the batch runner: the text analyzer, the
//! boolean query parser, and the read-only index service (including exact
//! nearest-neighbour sub-queries over stored vectors).

pub mod tantivy_utils;
pub mod index;
pub mod knn;
pub mod parser;
pub mod search;

pub use index::{IndexBuilder, SourceDocument};
pub use parser::QueryParser;
pub use search::TantivyIndexService;
