//! qbatch-hybrid
//!
//! Bridges the lexical and vector sides: pulls the searched-for terms out of
//! a parsed query and OR-combines the query with a nearest-neighbour clause
//! over their embedding.

pub mod augment;
pub mod extract;

pub use augment::SemanticAugmenter;
pub use extract::TermExtractor;
