//! qbatch-embed
//!
//! Embedding service implementations: a word-vector dictionary embedder for
//! real runs and a hash embedder for development and tests.

use std::path::Path;

use qbatch_core::error::Result;
use qbatch_core::traits::Embedder;
use tracing::info;

pub mod dict;
pub mod hash;
pub mod pool;
pub mod tokenize;

pub use dict::{VectorDictEmbedder, VectorDictionary};
pub use hash::HashEmbedder;
pub use pool::{l2_normalize, sum_l2};

/// Dimension of the hash embedder used when fake embeddings are requested.
pub const FAKE_EMBEDDING_DIM: usize = 1024;

/// Embedder for a run: the dictionary at `dict_path`, or the hash embedder when
/// `APP_USE_FAKE_EMBEDDINGS` is `1`/`true`.
pub fn get_default_embedder(dict_path: &Path) -> Result<Box<dyn Embedder>> {
    let use_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false);
    if use_fake {
        info!(dim = FAKE_EMBEDDING_DIM, "using hash embedder");
        return Ok(Box::new(HashEmbedder::new(FAKE_EMBEDDING_DIM)));
    }
    Ok(Box::new(VectorDictEmbedder::load(dict_path)?))
}
