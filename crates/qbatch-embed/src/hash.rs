use std::hash::{Hash, Hasher};

use qbatch_core::error::Result;
use qbatch_core::traits::Embedder;
use twox_hash::XxHash64;

use crate::pool::l2_normalize;
use crate::tokenize::tokenize;

/// Deterministic embedder that hashes tokens into buckets. Needs no model
/// files; meant for development and tests.
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self { Self { dim } }
}

impl Embedder for HashEmbedder {
    fn dim(&self) -> usize { self.dim }

    fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0f32; self.dim];
        for (i, token) in tokenize(text).iter().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        l2_normalize(&mut v)?;
        Ok(v)
    }
}
