//! Word-vector dictionary and the embedder built on it.
//!
//! The dictionary is a text file with one `word f1 f2 ... fn` row per line.
//! Blank lines and lines starting with `#` are ignored; every row must have
//! the same dimension.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use qbatch_core::error::{Error, Result};
use qbatch_core::traits::Embedder;
use tracing::info;

use crate::pool::sum_l2;
use crate::tokenize::tokenize;

#[derive(Debug)]
pub struct VectorDictionary {
    dim: usize,
    vectors: HashMap<String, Vec<f32>>,
}

impl VectorDictionary {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| Error::NotFound(format!("vector dictionary {}: {e}", path.display())))?;
        let dict = Self::from_reader(BufReader::new(file))?;
        info!(path = %path.display(), words = dict.len(), dim = dict.dim, "vector dictionary loaded");
        Ok(dict)
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut dim = 0usize;
        let mut vectors = HashMap::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') { continue; }
            let mut parts = line.split_whitespace();
            let Some(word) = parts.next() else { continue };
            let vector = parts
                .map(|p| p.parse::<f32>())
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(|e| Error::Embedding(format!("vector dictionary line {}: {e}", line_no + 1)))?;
            if vector.is_empty() {
                return Err(Error::Embedding(format!("vector dictionary line {}: '{word}' has no components", line_no + 1)));
            }
            if dim == 0 {
                dim = vector.len();
            } else if vector.len() != dim {
                return Err(Error::Embedding(format!(
                    "vector dictionary line {}: dimension {} differs from {dim}", line_no + 1, vector.len()
                )));
            }
            vectors.insert(word.to_lowercase(), vector);
        }
        if vectors.is_empty() {
            return Err(Error::Embedding("vector dictionary is empty".into()));
        }
        Ok(Self { dim, vectors })
    }

    pub fn dim(&self) -> usize { self.dim }

    pub fn len(&self) -> usize { self.vectors.len() }

    pub fn is_empty(&self) -> bool { self.vectors.is_empty() }

    pub fn get(&self, word: &str) -> Option<&[f32]> { self.vectors.get(word).map(Vec::as_slice) }
}

/// Embeds text as the normalised sum of its words' dictionary vectors.
pub struct VectorDictEmbedder {
    dict: VectorDictionary,
}

impl VectorDictEmbedder {
    pub fn new(dict: VectorDictionary) -> Self { Self { dict } }

    pub fn load(path: &Path) -> Result<Self> { Ok(Self::new(VectorDictionary::load(path)?)) }
}

impl Embedder for VectorDictEmbedder {
    fn dim(&self) -> usize { self.dict.dim() }

    fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let tokens = tokenize(text);
        let known: Vec<&[f32]> = tokens.iter().filter_map(|t| self.dict.get(t)).collect();
        if known.is_empty() {
            return Err(Error::Embedding(format!("no word of '{text}' is in the vector dictionary")));
        }
        sum_l2(known, self.dict.dim())
    }
}
