//! Exact nearest-neighbour resolution over stored document vectors.
//!
//! A `Knn` node is resolved before the search runs: the field's stored vectors
//! (decoded once per searcher, see [`load_vectors`]) are compared with the
//! query vector, the best `k` are kept, and the result becomes a
//! [`ScoredDocsQuery`] that the engine scores like any other clause of a
//! boolean query.

use std::collections::HashMap;
use std::sync::Arc;

use tantivy::index::SegmentId;
use tantivy::query::{EnableScoring, Explanation, Query, Scorer, Weight};
use tantivy::schema::{Field, Value};
use tantivy::{DocAddress, DocId, DocSet, Score, Searcher, SegmentReader, TantivyDocument, TantivyError, TERMINATED};

use crate::tantivy_utils::decode_vector;

/// `(1 + cosine) / 2`, so that scores stay within `[0, 1]`.
pub fn similarity(a: &[f32], b: &[f32]) -> f32 {
	let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
	let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
	let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
	if na == 0.0 || nb == 0.0 { return 0.0; }
	(1.0 + dot / (na * nb)) / 2.0
}

/// A decoded document vector with the address it was read from.
#[derive(Debug, Clone)]
pub struct StoredVector {
	address: DocAddress,
	segment_id: SegmentId,
	vector: Vec<f32>,
}

/// Decode `field` of every live document once.
///
/// Documents without a vector are skipped; undecodable bytes are an error.
pub fn load_vectors(searcher: &Searcher, field: Field) -> tantivy::Result<Vec<StoredVector>> {
	let mut vectors = Vec::new();
	for (segment_ord, segment_reader) in searcher.segment_readers().iter().enumerate() {
		let segment_id = segment_reader.segment_id();
		for doc_id in segment_reader.doc_ids_alive() {
			let address = DocAddress::new(segment_ord as u32, doc_id);
			let doc: TantivyDocument = searcher.doc(address)?;
			let Some(bytes) = doc.get_first(field).and_then(|v| v.as_bytes()) else { continue };
			let vector = decode_vector(bytes).ok_or_else(|| TantivyError::InvalidArgument(format!("malformed vector bytes in document {segment_ord}/{doc_id}")))?;
			vectors.push(StoredVector { address, segment_id, vector });
		}
	}
	Ok(vectors)
}

/// Keep the `k` stored vectors most similar to `target`.
///
/// Ties keep index order; a vector of a different dimensionality is an error.
pub fn nearest_neighbors(vectors: &[StoredVector], target: &[f32], k: usize) -> tantivy::Result<ScoredDocsQuery> {
	let mut candidates: Vec<(Score, DocAddress, SegmentId)> = Vec::with_capacity(vectors.len());
	for stored in vectors {
		if stored.vector.len() != target.len() {
			let DocAddress { segment_ord, doc_id } = stored.address;
			return Err(TantivyError::InvalidArgument(format!(
				"vector dimension mismatch: query has {}, document {segment_ord}/{doc_id} has {}", target.len(), stored.vector.len()
			)));
		}
		candidates.push((similarity(target, &stored.vector), stored.address, stored.segment_id));
	}
	candidates.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
	candidates.truncate(k);

	let mut per_segment: HashMap<SegmentId, Vec<(DocId, Score)>> = HashMap::new();
	for (score, address, segment_id) in candidates {
		per_segment.entry(segment_id).or_default().push((address.doc_id, score));
	}
	for docs in per_segment.values_mut() { docs.sort_by_key(|(doc, _)| *doc); }
	Ok(ScoredDocsQuery { per_segment: Arc::new(per_segment) })
}

/// Matches a fixed set of documents, each with a precomputed score.
#[derive(Clone, Debug)]
pub struct ScoredDocsQuery {
	per_segment: Arc<HashMap<SegmentId, Vec<(DocId, Score)>>>,
}

impl ScoredDocsQuery {
	pub fn len(&self) -> usize { self.per_segment.values().map(Vec::len).sum() }

	pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl Query for ScoredDocsQuery {
	fn weight(&self, _enable_scoring: EnableScoring<'_>) -> tantivy::Result<Box<dyn Weight>> {
		Ok(Box::new(ScoredDocsWeight { per_segment: Arc::clone(&self.per_segment) }))
	}
}

struct ScoredDocsWeight {
	per_segment: Arc<HashMap<SegmentId, Vec<(DocId, Score)>>>,
}

impl Weight for ScoredDocsWeight {
	fn scorer(&self, reader: &SegmentReader, boost: Score) -> tantivy::Result<Box<dyn Scorer>> {
		let docs = self.per_segment.get(&reader.segment_id()).cloned().unwrap_or_default();
		Ok(Box::new(ScoredDocsScorer { docs, cursor: 0, boost }))
	}

	fn explain(&self, reader: &SegmentReader, doc: DocId) -> tantivy::Result<Explanation> {
		self.per_segment
			.get(&reader.segment_id())
			.and_then(|docs| docs.iter().find(|(d, _)| *d == doc))
			.map(|(_, score)| Explanation::new("vector similarity", *score))
			.ok_or_else(|| TantivyError::InvalidArgument(format!("document {doc} is not a nearest neighbor")))
	}
}

struct ScoredDocsScorer {
	docs: Vec<(DocId, Score)>,
	cursor: usize,
	boost: Score,
}

impl DocSet for ScoredDocsScorer {
	fn advance(&mut self) -> DocId {
		if self.cursor < self.docs.len() { self.cursor += 1; }
		self.doc()
	}

	fn doc(&self) -> DocId { self.docs.get(self.cursor).map_or(TERMINATED, |(doc, _)| *doc) }

	fn size_hint(&self) -> u32 { self.docs.len() as u32 }
}

impl Scorer for ScoredDocsScorer {
	fn score(&mut self) -> Score { self.docs.get(self.cursor).map_or(0.0, |(_, score)| score * self.boost) }
}
