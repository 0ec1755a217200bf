use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tantivy::collector::{Count, TopDocs};
use tantivy::query::{BooleanQuery, EmptyQuery, Occur as TantivyOccur, PhraseQuery, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Schema, Value};
use tantivy::{DocAddress, Index, ReloadPolicy, Searcher, TantivyDocument, Term};
use tracing::debug;

use qbatch_core::error::{Error, Result};
use qbatch_core::traits::IndexService;
use qbatch_core::types::{DocRef, DocumentRecord, Occur, QueryTree, ScoredDoc, TopHits};

use crate::knn::{load_vectors, nearest_neighbors, StoredVector};
use crate::tantivy_utils::{register_tokenizer, PATH_FIELD, TITLE_FIELD};

fn index_error(e: tantivy::TantivyError) -> Error { Error::Index(e.to_string()) }

/// Read-only search over a pre-built tantivy index.
///
/// One searcher is acquired when the service is opened and used for the whole
/// run; the index is never reloaded, so vectors decoded for kNN clauses stay
/// valid and are kept per field.
pub struct TantivyIndexService {
	searcher: Searcher,
	schema: Schema,
	path_field: Option<Field>,
	title_field: Option<Field>,
	vectors: Mutex<HashMap<Field, Arc<Vec<StoredVector>>>>,
}

impl TantivyIndexService {
	pub fn open(index_dir: &Path) -> Result<Self> {
		if !index_dir.is_dir() {
			return Err(Error::InvalidConfig(format!("index directory {} does not exist", index_dir.display())));
		}
		let index = Index::open_in_dir(index_dir)
			.map_err(|e| Error::InvalidConfig(format!("cannot open index at {}: {e}", index_dir.display())))?;
		Self::from_index(&index)
	}

	pub fn from_index(index: &Index) -> Result<Self> {
		register_tokenizer(index);
		let reader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into().map_err(index_error)?;
		let searcher = reader.searcher();
		let schema = index.schema();
		let path_field = schema.get_field(PATH_FIELD).ok();
		let title_field = schema.get_field(TITLE_FIELD).ok();
		debug!(docs = searcher.num_docs(), segments = searcher.segment_readers().len(), "index opened");
		Ok(Self { searcher, schema, path_field, title_field, vectors: Mutex::default() })
	}

	pub fn num_docs(&self) -> u64 { self.searcher.num_docs() }

	fn stored_vectors(&self, field: Field) -> Result<Arc<Vec<StoredVector>>> {
		let mut cache = self.vectors.lock().map_err(|_| Error::Index("vector cache lock poisoned".into()))?;
		if let Some(vectors) = cache.get(&field) {
			return Ok(Arc::clone(vectors));
		}
		let vectors = Arc::new(load_vectors(&self.searcher, field).map_err(index_error)?);
		debug!(field = self.schema.get_field_name(field), vectors = vectors.len(), "document vectors loaded");
		cache.insert(field, Arc::clone(&vectors));
		Ok(vectors)
	}

	fn indexed_field(&self, name: &str) -> Option<Field> {
		let field = self.schema.get_field(name).ok()?;
		self.schema.get_field_entry(field).is_indexed().then_some(field)
	}

	/// Translate a query tree into an executable tantivy query.
	///
	/// Terms on fields the index does not have (or does not index) match nothing.
	fn compile(&self, query: &QueryTree) -> Result<Box<dyn Query>> {
		let compiled: Box<dyn Query> = match query {
			QueryTree::Term { field, text } => match self.indexed_field(field) {
				Some(f) => Box::new(TermQuery::new(Term::from_field_text(f, text), IndexRecordOption::WithFreqs)),
				None => Box::new(EmptyQuery),
			},
			QueryTree::Phrase { field, terms } => match self.indexed_field(field) {
				Some(f) if terms.len() > 1 => Box::new(PhraseQuery::new(terms.iter().map(|t| Term::from_field_text(f, t)).collect())),
				Some(f) if terms.len() == 1 => Box::new(TermQuery::new(Term::from_field_text(f, &terms[0]), IndexRecordOption::WithFreqs)),
				_ => Box::new(EmptyQuery),
			},
			QueryTree::Boolean(clauses) => {
				let mut subqueries = Vec::with_capacity(clauses.len());
				for clause in clauses {
					let occur = match clause.occur {
						Occur::Must => TantivyOccur::Must,
						Occur::Should => TantivyOccur::Should,
						Occur::MustNot => TantivyOccur::MustNot,
					};
					subqueries.push((occur, self.compile(&clause.query)?));
				}
				Box::new(BooleanQuery::new(subqueries))
			}
			QueryTree::Knn { field, vector, k } => {
				let f = self.schema.get_field(field).map_err(|_| Error::Index(format!("vector field '{field}' is not in the index schema")))?;
				let neighbors = nearest_neighbors(&self.stored_vectors(f)?, vector, *k).map_err(index_error)?;
				debug!(field = %field, k, found = neighbors.len(), "nearest neighbors resolved");
				Box::new(neighbors)
			}
		};
		Ok(compiled)
	}
}

impl IndexService for TantivyIndexService {
	fn search(&self, query: &QueryTree, limit: usize) -> Result<TopHits> {
		if limit == 0 {
			return Err(Error::Index("search limit must be greater than 0".into()));
		}
		let compiled = self.compile(query)?;
		let (top_docs, total_hits) = self.searcher.search(&*compiled, &(TopDocs::with_limit(limit), Count)).map_err(index_error)?;
		let hits = top_docs
			.into_iter()
			.map(|(score, addr)| ScoredDoc { doc: DocRef::new(addr.segment_ord, addr.doc_id), score })
			.collect();
		Ok(TopHits { total_hits, hits })
	}

	fn lookup(&self, doc: DocRef) -> Result<DocumentRecord> {
		let stored: TantivyDocument = self.searcher.doc(DocAddress::new(doc.segment, doc.doc)).map_err(index_error)?;
		let text = |field: Option<Field>| field.and_then(|f| stored.get_first(f)).and_then(|v| v.as_str().map(str::to_string));
		Ok(DocumentRecord { path: text(self.path_field), title: text(self.title_field) })
	}
}
