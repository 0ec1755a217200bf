use std::path::Path;

use tantivy::schema::Field;
use tantivy::{Index, IndexWriter, TantivyDocument};

use qbatch_core::error::{Error, Result};

use crate::tantivy_utils::{build_schema, encode_vector, register_tokenizer, CONTENTS_FIELD, PATH_FIELD, TITLE_FIELD, VECTOR_FIELD};

/// One document as the index builder stores it.
#[derive(Debug, Clone, Default)]
pub struct SourceDocument {
	pub path: Option<String>,
	pub title: Option<String>,
	pub contents: String,
	pub vector: Option<Vec<f32>>,
}

impl SourceDocument {
	pub fn new(path: impl Into<String>, contents: impl Into<String>) -> Self {
		Self { path: Some(path.into()), contents: contents.into(), ..Self::default() }
	}

	pub fn with_title(mut self, title: impl Into<String>) -> Self { self.title = Some(title.into()); self }

	pub fn with_vector(mut self, vector: Vec<f32>) -> Self { self.vector = Some(vector); self }
}

/// Writes small indexes in the layout the batch runner reads.
///
/// Documents land in a single segment in insertion order. Used by tests and
/// for local experiments; production indexes are built elsewhere.
pub struct IndexBuilder {
	index: Index,
	path_field: Field,
	title_field: Field,
	contents_field: Field,
	vector_field: Field,
}

impl IndexBuilder {
	/// Create a fresh index in `index_dir`, replacing whatever was there.
	pub fn create(index_dir: &Path) -> Result<Self> {
		if index_dir.exists() { std::fs::remove_dir_all(index_dir)?; }
		std::fs::create_dir_all(index_dir)?;
		let index = Index::create_in_dir(index_dir, build_schema()).map_err(|e| Error::Index(e.to_string()))?;
		Self::for_index(index)
	}

	fn for_index(index: Index) -> Result<Self> {
		register_tokenizer(&index);
		let schema = index.schema();
		let field = |name: &str| schema.get_field(name).map_err(|e| Error::Index(e.to_string()));
		Ok(Self {
			path_field: field(PATH_FIELD)?,
			title_field: field(TITLE_FIELD)?,
			contents_field: field(CONTENTS_FIELD)?,
			vector_field: field(VECTOR_FIELD)?,
			index,
		})
	}

	/// Add all documents in one commit and hand back the index.
	pub fn write(self, docs: &[SourceDocument]) -> Result<Index> {
		let mut index_writer: IndexWriter = self.index.writer_with_num_threads(1, 20_000_000).map_err(|e| Error::Index(e.to_string()))?;
		for d in docs {
			let mut doc = TantivyDocument::default();
			if let Some(path) = &d.path { doc.add_text(self.path_field, path); }
			if let Some(title) = &d.title { doc.add_text(self.title_field, title); }
			doc.add_text(self.contents_field, &d.contents);
			if let Some(vector) = &d.vector { doc.add_bytes(self.vector_field, encode_vector(vector).as_slice()); }
			index_writer.add_document(doc).map_err(|e| Error::Index(e.to_string()))?;
		}
		index_writer.commit().map_err(|e| Error::Index(e.to_string()))?;
		Ok(self.index)
	}
}
