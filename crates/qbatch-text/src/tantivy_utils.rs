use tantivy::schema::{BytesOptions, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, STORED, STRING};
use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, StopWordFilter, TextAnalyzer, TokenStream};
use tantivy::Index;

/// Tokenizer name the text field is indexed with.
pub const TOKENIZER_NAME: &str = "qbatch_text";

pub const PATH_FIELD: &str = "path";
pub const TITLE_FIELD: &str = "title";
pub const CONTENTS_FIELD: &str = "contents";
pub const VECTOR_FIELD: &str = "contents-vector";

const STOP_WORDS: &[&str] = &[
	"a","an","and","are","as","at","be","but","by","for","if","in","into","is","it","no","not","of","on","or","such","that","the","their","then","there","these","they","this","to","was","will","with",
];

/// Schema layout the batch runner expects from a pre-built index.
pub fn build_schema() -> Schema {
	let mut schema_builder = Schema::builder();
	schema_builder.add_text_field(PATH_FIELD, STRING | STORED);
	schema_builder.add_text_field(TITLE_FIELD, STORED);
	let text_field_indexing = TextFieldIndexing::default().set_tokenizer(TOKENIZER_NAME).set_index_option(IndexRecordOption::WithFreqsAndPositions);
	schema_builder.add_text_field(CONTENTS_FIELD, TextOptions::default().set_indexing_options(text_field_indexing));
	schema_builder.add_bytes_field(VECTOR_FIELD, BytesOptions::default().set_stored());
	schema_builder.build()
}

pub fn build_analyzer() -> TextAnalyzer {
	TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(LowerCaser)
		.filter(StopWordFilter::remove(STOP_WORDS.iter().map(|s| s.to_string())))
		.build()
}

pub fn register_tokenizer(index: &Index) {
	index.tokenizers().register(TOKENIZER_NAME, build_analyzer());
}

/// Run `text` through `analyzer` and collect the surviving token texts in order.
pub fn analyze(analyzer: &mut TextAnalyzer, text: &str) -> Vec<String> {
	let mut stream = analyzer.token_stream(text);
	let mut tokens = Vec::new();
	while stream.advance() {
		tokens.push(stream.token().text.clone());
	}
	tokens
}

/// Vectors are stored as little-endian `f32`s in a bytes field.
pub fn encode_vector(vector: &[f32]) -> Vec<u8> {
	vector.iter().flat_map(|x| x.to_le_bytes()).collect()
}

pub fn decode_vector(bytes: &[u8]) -> Option<Vec<f32>> {
	if bytes.len() % 4 != 0 { return None; }
	Some(bytes.chunks_exact(4).map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]])).collect())
}
