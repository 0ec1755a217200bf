use std::sync::atomic::{AtomicUsize, Ordering};

use qbatch_core::error::{Error, Result};
use qbatch_core::traits::Embedder;
use qbatch_core::types::{Occur, QueryTree};
use qbatch_embed::HashEmbedder;
use qbatch_hybrid::{SemanticAugmenter, TermExtractor};
use qbatch_text::QueryParser;

/// Records every text it is asked to embed.
struct CountingEmbedder {
    calls: AtomicUsize,
    last: std::sync::Mutex<Option<String>>,
}

impl CountingEmbedder {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            last: std::sync::Mutex::new(None),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last(&self) -> Option<String> {
        self.last.lock().unwrap().clone()
    }
}

impl Embedder for CountingEmbedder {
    fn dim(&self) -> usize {
        2
    }

    fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(text.to_string());
        Ok(vec![1.0, 0.0])
    }
}

struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn dim(&self) -> usize {
        2
    }

    fn embed_text(&self, _text: &str) -> Result<Vec<f32>> {
        Err(Error::Embedding("dictionary unavailable".into()))
    }
}

#[test]
fn negated_terms_are_not_extracted_from_parsed_queries() {
    let q = QueryParser::new("contents").parse("dog AND NOT bark").unwrap();
    assert_eq!(TermExtractor::new("contents").extract(&q), vec!["dog"]);

    let q = QueryParser::new("contents").parse("(cat OR title:bird) -(fish +dog) \"big cat\"").unwrap();
    assert_eq!(TermExtractor::new("contents").extract(&q), vec!["cat", "big", "cat"]);
    assert_eq!(TermExtractor::new("title").extract(&q), vec!["bird"]);
}

#[test]
fn augmentation_embeds_joined_terms_and_ors_a_knn_clause() {
    let embedder = CountingEmbedder::new();
    let augmenter = SemanticAugmenter::new(&embedder, "contents", "contents-vector");
    let q = QueryParser::new("contents").parse("dog AND NOT bark AND sleeps").unwrap();

    let combined = augmenter.augment_query(q.clone(), 5).unwrap();
    assert_eq!(embedder.calls(), 1);
    assert_eq!(embedder.last().as_deref(), Some("dog sleeps"));
    let QueryTree::Boolean(clauses) = &combined else { panic!("expected a boolean group, got {combined}") };
    assert_eq!(clauses.len(), 2);
    assert!(clauses.iter().all(|c| c.occur == Occur::Should));
    assert_eq!(clauses[0].query, q);
    assert_eq!(clauses[1].query, QueryTree::Knn { field: "contents-vector".into(), vector: vec![1.0, 0.0], k: 5 });
}

#[test]
fn zero_k_and_empty_terms_leave_the_query_untouched() {
    let embedder = CountingEmbedder::new();
    let augmenter = SemanticAugmenter::new(&embedder, "contents", "contents-vector");
    let q = QueryParser::new("contents").parse("dog -bark").unwrap();

    assert_eq!(augmenter.augment_query(q.clone(), 0).unwrap(), q);
    assert_eq!(augmenter.augment(q.clone(), &[], 5).unwrap(), q);
    let other_field = QueryParser::new("contents").parse("title:cat").unwrap();
    assert_eq!(augmenter.augment_query(other_field.clone(), 5).unwrap(), other_field);
    assert_eq!(embedder.calls(), 0);
}

#[test]
fn already_augmented_queries_are_not_augmented_again() {
    let embedder = CountingEmbedder::new();
    let augmenter = SemanticAugmenter::new(&embedder, "contents", "contents-vector");
    let q = QueryParser::new("contents").parse("dog").unwrap();
    let once = augmenter.augment_query(q, 3).unwrap();
    let twice = augmenter.augment_query(once.clone(), 3).unwrap();
    assert_eq!(once, twice);
    assert_eq!(embedder.calls(), 1);
}

#[test]
fn embedding_failures_propagate() {
    let augmenter = SemanticAugmenter::new(&FailingEmbedder, "contents", "contents-vector");
    let q = QueryParser::new("contents").parse("dog").unwrap();
    let err = augmenter.augment_query(q, 5).unwrap_err();
    assert!(matches!(err, Error::Embedding(_)), "{err}");
}

#[test]
fn hash_embedder_vectors_have_the_embedder_dimension() {
    let embedder = HashEmbedder::new(16);
    let augmenter = SemanticAugmenter::new(&embedder, "contents", "contents-vector");
    let q = QueryParser::new("contents").parse("quiet dog").unwrap();
    match augmenter.augment_query(q, 2).unwrap() {
        QueryTree::Boolean(clauses) => match &clauses[1].query {
            QueryTree::Knn { vector, k, .. } => {
                assert_eq!(vector.len(), 16);
                assert_eq!(*k, 2);
            }
            other => panic!("expected knn clause, got {other}"),
        },
        other => panic!("expected boolean group, got {other}"),
    }
}
