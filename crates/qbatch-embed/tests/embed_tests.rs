use std::fs;

use qbatch_core::error::Error;
use qbatch_core::traits::Embedder;
use qbatch_embed::{get_default_embedder, HashEmbedder, VectorDictEmbedder};
use tempfile::TempDir;

#[test]
fn fake_embedder_shapes_and_determinism() {
    // Force fake embedder to avoid needing a dictionary
    std::env::set_var("APP_USE_FAKE_EMBEDDINGS", "1");

    let embedder = get_default_embedder(std::path::Path::new("/nonexistent/knn-dict")).expect("embedder");
    let v1 = embedder.embed_text("hello world").expect("embed");
    let v2 = embedder.embed_text("hello world").expect("embed");

    assert_eq!(v1.len(), 1024, "embedding dim is 1024");
    assert_eq!(embedder.dim(), 1024);

    // Norm approximately 1.0
    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    // Deterministic for same input
    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn hash_embedder_rejects_empty_text() {
    let embedder = HashEmbedder::new(16);
    assert!(matches!(embedder.embed_text("   "), Err(Error::Embedding(_))));
}

#[test]
fn dictionary_embedder_loads_from_disk() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("knn-dict");
    fs::write(&path, "dog 0 1 0\nbark 0 0 1\n").unwrap();

    let embedder = VectorDictEmbedder::load(&path).expect("load");
    assert_eq!(embedder.dim(), 3);
    let v = embedder.embed_text("dog").expect("embed");
    assert_eq!(v, vec![0.0, 1.0, 0.0]);
}

#[test]
fn missing_dictionary_is_not_found() {
    let tmp = TempDir::new().unwrap();
    let err = VectorDictEmbedder::load(&tmp.path().join("absent")).err().expect("must fail");
    assert!(matches!(err, Error::NotFound(_)));
}
