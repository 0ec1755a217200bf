use qbatch_core::error::Error;
use qbatch_core::traits::IndexService;
use qbatch_core::types::{Clause, DocRef, QueryTree};
use qbatch_text::{IndexBuilder, QueryParser, SourceDocument, TantivyIndexService};
use tempfile::TempDir;

fn corpus() -> Vec<SourceDocument> {
    vec![
        SourceDocument::new("/docs/cat.txt", "the cat sat on the mat").with_title("Cats").with_vector(vec![1.0, 0.0, 0.0]),
        SourceDocument::new("/docs/dog.txt", "a dog will bark at the cat").with_vector(vec![0.0, 1.0, 0.0]),
        SourceDocument::new("/docs/quiet-dog.txt", "the quiet dog sleeps").with_vector(vec![0.0, 0.9, 0.1]),
        SourceDocument { path: None, title: Some("Orphan".into()), contents: "a dog without a path".into(), vector: None },
        SourceDocument::new("/docs/fish.txt", "fish swim in the sea").with_vector(vec![0.0, 0.0, 1.0]),
    ]
}

fn open_fixture() -> (TempDir, TantivyIndexService) {
    let tmp = TempDir::new().expect("tempdir");
    let index_dir = tmp.path().join("index");
    IndexBuilder::create(&index_dir).expect("builder").write(&corpus()).expect("write");
    let service = TantivyIndexService::open(&index_dir).expect("open");
    (tmp, service)
}

fn paths(service: &TantivyIndexService, query: &QueryTree, limit: usize) -> Vec<Option<String>> {
    let top = service.search(query, limit).expect("search");
    top.hits.iter().map(|h| service.lookup(h.doc).expect("lookup").path).collect()
}

#[test]
fn parsed_queries_run_against_the_index() {
    let (_tmp, service) = open_fixture();
    assert_eq!(service.num_docs(), 5);
    let parser = QueryParser::new("contents");

    let top = service.search(&parser.parse("dog").unwrap(), 10).unwrap();
    assert_eq!(top.total_hits, 3);
    assert_eq!(top.hits.len(), 3);
    for pair in top.hits.windows(2) { assert!(pair[0].score >= pair[1].score); }

    let got = paths(&service, &parser.parse("dog AND NOT bark").unwrap(), 10);
    assert_eq!(got.len(), 2);
    assert!(!got.contains(&Some("/docs/dog.txt".to_string())));

    let got = paths(&service, &parser.parse("\"quiet dog\"").unwrap(), 10);
    assert_eq!(got, vec![Some("/docs/quiet-dog.txt".to_string())]);
}

#[test]
fn total_hits_counts_beyond_the_limit() {
    let (_tmp, service) = open_fixture();
    let top = service.search(&QueryTree::term("contents", "dog"), 1).unwrap();
    assert_eq!(top.total_hits, 3);
    assert_eq!(top.hits.len(), 1);
}

#[test]
fn lookup_returns_optional_fields() {
    let (_tmp, service) = open_fixture();
    let first = service.lookup(DocRef::new(0, 0)).unwrap();
    assert_eq!(first.path.as_deref(), Some("/docs/cat.txt"));
    assert_eq!(first.title.as_deref(), Some("Cats"));
    let orphan = service.lookup(DocRef::new(0, 3)).unwrap();
    assert_eq!(orphan.path, None);
    assert_eq!(orphan.title.as_deref(), Some("Orphan"));
}

#[test]
fn unknown_and_unindexed_fields_match_nothing() {
    let (_tmp, service) = open_fixture();
    assert_eq!(service.search(&QueryTree::term("nope", "dog"), 10).unwrap().total_hits, 0);
    // `title` is stored only
    assert_eq!(service.search(&QueryTree::term("title", "cats"), 10).unwrap().total_hits, 0);
    assert_eq!(service.search(&QueryTree::empty(), 10).unwrap().total_hits, 0);
}

#[test]
fn knn_clause_finds_nearest_vectors() {
    let (_tmp, service) = open_fixture();
    let knn = QueryTree::Knn { field: "contents-vector".into(), vector: vec![0.0, 1.0, 0.0], k: 2 };
    let got = paths(&service, &knn, 10);
    assert_eq!(got, vec![Some("/docs/dog.txt".to_string()), Some("/docs/quiet-dog.txt".to_string())]);

    // OR-combined with a lexical clause: fish matches lexically, dogs by vector
    let combined = QueryTree::Boolean(vec![Clause::should(QueryTree::term("contents", "fish")), Clause::should(knn)]);
    let top = service.search(&combined, 10).unwrap();
    assert_eq!(top.total_hits, 3);
}

#[test]
fn knn_dimension_mismatch_is_an_error() {
    let (_tmp, service) = open_fixture();
    let knn = QueryTree::Knn { field: "contents-vector".into(), vector: vec![1.0, 0.0], k: 2 };
    let err = service.search(&knn, 10).unwrap_err();
    assert!(matches!(err, Error::Index(_)), "{err}");
}

#[test]
fn missing_index_is_a_configuration_error() {
    let tmp = TempDir::new().unwrap();
    let err = TantivyIndexService::open(&tmp.path().join("absent")).err().expect("must fail");
    assert!(matches!(err, Error::InvalidConfig(_)));
}
