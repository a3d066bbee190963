//! Integration tests for ingestion, persistence and filtered search.

use serde_json::json;
use std::sync::Arc;
use tempfile::tempdir;
use vectordb::demo::{run_scenarios, sample_documents};
use vectordb::embeddings::{self, EmbeddingProvider, HashingEmbedder, DEFAULT_MODEL};
use vectordb::filter::{DocumentFilter, Predicate};
use vectordb::{DatabaseError, DistanceMetric, Document, SearchRequest, VectorStore};

fn embedder() -> Arc<dyn EmbeddingProvider> {
    Arc::new(HashingEmbedder::new(384))
}

#[tokio::test]
async fn test_demo_scenarios() {
    let dir = tempdir().unwrap();
    let store = VectorStore::from_documents(sample_documents(), embedder(), dir.path())
        .await
        .unwrap();
    assert_eq!(store.count().unwrap(), 4);

    let results = run_scenarios(&store).await.unwrap();
    assert_eq!(results.len(), 3);

    let (a, b, c) = (&results[0], &results[1], &results[2]);

    // A: unfiltered, k=2
    assert_eq!(a.hits.len(), 2);

    // B: Executive only, k=1
    assert!(b.hits.len() <= 1);
    for hit in &b.hits {
        assert_eq!(hit.document.metadata["access_level"], "Executive");
    }

    // C: year 2024 OR Developer, k=3
    assert!(!c.hits.is_empty());
    assert!(c.hits.len() <= 3);
    for hit in &c.hits {
        let meta = &hit.document.metadata;
        assert!(meta["year"] == json!(2024) || meta["access_level"] == "Developer");
    }
    // Marketing_Plan (2025, Public) is the only excluded document
    assert!(c.hits.iter().all(|h| h.document.metadata["source"] != "Marketing_Plan"));

    for result in &results {
        for pair in result.hits.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
    }
}

#[tokio::test]
async fn test_filter_with_no_matches_is_empty() {
    let dir = tempdir().unwrap();
    let store = VectorStore::from_documents(sample_documents(), embedder(), dir.path())
        .await
        .unwrap();

    let filter = Predicate::from_where(&json!({"access_level": "Board"})).unwrap();
    let hits = store
        .similarity_search("financial results", 1, Some(&filter))
        .await
        .unwrap();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn test_k_bounds() {
    let dir = tempdir().unwrap();
    let store = VectorStore::from_documents(sample_documents(), embedder(), dir.path())
        .await
        .unwrap();

    assert!(store.similarity_search("anything", 0, None).await.unwrap().is_empty());
    assert_eq!(store.similarity_search("anything", 10, None).await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_reopen_returns_same_results() {
    let dir = tempdir().unwrap();
    let query = "Tell me about the recent technology updates.";

    let before = {
        let store = VectorStore::from_documents(sample_documents(), embedder(), dir.path())
            .await
            .unwrap();
        store.persist().unwrap();
        store.similarity_search(query, 3, None).await.unwrap()
    };

    let store = VectorStore::open(dir.path(), "langchain", embedder(), DistanceMetric::Cosine).unwrap();
    assert_eq!(store.count().unwrap(), 4);
    assert_eq!(store.similarity_search(query, 3, None).await.unwrap(), before);
}

#[tokio::test]
async fn test_reingest_is_idempotent() {
    let dir = tempdir().unwrap();
    let store = VectorStore::from_documents(sample_documents(), embedder(), dir.path())
        .await
        .unwrap();

    let first = store.add_documents(sample_documents()).await.unwrap();
    let second = store.add_documents(sample_documents()).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(store.count().unwrap(), 4);
}

#[tokio::test]
async fn test_dimension_mismatch_on_reopen() {
    let dir = tempdir().unwrap();
    {
        let store = VectorStore::open(dir.path(), "docs", embedder(), DistanceMetric::Cosine).unwrap();
        store.add_documents(sample_documents()).await.unwrap();
    }

    let small: Arc<dyn EmbeddingProvider> = Arc::new(HashingEmbedder::new(16));
    match VectorStore::open(dir.path(), "docs", small, DistanceMetric::Cosine) {
        Err(DatabaseError::DimensionMismatch { expected, actual, .. }) => {
            assert_eq!(expected, 384);
            assert_eq!(actual, 16);
        }
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("opened collection with wrong dimensions"),
    }
}

#[tokio::test]
async fn test_collections_are_isolated() {
    let dir = tempdir().unwrap();
    {
        let a = VectorStore::open(dir.path(), "alpha", embedder(), DistanceMetric::Cosine).unwrap();
        a.add_documents(sample_documents()).await.unwrap();
    }

    let b = VectorStore::open(dir.path(), "beta", embedder(), DistanceMetric::L2).unwrap();
    assert_eq!(b.count().unwrap(), 0);
    assert_eq!(b.collection().metric, DistanceMetric::L2);
    assert!(b.similarity_search("earnings", 3, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_metric_is_fixed_at_creation() {
    let dir = tempdir().unwrap();
    {
        VectorStore::open(dir.path(), "docs", embedder(), DistanceMetric::L2).unwrap();
    }
    let store = VectorStore::open(dir.path(), "docs", embedder(), DistanceMetric::Cosine).unwrap();
    assert_eq!(store.collection().metric, DistanceMetric::L2);
}

#[tokio::test]
async fn test_delete_and_get_where() {
    let dir = tempdir().unwrap();
    let store = VectorStore::open(dir.path(), "docs", embedder(), DistanceMetric::Cosine).unwrap();
    let ids = store.add_documents(sample_documents()).await.unwrap();

    let executive = Predicate::from_where(&json!({"access_level": "Executive"})).unwrap();
    assert_eq!(store.get_where(&executive).unwrap().len(), 2);

    let stored = store.get(ids[0]).unwrap().unwrap();
    assert_eq!(stored.document.metadata["source"], "Finance_Report");
    assert_eq!(store.get_embedding(ids[0]).unwrap().unwrap().len(), 384);

    assert_eq!(store.delete(&[ids[0], uuid::Uuid::new_v4()]).unwrap(), 1);
    assert!(store.get(ids[0]).unwrap().is_none());
    assert_eq!(store.get_where(&executive).unwrap().len(), 1);
    assert_eq!(store.delete(&[ids[0]]).unwrap(), 0);

    drop(store);
    let store = VectorStore::open(dir.path(), "docs", embedder(), DistanceMetric::Cosine).unwrap();
    assert_eq!(store.count().unwrap(), 3);
}

#[tokio::test]
async fn test_invalid_input_is_rejected() {
    let dir = tempdir().unwrap();
    let store = VectorStore::open(dir.path(), "docs", embedder(), DistanceMetric::Cosine).unwrap();

    let bad = vec![
        Document::new("ok").with("year", 2024),
        Document::new("bad").with("tags", json!(["a"])),
    ];
    assert!(matches!(
        store.add_documents(bad).await,
        Err(DatabaseError::InvalidMetadata { .. })
    ));
    assert_eq!(store.count().unwrap(), 0);

    let ids = vec![uuid::Uuid::new_v4()];
    assert!(matches!(
        store.add_documents_with_ids(sample_documents(), ids).await,
        Err(DatabaseError::InvalidArgument(_))
    ));

    assert!(matches!(
        store.similarity_search_by_vector(&[1.0, 0.0], 1, None),
        Err(DatabaseError::DimensionMismatch { .. })
    ));

    assert!(VectorStore::open(dir.path(), "bad:name", embedder(), DistanceMetric::Cosine).is_err());
}

#[tokio::test]
async fn test_add_texts_and_document_filter() {
    let dir = tempdir().unwrap();
    let store = VectorStore::open(dir.path(), "docs", embedder(), DistanceMetric::Cosine).unwrap();

    let texts = vec![
        "latency dropped after the migration".to_string(),
        "latency budgets for mobile clients".to_string(),
        "quarterly revenue summary".to_string(),
    ];
    let metadatas = vec![
        serde_json::from_value(json!({"team": "infra"})).unwrap(),
        serde_json::from_value(json!({"team": "mobile"})).unwrap(),
        serde_json::from_value(json!({"team": "finance"})).unwrap(),
    ];
    store.add_texts(texts, Some(metadatas)).await.unwrap();

    let request = SearchRequest::new(5).document_filter(DocumentFilter::Contains("latency".into()));
    let hits = store.search("latency", &request).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|h| h.document.page_content.contains("latency")));

    let request = SearchRequest::new(5)
        .filter(Predicate::from_where(&json!({"team": {"$ne": "infra"}})).unwrap())
        .document_filter(DocumentFilter::Contains("latency".into()));
    let hits = store.search("latency", &request).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].document.metadata["team"], "mobile");

    assert!(store.add_texts(vec!["x".into()], Some(vec![])).await.is_err());
}

#[tokio::test]
async fn test_search_by_vector_matches_text_search() {
    let dir = tempdir().unwrap();
    let hashing = HashingEmbedder::new(384);
    let store = VectorStore::from_documents(sample_documents(), Arc::new(hashing.clone()), dir.path())
        .await
        .unwrap();

    let query = "cloud services revenue";
    let by_text = store.similarity_search(query, 2, None).await.unwrap();
    let by_vector = store
        .similarity_search_by_vector(&hashing.embed_sync(query), 2, None)
        .unwrap();

    assert_eq!(by_text, by_vector);
    assert_eq!(by_text[0].metadata["source"], "Finance_Report");
}

#[tokio::test]
#[ignore] // Downloads all-MiniLM-L6-v2
async fn test_demo_scenarios_with_default_model() {
    let dir = tempdir().unwrap();
    let embedder = embeddings::provider_for_model(DEFAULT_MODEL)
        .await
        .expect("Failed to load model");
    assert_eq!(embedder.dimensions(), 384);

    let store = VectorStore::from_documents(sample_documents(), embedder, dir.path())
        .await
        .unwrap();
    assert_eq!(store.collection().model, DEFAULT_MODEL);

    let results = run_scenarios(&store).await.unwrap();
    let (a, b, c) = (&results[0], &results[1], &results[2]);

    // Advertising question lands on the marketing plan
    assert_eq!(a.hits.len(), 2);
    assert_eq!(a.hits[0].document.metadata["source"], "Marketing_Plan");

    assert_eq!(b.hits.len(), 1);
    assert_eq!(b.hits[0].document.metadata["access_level"], "Executive");

    assert_eq!(c.hits.len(), 3);
    assert!(c.hits.iter().all(|h| h.document.metadata["source"] != "Marketing_Plan"));
}
