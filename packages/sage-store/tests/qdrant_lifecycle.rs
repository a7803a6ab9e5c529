//! Collection lifecycle tests against a live Qdrant. Set
//! `SAGE_QDRANT_URL` to run them; they skip silently otherwise.

use std::sync::Arc;

use serde_json::Map;
use uuid::Uuid;

use sage_domain::{KnowledgePoint, Point, point};
use sage_store::{filter::MetadataFilter, manager::CollectionManager, qdrant::VectorStore};
use sage_testkit::TestCollections;

const DIM: u32 = 4;

fn store(url: &str) -> Arc<VectorStore> {
	let cfg = sage_config::Qdrant {
		url: url.to_string(),
		api_key: None,
		vector_dim: DIM,
		timeout_ms: 10_000,
	};

	Arc::new(VectorStore::new(&cfg).expect("Failed to build vector store."))
}

fn knowledge_point(text: &str, vector: Vec<f32>) -> Point {
	Point {
		id: Uuid::new_v4(),
		vector,
		payload: KnowledgePoint { text: text.to_string(), metadata: Map::new() }.into_payload(),
	}
}

#[tokio::test]
async fn ensure_is_idempotent_under_concurrency() {
	let Some(url) = sage_testkit::env_qdrant_url() else {
		eprintln!("Skipping; set SAGE_QDRANT_URL to run Qdrant lifecycle tests.");

		return;
	};
	let collections = TestCollections::new(&url);
	let store = store(&url);
	let manager = Arc::new(CollectionManager::new(store.clone()));
	let name = format!("{}_knowledge", collections.identifier("ensure"));

	collections.track(&name);

	let mut handles = Vec::new();

	for _ in 0..8 {
		let manager = manager.clone();
		let name = name.clone();

		handles.push(tokio::spawn(async move { manager.ensure(&name, DIM).await }));
	}

	for handle in handles {
		handle.await.expect("Ensure task panicked.").expect("Ensure failed.");
	}

	assert!(store.exists(&name).await.expect("Existence check failed."));

	// A second round goes through the cache and still succeeds.
	manager.ensure(&name, DIM).await.expect("Cached ensure failed.");

	collections.cleanup().await.expect("Cleanup failed.");
}

#[tokio::test]
async fn upsert_rejects_the_whole_batch_on_a_bad_point() {
	let Some(url) = sage_testkit::env_qdrant_url() else {
		eprintln!("Skipping; set SAGE_QDRANT_URL to run Qdrant lifecycle tests.");

		return;
	};
	let collections = TestCollections::new(&url);
	let store = store(&url);
	let name = format!("{}_knowledge", collections.identifier("atomic"));

	collections.track(&name);
	store.create(&name, DIM).await.expect("Create failed.");

	let batch = vec![
		knowledge_point("first", vec![1.0, 0.0, 0.0, 0.0]),
		knowledge_point("second", vec![0.0, 1.0, 0.0, 0.0]),
		// Wrong dimensionality; the backend must refuse the batch.
		knowledge_point("third", vec![0.5, 0.5]),
	];
	let err = store.upsert(&name, batch).await.expect_err("Expected the batch to be rejected.");

	assert!(!err.is_retryable(), "Dimension errors must not be retryable: {err}");

	let hits = store
		.search(&name, vec![1.0, 0.0, 0.0, 0.0], 10, None)
		.await
		.expect("Search failed.");

	assert!(hits.is_empty(), "No point of the rejected batch may persist.");

	collections.cleanup().await.expect("Cleanup failed.");
}

#[tokio::test]
async fn search_honors_equality_filters() {
	let Some(url) = sage_testkit::env_qdrant_url() else {
		eprintln!("Skipping; set SAGE_QDRANT_URL to run Qdrant lifecycle tests.");

		return;
	};
	let collections = TestCollections::new(&url);
	let store = store(&url);
	let name = format!("{}_knowledge", collections.identifier("filter"));

	collections.track(&name);
	store.create(&name, DIM).await.expect("Create failed.");

	let indexed = knowledge_point("kept", vec![1.0, 0.0, 0.0, 0.0]);
	let indexed_id = indexed.id;

	store.upsert(&name, vec![indexed]).await.expect("Upsert failed.");

	let matching = MetadataFilter::new()
		.equals(point::FIELD_SOURCE_TYPE, point::SOURCE_TYPE_KNOWLEDGE);
	let hits = store
		.search(&name, vec![1.0, 0.0, 0.0, 0.0], 10, Some(&matching))
		.await
		.expect("Filtered search failed.");

	assert_eq!(hits.len(), 1);
	assert_eq!(hits[0].id, indexed_id);
	assert_eq!(hits[0].text(), Some("kept"));

	let excluding = MetadataFilter::new()
		.equals(point::FIELD_SOURCE_TYPE, point::SOURCE_TYPE_JOURNAL);
	let hits = store
		.search(&name, vec![1.0, 0.0, 0.0, 0.0], 10, Some(&excluding))
		.await
		.expect("Filtered search failed.");

	assert!(hits.is_empty());

	collections.cleanup().await.expect("Cleanup failed.");
}

#[tokio::test]
async fn deleted_collections_stop_existing() {
	let Some(url) = sage_testkit::env_qdrant_url() else {
		eprintln!("Skipping; set SAGE_QDRANT_URL to run Qdrant lifecycle tests.");

		return;
	};
	let collections = TestCollections::new(&url);
	let store = store(&url);
	let name = format!("{}_knowledge", collections.identifier("delete"));

	collections.track(&name);
	store.create(&name, DIM).await.expect("Create failed.");
	assert!(store.exists(&name).await.expect("Existence check failed."));

	store.delete_collection(&name).await.expect("Delete failed.");

	assert!(!store.exists(&name).await.expect("Existence check failed."));

	collections.cleanup().await.expect("Cleanup failed.");
}
