//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod mocks;

use std::sync::Arc;

use ragkit::db::{EmbeddedVectorStore, VectorStore};
use ragkit_vector::{CollectionSchema, DistanceMetric, NewDocument};

/// In-memory store holding one flushed 2-d cosine collection named `docs`.
pub async fn seeded_store(documents: &[(&str, [f32; 2])]) -> Arc<dyn VectorStore> {
    let store = EmbeddedVectorStore::in_memory().await.unwrap();
    store
        .create_collection(CollectionSchema::new("docs", 2, DistanceMetric::Cosine))
        .await
        .unwrap();
    let batch: Vec<NewDocument> = documents
        .iter()
        .map(|(text, v)| NewDocument::new(*text, v.to_vec()))
        .collect();
    if !batch.is_empty() {
        store.insert("docs", &batch).await.unwrap();
        store.flush("docs").await.unwrap();
    }
    Arc::new(store)
}
