#![allow(dead_code)]

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use userlayer::{
    backend::{DeleteResult, InsertManyResult, StoreBackend, UpdateResult},
    bson::{Document, doc},
    error::DocumentStoreResult,
    memory::InMemoryStore,
    query::{Filter, Query},
};

/// An in-memory backend that counts how often it is called.
#[derive(Debug, Clone, Default)]
pub struct CountingBackend {
    inner: InMemoryStore,
    calls: Arc<AtomicUsize>,
}

impl CountingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl StoreBackend for CountingBackend {
    async fn insert_one(&self, record: Document, collection: &str) -> DocumentStoreResult<Document> {
        self.hit();
        self.inner.insert_one(record, collection).await
    }

    async fn insert_many(
        &self,
        records: Vec<Document>,
        collection: &str,
    ) -> DocumentStoreResult<InsertManyResult> {
        self.hit();
        self.inner.insert_many(records, collection).await
    }

    async fn find(&self, query: Query, collection: &str) -> DocumentStoreResult<Vec<Document>> {
        self.hit();
        self.inner.find(query, collection).await
    }

    async fn update_one(
        &self,
        filter: Filter,
        payload: Document,
        collection: &str,
    ) -> DocumentStoreResult<UpdateResult> {
        self.hit();
        self.inner.update_one(filter, payload, collection).await
    }

    async fn update_many(
        &self,
        filter: Filter,
        payload: Document,
        collection: &str,
    ) -> DocumentStoreResult<UpdateResult> {
        self.hit();
        self.inner.update_many(filter, payload, collection).await
    }

    async fn delete_one(&self, filter: Filter, collection: &str) -> DocumentStoreResult<DeleteResult> {
        self.hit();
        self.inner.delete_one(filter, collection).await
    }

    async fn delete_many(&self, filter: Filter, collection: &str) -> DocumentStoreResult<DeleteResult> {
        self.hit();
        self.inner.delete_many(filter, collection).await
    }

    async fn create_collection(&self, name: &str) -> DocumentStoreResult<()> {
        self.inner.create_collection(name).await
    }

    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        self.inner.drop_collection(name).await
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        self.inner.list_collections().await
    }
}

/// Stored user records with fixed timestamps, so two stores can hold identical state.
pub fn seed_records() -> Vec<Document> {
    vec![
        doc! {
            "id": "ada@example.com",
            "name": "Ada",
            "authStrategy": "local",
            "createdAt": "2024-01-01T00:00:00.000Z",
            "settings": {},
        },
        doc! {
            "id": "grace@example.com",
            "name": "Grace",
            "authStrategy": "local",
            "createdAt": "2024-01-02T00:00:00.000Z",
            "settings": {},
        },
    ]
}

pub async fn seeded_backend() -> InMemoryStore {
    let backend = InMemoryStore::new();

    backend
        .insert_many(seed_records(), "users")
        .await
        .expect("seeding failed");

    backend
}
