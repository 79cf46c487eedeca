//! In-memory storage implementation for record stores.
//!
//! Records are kept as BSON documents in maps ordered by primary key, guarded by an
//! async-aware read-write lock. Every write takes the write lock for its whole duration, so
//! each insert, update and delete is atomic with respect to the others.
//!
//! Reads return matches in key order. Other backends make no such promise.

use std::{collections::{BTreeMap, HashMap}, sync::Arc};
use async_trait::async_trait;
use mea::rwlock::RwLock;
use bson::{Bson, Document};
use tracing::debug;

use userlayer_core::{
    backend::{DeleteResult, InsertManyResult, StoreBackend, StoreBackendBuilder, UpdateResult},
    error::{DocumentStoreError, DocumentStoreResult},
    query::{Filter, Query},
    record::ID_FIELD,
};

use crate::evaluator::RecordEvaluator;

type CollectionMap = BTreeMap<String, Document>;
type StoreMap = HashMap<String, CollectionMap>;

/// Thread-safe in-memory record storage backend.
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state, allowing
/// it to be safely shared across async tasks. Multiple clones of the same instance
/// share the same underlying data.
///
/// # Performance
///
/// Queries scan every record in a collection (no indexing). That is fine for tests and
/// development; use a persistent backend for anything larger.
///
/// # Example
///
/// ```ignore
/// use userlayer_memory::InMemoryStore;
/// use userlayer::{backend::StoreBackend, query::Query};
/// use bson::doc;
///
/// let store = InMemoryStore::new();
///
/// store.insert_one(doc! { "id": "ada@example.com", "name": "Ada" }, "users").await?;
///
/// let records = store.find(Query::new(), "users").await?;
/// assert_eq!(records.len(), 1);
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// collection_name -> (record_id -> record)
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    /// Creates a builder for constructing an `InMemoryStore`.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use userlayer_memory::InMemoryStore;
    ///
    /// let store = InMemoryStore::builder().build().await?;
    /// ```
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }

    async fn update(
        &self,
        filter: Filter,
        payload: Document,
        collection: &str,
        limit: usize,
    ) -> DocumentStoreResult<UpdateResult> {
        let mut store = self.store.write().await;
        let collection_map = match store.get_mut(collection) {
            Some(col) => col,
            None => return Ok(UpdateResult::default()),
        };

        let matched = RecordEvaluator::filter_records(collection_map.values(), &filter)
            .into_iter()
            .take(limit)
            .map(|record| Ok((record_id(record)?.to_string(), apply_set(record, &payload)?)))
            .collect::<DocumentStoreResult<Vec<_>>>()?;

        // Every change is computed before any is written, so a rejected update leaves
        // the collection untouched.
        let mut result = UpdateResult {
            matched_count: matched.len() as u64,
            ..UpdateResult::default()
        };

        for (key, updated) in matched {
            if collection_map.get(&key) != Some(&updated) {
                result.modified_count += 1;
                collection_map.insert(key, updated);
            }
        }

        debug!(
            collection,
            matched = result.matched_count,
            modified = result.modified_count,
            "updated records"
        );

        Ok(result)
    }

    async fn delete(
        &self,
        filter: Filter,
        collection: &str,
        limit: usize,
    ) -> DocumentStoreResult<DeleteResult> {
        let mut store = self.store.write().await;
        let collection_map = match store.get_mut(collection) {
            Some(col) => col,
            None => return Ok(DeleteResult::default()),
        };

        let keys = RecordEvaluator::filter_records(collection_map.values(), &filter)
            .into_iter()
            .take(limit)
            .map(|record| record_id(record).map(str::to_string))
            .collect::<DocumentStoreResult<Vec<_>>>()?;

        for key in &keys {
            collection_map.remove(key);
        }

        debug!(collection, deleted = keys.len(), "deleted records");

        Ok(DeleteResult {
            deleted_count: keys.len() as u64,
        })
    }
}

fn record_id(record: &Document) -> DocumentStoreResult<&str> {
    record
        .get_str(ID_FIELD)
        .map_err(|_| DocumentStoreError::Backend(format!("record has no string `{ID_FIELD}` field")))
}

/// Returns a copy of `record` with every payload field set, creating nested documents for
/// dotted paths. The primary key may be set to its current value but never changed.
fn apply_set(record: &Document, payload: &Document) -> DocumentStoreResult<Document> {
    let mut updated = record.clone();

    for (path, value) in payload {
        if path == ID_FIELD && record.get(ID_FIELD) != Some(value) {
            return Err(DocumentStoreError::Backend(format!(
                "performing an update on `{ID_FIELD}` would modify an immutable field"
            )));
        }

        assign(&mut updated, path, value.clone())?;
    }

    Ok(updated)
}

fn assign(target: &mut Document, path: &str, value: Bson) -> DocumentStoreResult<()> {
    match path.split_once('.') {
        None => {
            target.insert(path, value);

            Ok(())
        }
        Some((head, rest)) => {
            let inner = target
                .entry(head.to_string())
                .or_insert_with(|| Bson::Document(Document::new()));

            match inner {
                Bson::Document(inner) => assign(inner, rest, value),
                _ => Err(DocumentStoreError::Backend(format!(
                    "cannot create field `{rest}` inside non-document field `{head}`"
                ))),
            }
        }
    }
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn insert_one(&self, record: Document, collection: &str) -> DocumentStoreResult<Document> {
        let key = record_id(&record)?.to_string();
        let mut store = self.store.write().await;
        let collection_map = store
            .entry(collection.to_string())
            .or_default();

        if collection_map.contains_key(&key) {
            return Err(DocumentStoreError::DocumentAlreadyExists(key, collection.to_string()));
        }

        debug!(collection, id = %key, "inserted record");
        collection_map.insert(key, record.clone());

        Ok(record)
    }

    async fn insert_many(
        &self,
        records: Vec<Document>,
        collection: &str,
    ) -> DocumentStoreResult<InsertManyResult> {
        let keys = records
            .iter()
            .map(|record| record_id(record).map(str::to_string))
            .collect::<DocumentStoreResult<Vec<_>>>()?;

        let mut store = self.store.write().await;
        let collection_map = store
            .entry(collection.to_string())
            .or_default();

        // Reject the whole batch if any key is taken, either already or earlier in the batch.
        for (index, key) in keys.iter().enumerate() {
            if collection_map.contains_key(key) || keys[..index].contains(key) {
                return Err(DocumentStoreError::DocumentAlreadyExists(key.clone(), collection.to_string()));
            }
        }

        for (key, record) in keys.iter().cloned().zip(records) {
            collection_map.insert(key, record);
        }

        debug!(collection, count = keys.len(), "inserted records");

        Ok(InsertManyResult {
            count: keys.len() as u64,
            inserted_ids: keys,
        })
    }

    async fn find(&self, query: Query, collection: &str) -> DocumentStoreResult<Vec<Document>> {
        let store = self.store.read().await;
        let collection_map = match store.get(collection) {
            Some(col) => col,
            None => return Ok(vec![]),
        };

        Ok(
            RecordEvaluator::filter_records(collection_map.values(), &query.filter)
                .into_iter()
                .take(query.limit.unwrap_or(usize::MAX))
                .map(|record| match &query.projection {
                    Some(projection) => projection.apply(record),
                    None => record.clone(),
                })
                .collect()
        )
    }

    async fn update_one(
        &self,
        filter: Filter,
        payload: Document,
        collection: &str,
    ) -> DocumentStoreResult<UpdateResult> {
        self.update(filter, payload, collection, 1).await
    }

    async fn update_many(
        &self,
        filter: Filter,
        payload: Document,
        collection: &str,
    ) -> DocumentStoreResult<UpdateResult> {
        self.update(filter, payload, collection, usize::MAX).await
    }

    async fn delete_one(&self, filter: Filter, collection: &str) -> DocumentStoreResult<DeleteResult> {
        self.delete(filter, collection, 1).await
    }

    async fn delete_many(&self, filter: Filter, collection: &str) -> DocumentStoreResult<DeleteResult> {
        self.delete(filter, collection, usize::MAX).await
    }

    async fn create_collection(&self, name: &str) -> DocumentStoreResult<()> {
        self.store
            .write()
            .await
            .entry(name.to_string())
            .or_default();

        Ok(())
    }

    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        self.store.write().await.remove(name);

        Ok(())
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        Ok(
            self.store
                .read()
                .await
                .keys()
                .cloned()
                .collect()
        )
    }
}

/// Builder for constructing [`InMemoryStore`] instances.
///
/// # Example
///
/// ```ignore
/// use userlayer_memory::InMemoryStore;
/// use userlayer::backend::StoreBackendBuilder;
///
/// let store = InMemoryStore::builder()
///     .with_collection("users")
///     .build()
///     .await?;
/// ```
#[derive(Default, Debug)]
pub struct InMemoryStoreBuilder {
    collections: Vec<String>,
}

impl InMemoryStoreBuilder {
    /// Creates the named collection up front, so it shows up in `list_collections`.
    pub fn with_collection(mut self, name: impl Into<String>) -> Self {
        self.collections.push(name.into());
        self
    }
}

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        let store = InMemoryStore::new();

        for name in &self.collections {
            store.create_collection(name).await?;
        }

        Ok(store)
    }
}
