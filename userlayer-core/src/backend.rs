//! Storage backend capability consumed by the record access facade.
//!
//! This module defines the narrow, collection-oriented interface a document store driver must
//! offer. The facade never talks to a driver directly; it receives a backend as an explicit
//! dependency and only ever calls the primitives below.
//!
//! # Overview
//!
//! The [`StoreBackend`] trait provides async insert, find, update and delete primitives, each
//! taking an already-normalized descriptor. Implementations must be thread-safe
//! (`Send + Sync`) and own every consistency guarantee: uniqueness of primary keys, atomicity
//! of a single update, isolation between concurrent writers.
//!
//! # Traits
//!
//! - [`StoreBackend`]: The core trait for storage backends
//! - [`DynStoreBackend`]: A trait for dynamic dispatch over backend implementations
//! - [`StoreBackendBuilder`]: Factory trait for creating backend instances
//!
//! # Examples
//!
//! ```ignore
//! use userlayer::{backend::StoreBackend, query::Filter};
//! use bson::doc;
//!
//! let backend = MyBackendImpl::new();
//!
//! backend.insert_one(doc! { "id": "a@b.com", "authStrategy": "local" }, "users").await?;
//! let result = backend.delete_many(Filter::all(), "users").await?;
//! assert_eq!(result.deleted_count, 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use async_trait::async_trait;
use bson::{Bson, Document};
use serde::{Deserialize, Serialize};
use std::{any::Any, fmt::Debug};

use crate::{
    error::DocumentStoreResult,
    query::{Filter, Query},
};

/// Outcome of a bulk insert.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InsertManyResult {
    /// Primary keys of the inserted records, in input order.
    pub inserted_ids: Vec<String>,
    pub count: u64,
}

/// Outcome of an update.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    /// Number of records the filter selected (at most one for single updates).
    pub matched_count: u64,
    /// Number of selected records whose values actually changed.
    pub modified_count: u64,
    /// Always `None`; the facade never upserts.
    pub upserted_id: Option<Bson>,
    pub upserted_count: u64,
}

/// Outcome of a delete.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub deleted_count: u64,
}

/// Abstract interface for document storage backends.
///
/// Records cross this boundary as BSON documents whose primary key lives under
/// [`ID_FIELD`](crate::record::ID_FIELD). Backends that store the key elsewhere (for example
/// `_id`) translate on the way in and out.
///
/// # Error Handling
///
/// Failures are reported as [`DocumentStoreError`](crate::error::DocumentStoreError) values.
/// The facade forwards them to callers unchanged, so implementations decide what a caller sees.
/// A duplicate primary key must be reported as
/// [`DocumentStoreError::DocumentAlreadyExists`](crate::error::DocumentStoreError::DocumentAlreadyExists).
///
/// # Missing collections
///
/// Reads, updates and deletes against a collection that does not exist yet behave as if it
/// were empty.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Inserts a single record and returns it as stored.
    ///
    /// # Errors
    ///
    /// Fails if a record with the same primary key already exists.
    async fn insert_one(&self, record: Document, collection: &str) -> DocumentStoreResult<Document>;

    /// Inserts several records.
    ///
    /// # Errors
    ///
    /// Fails if any primary key is already taken or repeated within the batch.
    async fn insert_many(
        &self,
        records: Vec<Document>,
        collection: &str,
    ) -> DocumentStoreResult<InsertManyResult>;

    /// Returns records matching the query.
    ///
    /// No ordering is guaranteed. With `limit` set, which of several matches is returned is
    /// up to the backend.
    async fn find(&self, query: Query, collection: &str) -> DocumentStoreResult<Vec<Document>>;

    /// Sets the payload fields on at most one matching record.
    async fn update_one(
        &self,
        filter: Filter,
        payload: Document,
        collection: &str,
    ) -> DocumentStoreResult<UpdateResult>;

    /// Sets the payload fields on every matching record.
    async fn update_many(
        &self,
        filter: Filter,
        payload: Document,
        collection: &str,
    ) -> DocumentStoreResult<UpdateResult>;

    /// Removes at most one matching record.
    async fn delete_one(&self, filter: Filter, collection: &str) -> DocumentStoreResult<DeleteResult>;

    /// Removes every matching record.
    async fn delete_many(&self, filter: Filter, collection: &str) -> DocumentStoreResult<DeleteResult>;

    /// Creates an empty collection. Creating an existing collection is not an error.
    async fn create_collection(&self, name: &str) -> DocumentStoreResult<()>;

    /// Drops a collection and every record it holds.
    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()>;

    /// Lists the names of all collections in the store.
    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>>;

    /// Cleanly shuts down the backend, releasing connections.
    ///
    /// The default implementation is a no-op.
    async fn shutdown(self) -> DocumentStoreResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
impl<B> StoreBackend for &B
where
    B: StoreBackend,
{
    async fn insert_one(&self, record: Document, collection: &str) -> DocumentStoreResult<Document> {
        StoreBackend::insert_one(*self, record, collection).await
    }

    async fn insert_many(
        &self,
        records: Vec<Document>,
        collection: &str,
    ) -> DocumentStoreResult<InsertManyResult> {
        StoreBackend::insert_many(*self, records, collection).await
    }

    async fn find(&self, query: Query, collection: &str) -> DocumentStoreResult<Vec<Document>> {
        StoreBackend::find(*self, query, collection).await
    }

    async fn update_one(
        &self,
        filter: Filter,
        payload: Document,
        collection: &str,
    ) -> DocumentStoreResult<UpdateResult> {
        StoreBackend::update_one(*self, filter, payload, collection).await
    }

    async fn update_many(
        &self,
        filter: Filter,
        payload: Document,
        collection: &str,
    ) -> DocumentStoreResult<UpdateResult> {
        StoreBackend::update_many(*self, filter, payload, collection).await
    }

    async fn delete_one(&self, filter: Filter, collection: &str) -> DocumentStoreResult<DeleteResult> {
        StoreBackend::delete_one(*self, filter, collection).await
    }

    async fn delete_many(&self, filter: Filter, collection: &str) -> DocumentStoreResult<DeleteResult> {
        StoreBackend::delete_many(*self, filter, collection).await
    }

    async fn create_collection(&self, name: &str) -> DocumentStoreResult<()> {
        StoreBackend::create_collection(*self, name).await
    }

    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        StoreBackend::drop_collection(*self, name).await
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        StoreBackend::list_collections(*self).await
    }
}

/// Object-safe mirror of [`StoreBackend`] for runtime backend selection.
#[async_trait]
pub trait DynStoreBackend: Send + Sync + Debug {
    async fn insert_one(&self, record: Document, collection: &str) -> DocumentStoreResult<Document>;
    async fn insert_many(
        &self,
        records: Vec<Document>,
        collection: &str,
    ) -> DocumentStoreResult<InsertManyResult>;
    async fn find(&self, query: Query, collection: &str) -> DocumentStoreResult<Vec<Document>>;
    async fn update_one(
        &self,
        filter: Filter,
        payload: Document,
        collection: &str,
    ) -> DocumentStoreResult<UpdateResult>;
    async fn update_many(
        &self,
        filter: Filter,
        payload: Document,
        collection: &str,
    ) -> DocumentStoreResult<UpdateResult>;
    async fn delete_one(&self, filter: Filter, collection: &str) -> DocumentStoreResult<DeleteResult>;
    async fn delete_many(&self, filter: Filter, collection: &str) -> DocumentStoreResult<DeleteResult>;
    async fn create_collection(&self, name: &str) -> DocumentStoreResult<()>;
    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()>;
    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>>;
    async fn shutdown_boxed(self: Box<Self>) -> DocumentStoreResult<()>;

    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

#[async_trait]
impl<B: StoreBackend + Send + Sync + 'static> DynStoreBackend for B {
    async fn insert_one(&self, record: Document, collection: &str) -> DocumentStoreResult<Document> {
        StoreBackend::insert_one(self, record, collection).await
    }

    async fn insert_many(
        &self,
        records: Vec<Document>,
        collection: &str,
    ) -> DocumentStoreResult<InsertManyResult> {
        StoreBackend::insert_many(self, records, collection).await
    }

    async fn find(&self, query: Query, collection: &str) -> DocumentStoreResult<Vec<Document>> {
        StoreBackend::find(self, query, collection).await
    }

    async fn update_one(
        &self,
        filter: Filter,
        payload: Document,
        collection: &str,
    ) -> DocumentStoreResult<UpdateResult> {
        StoreBackend::update_one(self, filter, payload, collection).await
    }

    async fn update_many(
        &self,
        filter: Filter,
        payload: Document,
        collection: &str,
    ) -> DocumentStoreResult<UpdateResult> {
        StoreBackend::update_many(self, filter, payload, collection).await
    }

    async fn delete_one(&self, filter: Filter, collection: &str) -> DocumentStoreResult<DeleteResult> {
        StoreBackend::delete_one(self, filter, collection).await
    }

    async fn delete_many(&self, filter: Filter, collection: &str) -> DocumentStoreResult<DeleteResult> {
        StoreBackend::delete_many(self, filter, collection).await
    }

    async fn create_collection(&self, name: &str) -> DocumentStoreResult<()> {
        StoreBackend::create_collection(self, name).await
    }

    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        StoreBackend::drop_collection(self, name).await
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        StoreBackend::list_collections(self).await
    }

    async fn shutdown_boxed(self: Box<Self>) -> DocumentStoreResult<()> {
        StoreBackend::shutdown(*self).await
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// `Box<dyn DynStoreBackend>` is itself a backend, so the facade only needs one code path.
#[async_trait]
impl StoreBackend for Box<dyn DynStoreBackend> {
    async fn insert_one(&self, record: Document, collection: &str) -> DocumentStoreResult<Document> {
        DynStoreBackend::insert_one(&**self, record, collection).await
    }

    async fn insert_many(
        &self,
        records: Vec<Document>,
        collection: &str,
    ) -> DocumentStoreResult<InsertManyResult> {
        DynStoreBackend::insert_many(&**self, records, collection).await
    }

    async fn find(&self, query: Query, collection: &str) -> DocumentStoreResult<Vec<Document>> {
        DynStoreBackend::find(&**self, query, collection).await
    }

    async fn update_one(
        &self,
        filter: Filter,
        payload: Document,
        collection: &str,
    ) -> DocumentStoreResult<UpdateResult> {
        DynStoreBackend::update_one(&**self, filter, payload, collection).await
    }

    async fn update_many(
        &self,
        filter: Filter,
        payload: Document,
        collection: &str,
    ) -> DocumentStoreResult<UpdateResult> {
        DynStoreBackend::update_many(&**self, filter, payload, collection).await
    }

    async fn delete_one(&self, filter: Filter, collection: &str) -> DocumentStoreResult<DeleteResult> {
        DynStoreBackend::delete_one(&**self, filter, collection).await
    }

    async fn delete_many(&self, filter: Filter, collection: &str) -> DocumentStoreResult<DeleteResult> {
        DynStoreBackend::delete_many(&**self, filter, collection).await
    }

    async fn create_collection(&self, name: &str) -> DocumentStoreResult<()> {
        DynStoreBackend::create_collection(&**self, name).await
    }

    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        DynStoreBackend::drop_collection(&**self, name).await
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        DynStoreBackend::list_collections(&**self).await
    }

    async fn shutdown(self) -> DocumentStoreResult<()> {
        DynStoreBackend::shutdown_boxed(self).await
    }
}

#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> DocumentStoreResult<Self::Backend>;
}
