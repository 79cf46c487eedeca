//! The record access facade.
//!
//! [`RecordCollection`] exposes insert, find, update and delete operations over one collection
//! of a single record type. Each operation:
//!
//! 1. normalizes its loosely shaped arguments (see [`normalize`](crate::normalize)),
//! 2. builds records through the record factory where it inserts,
//! 3. dispatches the canonical descriptor to the storage backend,
//! 4. returns a [`Deferred`] that can be awaited or completed with a handler.
//!
//! A normalization failure settles the deferred value with the error and the backend is never
//! called. Backend errors are passed through as they are.
//!
//! # Example
//!
//! ```ignore
//! use userlayer::{prelude::*, memory::InMemoryStore};
//! use bson::doc;
//!
//! let store = DocumentStore::new(InMemoryStore::new());
//! let users = store.users();
//!
//! users.insert(doc! { "email": "x@y.com" }).await?;
//! let found = users.find_one("x@y.com").await?;
//! users
//!     .update_one((doc! { "authStrategy": "local" }, doc! { "authStrategy": "admin" }))
//!     .complete(|result| println!("{result:?}"))
//!     .await;
//! ```

use bson::{Bson, Document};
use std::marker::PhantomData;
use tracing::{debug, warn};

use crate::{
    backend::{DeleteResult, InsertManyResult, StoreBackend, UpdateResult},
    completion::Deferred,
    error::{DocumentStoreError, DocumentStoreResult},
    normalize::{DeleteArgs, FindArgs, InsertArgs, IntoArgs, UpdateArgs},
    record::{Record, RecordExt},
};

/// Result of [`RecordCollection::insert`], which accepts one record or many.
#[derive(Debug, Clone, PartialEq)]
pub enum Inserted<R> {
    One(R),
    Many(InsertManyResult),
}

/// Record access facade over one collection, bound to a storage backend.
///
/// The facade holds no state between calls; the backend is the only source of truth.
/// Concurrent calls are not ordered relative to each other.
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the backend reference
/// * `B` - The storage backend type
/// * `R` - The record type stored in this collection
#[derive(Debug)]
pub struct RecordCollection<'a, B: StoreBackend, R: Record> {
    name: String,
    backend: &'a B,
    _marker: PhantomData<R>,
}

impl<'a, B: StoreBackend, R: Record> RecordCollection<'a, B, R> {
    pub(crate) fn new(name: String, backend: &'a B) -> Self {
        Self {
            name,
            backend,
            _marker: PhantomData,
        }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inserts one record (a mapping) or several (a sequence of mappings).
    ///
    /// Missing, null, empty or non-mapping data fails with
    /// [`DocumentStoreError::InvalidInsertData`] before the backend is touched.
    pub fn insert(&self, data: impl Into<Bson>) -> Deferred<'a, Inserted<R>> {
        match InsertArgs::classify(data.into()) {
            Ok(InsertArgs::One(data)) => self.dispatch_insert_one(data).map_ok(Inserted::One),
            Ok(InsertArgs::Many(data)) => self.dispatch_insert_many(data).map_ok(Inserted::Many),
            Err(err) => self.reject("insert", err),
        }
    }

    /// Inserts exactly one record and resolves with the record as stored.
    pub fn insert_one(&self, data: impl Into<Bson>) -> Deferred<'a, R> {
        match InsertArgs::classify_one(data.into()) {
            Ok(data) => self.dispatch_insert_one(data),
            Err(err) => self.reject("insert_one", err),
        }
    }

    /// Inserts a non-empty sequence of records.
    pub fn insert_many(&self, data: impl Into<Bson>) -> Deferred<'a, InsertManyResult> {
        match InsertArgs::classify_many(data.into()) {
            Ok(data) => self.dispatch_insert_many(data),
            Err(err) => self.reject("insert_many", err),
        }
    }

    /// Finds one matching record, or `None`.
    ///
    /// When several records match, which one is returned is up to the backend.
    pub fn find_one(&self, args: impl IntoArgs<FindArgs>) -> Deferred<'a, Option<Document>> {
        let descriptor = match args.into_args() {
            Ok(args) => args.normalize(),
            Err(err) => return self.reject("find_one", err),
        };
        let (backend, name) = (self.backend, self.name.clone());

        Deferred::new(async move {
            debug!(collection = %name, operation = "find_one", "dispatching");

            Ok(backend
                .find(descriptor.into_query(Some(1)), &name)
                .await?
                .into_iter()
                .next())
        })
    }

    /// Finds every matching record.
    pub fn find(&self, args: impl IntoArgs<FindArgs>) -> Deferred<'a, Vec<Document>> {
        let descriptor = match args.into_args() {
            Ok(args) => args.normalize(),
            Err(err) => return self.reject("find", err),
        };
        let (backend, name) = (self.backend, self.name.clone());

        Deferred::new(async move {
            debug!(collection = %name, operation = "find", "dispatching");

            backend.find(descriptor.into_query(None), &name).await
        })
    }

    /// Sets the payload on at most one matching record.
    pub fn update_one(&self, args: impl IntoArgs<UpdateArgs>) -> Deferred<'a, UpdateResult> {
        let descriptor = match args.into_args() {
            Ok(args) => args.normalize(),
            Err(err) => return self.reject("update_one", err),
        };
        let (backend, name) = (self.backend, self.name.clone());

        Deferred::new(async move {
            debug!(collection = %name, operation = "update_one", "dispatching");

            backend
                .update_one(
                    descriptor.filter,
                    descriptor.payload.unwrap_or_default(),
                    &name,
                )
                .await
        })
    }

    /// Sets the payload on every matching record.
    pub fn update(&self, args: impl IntoArgs<UpdateArgs>) -> Deferred<'a, UpdateResult> {
        let descriptor = match args.into_args() {
            Ok(args) => args.normalize(),
            Err(err) => return self.reject("update", err),
        };
        let (backend, name) = (self.backend, self.name.clone());

        Deferred::new(async move {
            debug!(collection = %name, operation = "update", "dispatching");

            backend
                .update_many(
                    descriptor.filter,
                    descriptor.payload.unwrap_or_default(),
                    &name,
                )
                .await
        })
    }

    /// Removes at most one matching record.
    pub fn delete_one(&self, args: impl IntoArgs<DeleteArgs>) -> Deferred<'a, DeleteResult> {
        let descriptor = match args.into_args() {
            Ok(args) => args.normalize(),
            Err(err) => return self.reject("delete_one", err),
        };
        let (backend, name) = (self.backend, self.name.clone());

        Deferred::new(async move {
            debug!(collection = %name, operation = "delete_one", "dispatching");

            backend.delete_one(descriptor.filter, &name).await
        })
    }

    /// Removes every matching record.
    pub fn delete(&self, args: impl IntoArgs<DeleteArgs>) -> Deferred<'a, DeleteResult> {
        let descriptor = match args.into_args() {
            Ok(args) => args.normalize(),
            Err(err) => return self.reject("delete", err),
        };
        let (backend, name) = (self.backend, self.name.clone());

        Deferred::new(async move {
            debug!(collection = %name, operation = "delete", "dispatching");

            backend.delete_many(descriptor.filter, &name).await
        })
    }

    fn dispatch_insert_one(&self, data: Document) -> Deferred<'a, R> {
        let record = match R::from_input(&data) {
            Ok(record) => record,
            Err(err) => return self.reject("insert_one", err),
        };
        let (backend, name) = (self.backend, self.name.clone());

        Deferred::new(async move {
            debug!(collection = %name, operation = "insert_one", id = record.id(), "dispatching");

            let stored = backend.insert_one(record.to_document()?, &name).await?;

            R::from_document(stored)
        })
    }

    fn dispatch_insert_many(&self, data: Vec<Document>) -> Deferred<'a, InsertManyResult> {
        let records = match data
            .iter()
            .map(R::from_input)
            .collect::<DocumentStoreResult<Vec<R>>>()
        {
            Ok(records) => records,
            Err(err) => return self.reject("insert_many", err),
        };
        let (backend, name) = (self.backend, self.name.clone());

        Deferred::new(async move {
            debug!(collection = %name, operation = "insert_many", count = records.len(), "dispatching");

            let documents = records
                .iter()
                .map(RecordExt::to_document)
                .collect::<DocumentStoreResult<Vec<_>>>()?;

            backend.insert_many(documents, &name).await
        })
    }

    fn reject<T: Send + 'a>(&self, operation: &'static str, err: DocumentStoreError) -> Deferred<'a, T> {
        warn!(collection = %self.name, operation, error = %err, "rejected before dispatch");

        Deferred::failed(err)
    }
}
