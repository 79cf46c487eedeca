//! Main store interface for binding record collections to a backend.
//!
//! This module provides two store types:
//!
//! - [`DocumentStore`] - Store bound to a concrete backend implementation
//! - [`DynDocumentStore`] - Dynamic dispatch store for runtime backend selection
//!
//! # Example
//!
//! ```ignore
//! use userlayer::store::DocumentStore;
//!
//! let store = DocumentStore::new(backend);
//! let users = store.users();
//! ```

use crate::{
    backend::{DynStoreBackend, StoreBackend},
    collection::RecordCollection,
    error::DocumentStoreResult,
    record::Record,
    user::User,
};

/// A record store bound to a specific backend implementation.
///
/// # Type Parameters
///
/// * `B` - The backend implementation type
///
/// # Example
///
/// ```ignore
/// let store = DocumentStore::new(my_backend);
/// let users = store.records::<User>();
/// ```
#[derive(Debug)]
pub struct DocumentStore<B: StoreBackend> {
    backend: B,
}

impl<B: StoreBackend> DocumentStore<B> {
    /// Creates a new store with the given backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Gets the access facade for the specified record type.
    ///
    /// The collection name is determined by the record type's `collection_name()` method.
    pub fn records<'a, R: Record>(&'a self) -> RecordCollection<'a, B, R> {
        RecordCollection::new(R::collection_name().to_string(), &self.backend)
    }

    /// Gets the access facade for the `users` collection.
    pub fn users(&self) -> RecordCollection<'_, B, User> {
        self.records::<User>()
    }

    /// Returns the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Creates a new collection with the given name.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to create it.
    pub async fn create_collection(&self, name: &str) -> DocumentStoreResult<()> {
        self.backend.create_collection(name).await
    }

    /// Drops a collection and all of its records.
    pub async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        self.backend.drop_collection(name).await
    }

    /// Lists all collections in the store.
    pub async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        self.backend.list_collections().await
    }

    /// Shuts down the store and releases backend resources.
    ///
    /// This consumes the store and should be called when no longer needed.
    pub async fn shutdown(self) -> DocumentStoreResult<()> {
        self.backend.shutdown().await?;

        Ok(())
    }
}

impl<B: StoreBackend + 'static> DocumentStore<B> {
    /// Erases the backend type, for runtime backend selection.
    pub fn into_dyn(self) -> DynDocumentStore {
        DynDocumentStore::new(Box::new(self.backend))
    }
}

#[derive(Debug)]
pub struct DynDocumentStore {
    backend: Box<dyn DynStoreBackend>,
}

impl DynDocumentStore {
    /// Creates a new dynamic store with the given backend trait object.
    pub fn new(backend: Box<dyn DynStoreBackend>) -> Self {
        Self { backend }
    }

    /// Gets the access facade for the specified record type.
    pub fn records<'a, R: Record>(&'a self) -> RecordCollection<'a, Box<dyn DynStoreBackend>, R> {
        RecordCollection::new(R::collection_name().to_string(), &self.backend)
    }

    /// Gets the access facade for the `users` collection.
    pub fn users(&self) -> RecordCollection<'_, Box<dyn DynStoreBackend>, User> {
        self.records::<User>()
    }

    /// Borrows the backend as its concrete type, if it is a `B`.
    pub fn as_static<B>(&self) -> Option<DocumentStore<&B>>
    where
        B: StoreBackend + 'static,
    {
        DynStoreBackend::as_any(&*self.backend)
            .downcast_ref::<B>()
            .map(DocumentStore::new)
    }

    /// Recovers the concrete store, if the backend is a `B`.
    pub fn into_static<B>(self) -> Option<DocumentStore<B>>
    where
        B: StoreBackend + 'static,
    {
        DynStoreBackend::into_any(self.backend)
            .downcast::<B>()
            .ok()
            .map(|b| DocumentStore::new(*b))
    }

    pub async fn create_collection(&self, name: &str) -> DocumentStoreResult<()> {
        DynStoreBackend::create_collection(&*self.backend, name).await
    }

    pub async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        DynStoreBackend::drop_collection(&*self.backend, name).await
    }

    pub async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        DynStoreBackend::list_collections(&*self.backend).await
    }

    /// Shuts down the store and releases backend resources.
    pub async fn shutdown(self) -> DocumentStoreResult<()> {
        DynStoreBackend::shutdown_boxed(self.backend).await
    }
}
