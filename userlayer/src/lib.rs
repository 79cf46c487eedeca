//! A caller-friendly record access layer over a `users` document collection.
//!
//! This crate is the entry point of the userlayer project. It re-exports the core types and
//! provides access to the storage backends.
//!
//! Every operation accepts its arguments in several shapes (nothing, a bare primary key, a
//! filter mapping, a filter with a projection or payload), normalizes them to one canonical
//! form, and hands that to the backend. Results can be awaited or passed to a handler.
//!
//! # Quick Start
//!
//! ```ignore
//! use userlayer::{prelude::*, memory::InMemoryStore};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> DocumentStoreResult<()> {
//!     let store = DocumentStore::new(InMemoryStore::builder().build().await?);
//!     let users = store.users();
//!
//!     // The email becomes the primary key; authStrategy defaults to "local".
//!     users.insert(doc! { "email": "ada@example.com", "name": "Ada" }).await?;
//!
//!     // A bare string is shorthand for `{ "id": ... }`.
//!     let ada = users.find_one("ada@example.com").await?;
//!
//!     // Filter plus payload.
//!     users.update_one(("ada@example.com", doc! { "name": "Ada L." })).await?;
//!
//!     // Handler style instead of await.
//!     users
//!         .delete(())
//!         .complete(|result| println!("deleted: {result:?}"))
//!         .await;
//!
//!     store.shutdown().await
//! }
//! ```
//!
//! # Loosely typed arguments
//!
//! Callers holding positional arguments as BSON values (for example from a JSON route) can
//! pass them as a `Vec<Bson>`; `Bson::Null` stands for an absent argument. Filters only
//! ever test field equality: keys starting with `$` are rejected as
//! [`InvalidQuery`](error::DocumentStoreError::InvalidQuery), and operator-shaped values are
//! compared literally.
//!
//! ```ignore
//! use bson::{Bson, doc};
//!
//! users.find(vec![Bson::Null, Bson::Document(doc! { "name": 1 })]).await?;
//! ```
//!
//! # Dynamic Dispatch
//!
//! A `DocumentStore` can be converted into a [`DynDocumentStore`](store::DynDocumentStore)
//! with `into_dyn` when the backend is chosen at runtime.
//!
//! # Backends
//!
//! - [`memory`] - In-memory storage for development and testing
//! - `mongodb` - MongoDB backend (requires the `mongodb` feature)

pub mod prelude;

pub use userlayer_core::{backend, collection, completion, error, normalize, query, record, store, user};

pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use userlayer_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use userlayer_mongodb::{MongoDbStore, MongoDbStoreBuilder};
}
