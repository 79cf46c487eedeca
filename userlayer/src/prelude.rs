//! Convenient re-exports of commonly used types from userlayer.
//!
//! ```ignore
//! use userlayer::prelude::*;
//! ```

pub use userlayer_core::{
    backend::{DeleteResult, InsertManyResult, StoreBackend, StoreBackendBuilder, UpdateResult},
    collection::{Inserted, RecordCollection},
    completion::Deferred,
    error::{DocumentStoreError, DocumentStoreResult},
    query::{Filter, Projection, Query, QueryBuilder},
    record::{Record, RecordExt},
    store::{DocumentStore, DynDocumentStore},
    user::User,
};
