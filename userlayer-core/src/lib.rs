//! A caller-friendly record access layer over a document store.
//!
//! This crate is the core of the userlayer project and provides:
//!
//! - **Record traits** ([`record`]) - Core traits for defining and serializing records
//! - **The user record** ([`user`]) - The `users` collection entity and its factory
//! - **Store backend abstraction** ([`backend`]) - Traits for implementing storage backends
//! - **Query descriptors** ([`query`]) - Filters, projections and read queries
//! - **Argument normalization** ([`normalize`]) - Accepted call shapes and their canonical form
//! - **Dual completion** ([`completion`]) - Results that can be awaited or handed to a handler
//! - **Collections interface** ([`collection`]) - The access facade over one collection
//! - **Document store** ([`store`]) - Binds facades to a backend
//! - **Error handling** ([`error`]) - Error and result types
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
//! let user = users.insert_one(doc! { "email": "ada@example.com", "name": "Ada" }).await?;
//! assert_eq!(user.auth_strategy, "local");
//!
//! let found = users.find_one("ada@example.com").await?;
//! assert!(found.is_some());
//! ```

#[allow(unused_extern_crates)]
extern crate self as userlayer_core;

pub mod backend;
pub mod collection;
pub mod completion;
pub mod error;
pub mod normalize;
pub mod query;
pub mod record;
pub mod store;
pub mod user;
