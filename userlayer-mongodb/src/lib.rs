//! MongoDB backend implementation for userlayer.
//!
//! This crate provides a MongoDB-based implementation of the `StoreBackend` trait. Records keep
//! their primary key in MongoDB's `_id`, so the server enforces uniqueness.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! userlayer = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Connection
//!
//! A connection string and database name can be passed to the builder directly, or read from
//! the environment with [`MongoDbStoreBuilder::from_env`]:
//!
//! - `MONGO_URI` - connection string (required)
//! - `MONGO_DATABASE` - database name (optional, defaults to the one in the connection string)
//!
//! Bulk inserts are ordered: on a duplicate key, records before it are kept.
//!
//! # Example
//!
//! ```ignore
//! use userlayer::{backend::StoreBackendBuilder, mongodb::MongoDbStoreBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MongoDbStoreBuilder::from_env()?
//!         .build()
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as userlayer_mongodb;

pub mod store;
pub mod query;
pub mod sanitizer;

pub use store::{MongoDbStore, MongoDbStoreBuilder};
