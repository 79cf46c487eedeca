//! Error types and result types for record access operations.
//!
//! Normalization failures ([`DocumentStoreError::InvalidInsertData`] and
//! [`DocumentStoreError::InvalidQuery`]) are raised before a storage backend is touched.
//! Every other variant originates in a backend and is passed to the caller untouched.
//! Use [`DocumentStoreResult<T>`] as the return type for fallible operations.

use bson::error::Error as BsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when accessing records.
///
/// The enum is `Clone + PartialEq` so that the callback and the awaited completion
/// styles can be shown to observe the very same error value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentStoreError {
    /// Insert was called with missing, empty, or malformed data.
    /// The argument describes which shape was rejected.
    #[error("Invalid user data: {0}")]
    InvalidInsertData(String),
    /// A find, update or delete argument could not be classified as a filter,
    /// projection or payload.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    /// Serialization/deserialization error when converting records to and from BSON.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error during backend initialization or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// A record with the given primary key already exists.
    /// The first argument is the record id, the second is the collection name.
    #[error("Duplicate key {0} in collection {1}")]
    DocumentAlreadyExists(String, String),
    /// An error occurred in the underlying storage backend.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl DocumentStoreError {
    /// Returns `true` when the error was produced by argument normalization,
    /// meaning no backend call was made.
    pub fn is_normalization(&self) -> bool {
        matches!(
            self,
            DocumentStoreError::InvalidInsertData(_) | DocumentStoreError::InvalidQuery(_)
        )
    }
}

/// A specialized `Result` type for record access operations.
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

impl From<BsonError> for DocumentStoreError {
    fn from(err: BsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}
