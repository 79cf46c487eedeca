//! Core traits for record representation and serialization.
//!
//! This module provides the trait every persisted entity implements, together with
//! conversions between records and their stored BSON form.

use bson::{Document, de::deserialize_from_document, ser::serialize_to_document};
use serde::{Deserialize, Serialize};

use crate::error::DocumentStoreResult;

/// The field that holds a record's primary key.
pub const ID_FIELD: &str = "id";

/// Core trait that all records stored through the access facade must implement.
///
/// A record has a string primary key, belongs to a named collection, and knows how to
/// build itself from partial caller input. That last hook is the record factory: every
/// record admitted to storage is produced by [`Record::from_input`] exactly once.
///
/// # Example
///
/// ```ignore
/// use userlayer::record::Record;
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct Team {
///     pub id: String,
///     pub members: Vec<String>,
/// }
///
/// impl Record for Team {
///     fn id(&self) -> &str {
///         &self.id
///     }
///
///     fn collection_name() -> &'static str {
///         "teams"
///     }
///
///     fn from_input(data: &bson::Document) -> DocumentStoreResult<Self> {
///         /* ... */
///     }
/// }
/// ```
pub trait Record: Serialize + for<'de> Deserialize<'de> + Send + Sync + Clone + 'static {
    /// Returns this record's primary key.
    fn id(&self) -> &str;

    /// Returns the name of the collection this record belongs to.
    fn collection_name() -> &'static str;

    /// Builds a storage-ready record from partial input, filling every defaulted field.
    ///
    /// Implementations must be pure and must not mutate the input.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidInsertData`](crate::error::DocumentStoreError::InvalidInsertData)
    /// when the input lacks what is needed to derive a primary key.
    fn from_input(data: &Document) -> DocumentStoreResult<Self>;
}

/// Extension trait providing serialization utilities for records.
///
/// Implemented automatically for all types that implement [`Record`].
pub trait RecordExt: Record {
    /// Converts this record to a BSON document for storage.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn to_document(&self) -> DocumentStoreResult<Document>;

    /// Creates a record from a stored BSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails or required fields are missing.
    fn from_document(document: Document) -> DocumentStoreResult<Self>;
}

impl<R: Record> RecordExt for R {
    fn to_document(&self) -> DocumentStoreResult<Document> {
        Ok(serialize_to_document(self)?)
    }

    fn from_document(document: Document) -> DocumentStoreResult<Self> {
        Ok(deserialize_from_document(document)?)
    }
}
