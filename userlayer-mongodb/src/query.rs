//! Translation from canonical descriptors to MongoDB query syntax.
//!
//! The facade addresses the primary key as `id`; MongoDB stores it as `_id`. Field paths
//! keep their dotted nested meaning. Filter values are always compared with `$eq`, so a
//! value shaped like an operator document is matched literally instead of evaluated.

use bson::{Bson, Document, doc};

use userlayer_core::{
    query::{Filter, Projection},
    record::ID_FIELD,
};

pub(crate) const MONGO_ID_FIELD: &str = "_id";

/// Translates canonical descriptors into MongoDB documents.
pub(crate) struct MongoQueryTranslator;

impl MongoQueryTranslator {
    pub fn filter(filter: &Filter) -> Document {
        filter
            .as_document()
            .iter()
            .map(|(key, value)| (Self::field_path(key), Bson::Document(doc! { "$eq": value.clone() })))
            .collect()
    }

    pub fn projection(projection: &Projection) -> Document {
        Self::rename_keys(projection.as_document())
    }

    /// Wraps a payload in `$set`, or returns `None` for an empty payload, which MongoDB
    /// would reject.
    pub fn update(payload: &Document) -> Option<Document> {
        (!payload.is_empty()).then(|| doc! { "$set": Self::rename_keys(payload) })
    }

    fn rename_keys(document: &Document) -> Document {
        document
            .iter()
            .map(|(key, value)| (Self::field_path(key), value.clone()))
            .collect()
    }

    fn field_path(path: &str) -> String {
        match path.split_once('.') {
            Some((ID_FIELD, rest)) => format!("{MONGO_ID_FIELD}.{rest}"),
            None if path == ID_FIELD => MONGO_ID_FIELD.to_string(),
            _ => path.to_string(),
        }
    }
}
