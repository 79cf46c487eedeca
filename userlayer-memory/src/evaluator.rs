//! Filter evaluation for in-memory record matching.
//!
//! Filters are equality mappings. A record matches when every listed field matches its value,
//! following document-store conventions:
//!
//! - numbers compare by value regardless of their BSON width
//! - dotted keys (`settings.theme`) address nested fields
//! - an array field matches a scalar that equals any of its elements
//! - a `null` value matches a field that is missing or null

use std::collections::HashMap;
use bson::{Bson, Document, datetime::DateTime};

use userlayer_core::query::Filter;

/// Type-erased, comparable representation of BSON values.
///
/// Numeric types are normalized to f64 so that `1_i32` equals `1.0_f64`.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    DateTime(DateTime),
    String(&'a str),
    Array(Vec<Comparable<'a>>),
    Map(HashMap<&'a str, Comparable<'a>>),
    /// Any other BSON value, compared structurally.
    Other(&'a Bson),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null | Bson::Undefined => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>()
            ),
            other => Comparable::Other(other),
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            (Comparable::Other(a), Comparable::Other(b)) => a == b,
            _ => false,
        }
    }
}

/// Resolves a possibly dotted field path inside a record.
pub(crate) fn lookup<'a>(record: &'a Document, path: &str) -> Option<&'a Bson> {
    match path.split_once('.') {
        None => record.get(path),
        Some((head, rest)) => match record.get(head)? {
            Bson::Document(inner) => lookup(inner, rest),
            _ => None,
        },
    }
}

pub(crate) struct RecordEvaluator<'a> {
    record: &'a Document,
}

impl<'a> RecordEvaluator<'a> {
    pub fn new(record: &'a Document) -> Self {
        Self { record }
    }

    /// Returns `true` when every constraint in `filter` holds for this record.
    pub fn matches(&self, filter: &Filter) -> bool {
        filter
            .as_document()
            .iter()
            .all(|(field, expected)| self.field_matches(field, expected))
    }

    fn field_matches(&self, field: &str, expected: &Bson) -> bool {
        let expected = Comparable::from(expected);

        match lookup(self.record, field).map(Comparable::from) {
            None => expected == Comparable::Null,
            Some(Comparable::Array(items)) if !matches!(expected, Comparable::Array(_)) => {
                items.iter().any(|item| item == &expected)
            }
            Some(actual) => actual == expected,
        }
    }

    pub fn filter_records(
        records: impl IntoIterator<Item = &'a Document>,
        filter: &Filter,
    ) -> Vec<&'a Document> {
        records
            .into_iter()
            .filter(|record| RecordEvaluator::new(record).matches(filter))
            .collect::<Vec<_>>()
    }
}
