//! Canonical query descriptors handed to storage backends.
//!
//! Every facade call is normalized into one of these before dispatch:
//!
//! - [`Filter`] - field name to match value, all pairs must be equal; empty matches everything
//! - [`Projection`] - which fields appear in each returned record
//! - [`Query`] - a filter plus optional projection and match limit, used by reads
//!
//! # Example
//!
//! ```ignore
//! use userlayer::query::{Filter, Query};
//! use bson::doc;
//!
//! let query = Query::builder()
//!     .filter(Filter::by_id("a@b.com"))
//!     .projection(doc! { "name": 1 })
//!     .limit(1)
//!     .build();
//! ```

use bson::{Bson, Document};

use crate::record::ID_FIELD;

/// An equality filter: every listed field must equal its value.
///
/// An empty filter matches every record. Missing filters and explicitly empty ones both
/// normalize to this same value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter(Document);

impl Filter {
    /// A filter matching every record.
    pub fn all() -> Self {
        Filter(Document::new())
    }

    /// A primary-key equality filter.
    pub fn by_id(id: impl Into<String>) -> Self {
        let mut fields = Document::new();
        fields.insert(ID_FIELD, Bson::String(id.into()));
        Filter(fields)
    }

    /// Adds an equality constraint on `field`.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Returns `true` when this filter matches every record.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_document(&self) -> &Document {
        &self.0
    }

    pub fn into_document(self) -> Document {
        self.0
    }
}

impl From<Document> for Filter {
    fn from(fields: Document) -> Self {
        Filter(fields)
    }
}

/// Field projection applied to read results.
///
/// Follows document-store conventions: truthy values include a field, falsy values exclude
/// it, and the primary key is kept unless it is excluded explicitly. An empty projection
/// is treated as no projection at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection(Document);

impl Projection {
    pub fn new(fields: Document) -> Self {
        Projection(fields)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_document(&self) -> &Document {
        &self.0
    }

    /// Returns `true` if any listed field is included rather than excluded.
    pub fn is_inclusive(&self) -> bool {
        self.0
            .iter()
            .any(|(field, value)| field != ID_FIELD && is_truthy(value))
    }

    /// Applies this projection to a stored record.
    ///
    /// Dotted paths such as `settings.theme` select or remove fields of nested documents,
    /// including documents held in arrays.
    pub fn apply(&self, record: &Document) -> Document {
        if self.is_empty() {
            return record.clone();
        }

        self.project(record, self.is_inclusive(), true)
    }

    fn project(&self, record: &Document, inclusive: bool, root: bool) -> Document {
        let mut projected = Document::new();

        for (field, value) in record {
            let kept = match self.0.get(field.as_str()) {
                Some(flag) => is_truthy(flag).then(|| value.clone()),
                None if root && field == ID_FIELD => Some(value.clone()),
                None => match self.nested(field) {
                    Some(nested) => nested.project_value(value, inclusive),
                    None => (!inclusive).then(|| value.clone()),
                },
            };

            if let Some(value) = kept {
                projected.insert(field.clone(), value);
            }
        }

        projected
    }

    fn project_value(&self, value: &Bson, inclusive: bool) -> Option<Bson> {
        match value {
            Bson::Document(inner) => Some(Bson::Document(self.project(inner, inclusive, false))),
            Bson::Array(items) => Some(Bson::Array(
                items
                    .iter()
                    .filter_map(|item| self.project_value(item, inclusive))
                    .collect(),
            )),
            _ => (!inclusive).then(|| value.clone()),
        }
    }

    /// The projection below `field`, with that prefix stripped from each path.
    fn nested(&self, field: &str) -> Option<Projection> {
        let prefix = format!("{field}.");
        let fields: Document = self
            .0
            .iter()
            .filter_map(|(path, flag)| {
                path.strip_prefix(&prefix)
                    .map(|rest| (rest.to_string(), flag.clone()))
            })
            .collect();

        (!fields.is_empty()).then_some(Projection(fields))
    }
}

impl From<Document> for Projection {
    fn from(fields: Document) -> Self {
        Projection(fields)
    }
}

fn is_truthy(value: &Bson) -> bool {
    match value {
        Bson::Boolean(flag) => *flag,
        Bson::Int32(n) => *n != 0,
        Bson::Int64(n) => *n != 0,
        Bson::Double(n) => *n != 0.0,
        Bson::Null | Bson::Undefined => false,
        _ => true,
    }
}

/// A read request: which records, which fields, and how many.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Equality filter to match records.
    pub filter: Filter,
    /// Optional field projection for each returned record.
    pub projection: Option<Projection>,
    /// Maximum number of records to return.
    pub limit: Option<usize>,
}

impl Query {
    /// Creates a query matching every record, with full records and no limit.
    pub fn new() -> Self {
        Query::default()
    }

    /// Creates a new query builder for fluent construction.
    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    /// Creates a new query builder.
    pub fn new() -> Self {
        QueryBuilder { query: Query::default() }
    }

    /// Sets the filter for this query.
    pub fn filter(mut self, filter: impl Into<Filter>) -> Self {
        self.query.filter = filter.into();
        self
    }

    /// Sets the projection. Empty projections are dropped.
    pub fn projection(mut self, projection: impl Into<Projection>) -> Self {
        let projection = projection.into();
        self.query.projection = (!projection.is_empty()).then_some(projection);
        self
    }

    /// Sets the maximum number of records to return.
    pub fn limit(mut self, limit: usize) -> Self {
        self.query.limit = Some(limit);
        self
    }

    /// Builds and returns the final query.
    pub fn build(self) -> Query {
        self.query
    }
}
