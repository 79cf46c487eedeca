//! Argument normalization for facade operations.
//!
//! Callers may address records in several shapes: nothing at all, a bare primary key,
//! a filter mapping, or a filter together with a projection or payload. Each operation
//! family has a closed set of accepted shapes, modelled as an enum here, which is then
//! collapsed into one canonical [`Descriptor`] before any backend is involved.
//!
//! Shapes can be supplied two ways:
//!
//! - statically, through `From` conversions (`()`, `&str`, `bson::Document`, tuples)
//! - dynamically, through `classify`, for callers holding loosely typed positional
//!   arguments (for example a JSON route layer). [`Bson::Null`] stands for an absent argument.
//!
//! A completion handler is never part of these shapes; it is attached afterwards through
//! [`Deferred::complete`](crate::completion::Deferred::complete). Supplying it "early" is the
//! same as leaving every later argument out.

use bson::{Bson, Document};

use crate::{
    error::{DocumentStoreError, DocumentStoreResult},
    query::{Filter, Projection, Query},
};

/// The canonical `(filter, payload, projection)` triple produced for one invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Descriptor {
    pub filter: Filter,
    pub payload: Option<Document>,
    pub projection: Option<Projection>,
}

impl Descriptor {
    /// Converts a read descriptor into a backend [`Query`].
    pub fn into_query(self, limit: Option<usize>) -> Query {
        Query {
            filter: self.filter,
            projection: self.projection,
            limit,
        }
    }
}

/// The argument in filter position.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// No filter given; matches every record.
    All,
    /// Primary-key shorthand, always an equality match on the id field.
    Id(String),
    /// An explicit filter mapping. An empty mapping matches every record.
    Fields(Document),
}

impl Selector {
    /// Classifies a loosely typed filter argument.
    ///
    /// Filters only express field equality, so a mapping whose keys look like query
    /// operators (a leading `$`) is rejected.
    pub fn classify(arg: Bson) -> DocumentStoreResult<Self> {
        match arg {
            Bson::Null | Bson::Undefined => Ok(Selector::All),
            Bson::String(id) => Ok(Selector::Id(id)),
            Bson::Document(fields) => {
                if let Some(key) = fields.keys().find(|key| key.starts_with('$')) {
                    return Err(DocumentStoreError::InvalidQuery(format!(
                        "operator `{key}` is not a field name"
                    )));
                }

                Ok(Selector::Fields(fields))
            }
            other => Err(DocumentStoreError::InvalidQuery(format!(
                "unsupported filter of type {:?}",
                other.element_type()
            ))),
        }
    }

    pub fn into_filter(self) -> Filter {
        match self {
            Selector::All => Filter::all(),
            Selector::Id(id) => Filter::by_id(id),
            Selector::Fields(fields) => Filter::from(fields),
        }
    }
}

impl From<()> for Selector {
    fn from(_: ()) -> Self {
        Selector::All
    }
}

impl From<&str> for Selector {
    fn from(id: &str) -> Self {
        Selector::Id(id.to_string())
    }
}

impl From<String> for Selector {
    fn from(id: String) -> Self {
        Selector::Id(id)
    }
}

impl From<&String> for Selector {
    fn from(id: &String) -> Self {
        Selector::Id(id.clone())
    }
}

impl From<Document> for Selector {
    fn from(fields: Document) -> Self {
        Selector::Fields(fields)
    }
}

impl From<Option<Document>> for Selector {
    fn from(fields: Option<Document>) -> Self {
        fields.map_or(Selector::All, Selector::Fields)
    }
}

// Every selector shape converts into an argument family wrapping it.
macro_rules! selector_conversions {
    ($family:ty, $wrap:expr) => {
        selector_conversions!(@impl $family, $wrap, (), &str, String, &String, Document, Option<Document>);
    };
    (@impl $family:ty, $wrap:expr, $($source:ty),+) => {
        $(
            impl From<$source> for $family {
                fn from(selector: $source) -> Self {
                    $wrap(Selector::from(selector))
                }
            }
        )+
    };
}

// A selector shape paired with a mapping (projection or payload).
macro_rules! paired_conversions {
    ($family:ty, $wrap:expr) => {
        paired_conversions!(@impl $family, $wrap, (), &str, String, &String, Document, Option<Document>);
    };
    (@impl $family:ty, $wrap:expr, $($source:ty),+) => {
        $(
            impl From<($source, Document)> for $family {
                fn from((selector, fields): ($source, Document)) -> Self {
                    $wrap(Selector::from(selector), fields)
                }
            }
        )+
    };
}

/// Accepted shapes for `find` and `find_one`.
#[derive(Debug, Clone, PartialEq)]
pub enum FindArgs {
    /// Full records matching the selector.
    Select(Selector),
    /// Records matching the selector, limited to the projected fields.
    Project(Selector, Document),
}

impl FindArgs {
    /// Classifies zero, one or two positional arguments: filter, then projection.
    pub fn classify(args: Vec<Bson>) -> DocumentStoreResult<Self> {
        let mut args = args.into_iter();
        let (first, second) = (args.next(), args.next());

        if args.next().is_some() {
            return Err(DocumentStoreError::InvalidQuery(
                "find accepts at most a filter and a projection".to_string(),
            ));
        }

        let selector = Selector::classify(first.unwrap_or(Bson::Null))?;

        match second {
            None | Some(Bson::Null) | Some(Bson::Undefined) => Ok(FindArgs::Select(selector)),
            Some(Bson::Document(projection)) => Ok(FindArgs::Project(selector, projection)),
            Some(other) => Err(DocumentStoreError::InvalidQuery(format!(
                "unsupported projection of type {:?}",
                other.element_type()
            ))),
        }
    }

    pub fn normalize(self) -> Descriptor {
        match self {
            FindArgs::Select(selector) => Descriptor {
                filter: selector.into_filter(),
                ..Descriptor::default()
            },
            FindArgs::Project(selector, projection) => Descriptor {
                filter: selector.into_filter(),
                payload: None,
                projection: Some(Projection::new(projection)).filter(|p| !p.is_empty()),
            },
        }
    }
}

selector_conversions!(FindArgs, FindArgs::Select);
paired_conversions!(FindArgs, FindArgs::Project);

/// Accepted shapes for `update` and `update_one`.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateArgs {
    /// Only a payload was given; it applies to every record.
    Payload(Document),
    /// A selector and the payload to set on matching records.
    Targeted(Selector, Document),
}

impl UpdateArgs {
    /// Classifies one or two positional arguments.
    ///
    /// A lone mapping is a payload for every record. A lone string targets that id with
    /// an empty payload, which matches without modifying anything.
    pub fn classify(args: Vec<Bson>) -> DocumentStoreResult<Self> {
        let mut args = args.into_iter();
        let (first, second) = (args.next(), args.next());

        if args.next().is_some() {
            return Err(DocumentStoreError::InvalidQuery(
                "update accepts at most a filter and a payload".to_string(),
            ));
        }

        match second {
            None | Some(Bson::Null) | Some(Bson::Undefined) => {
                match first.unwrap_or(Bson::Null) {
                    Bson::Null | Bson::Undefined => Ok(UpdateArgs::Payload(Document::new())),
                    Bson::Document(payload) => Ok(UpdateArgs::Payload(payload)),
                    other => Ok(UpdateArgs::Targeted(
                        Selector::classify(other)?,
                        Document::new(),
                    )),
                }
            }
            Some(Bson::Document(payload)) => Ok(UpdateArgs::Targeted(
                Selector::classify(first.unwrap_or(Bson::Null))?,
                payload,
            )),
            Some(other) => Err(DocumentStoreError::InvalidQuery(format!(
                "unsupported update payload of type {:?}",
                other.element_type()
            ))),
        }
    }

    pub fn normalize(self) -> Descriptor {
        let (selector, payload) = match self {
            UpdateArgs::Payload(payload) => (Selector::All, payload),
            UpdateArgs::Targeted(selector, payload) => (selector, payload),
        };

        Descriptor {
            filter: selector.into_filter(),
            payload: Some(payload),
            projection: None,
        }
    }
}

impl From<Document> for UpdateArgs {
    fn from(payload: Document) -> Self {
        UpdateArgs::Payload(payload)
    }
}

impl From<&str> for UpdateArgs {
    fn from(id: &str) -> Self {
        UpdateArgs::Targeted(Selector::from(id), Document::new())
    }
}

impl From<String> for UpdateArgs {
    fn from(id: String) -> Self {
        UpdateArgs::Targeted(Selector::Id(id), Document::new())
    }
}

paired_conversions!(UpdateArgs, UpdateArgs::Targeted);

/// Accepted shapes for `delete` and `delete_one`: an optional selector.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteArgs(pub Selector);

impl DeleteArgs {
    /// Classifies zero or one positional argument.
    pub fn classify(args: Vec<Bson>) -> DocumentStoreResult<Self> {
        let mut args = args.into_iter();
        let first = args.next();

        if args.next().is_some() {
            return Err(DocumentStoreError::InvalidQuery(
                "delete accepts at most a filter".to_string(),
            ));
        }

        Ok(DeleteArgs(Selector::classify(first.unwrap_or(Bson::Null))?))
    }

    pub fn normalize(self) -> Descriptor {
        Descriptor {
            filter: self.0.into_filter(),
            ..Descriptor::default()
        }
    }
}

selector_conversions!(DeleteArgs, DeleteArgs);

/// Conversion into an argument family that may fail during classification.
///
/// Every static shape converts infallibly; positional `Vec<Bson>` arguments go through the
/// family's `classify`.
pub trait IntoArgs<A> {
    fn into_args(self) -> DocumentStoreResult<A>;
}

impl<A, T> IntoArgs<A> for T
where
    A: From<T>,
{
    fn into_args(self) -> DocumentStoreResult<A> {
        Ok(A::from(self))
    }
}

impl IntoArgs<FindArgs> for Vec<Bson> {
    fn into_args(self) -> DocumentStoreResult<FindArgs> {
        FindArgs::classify(self)
    }
}

impl IntoArgs<UpdateArgs> for Vec<Bson> {
    fn into_args(self) -> DocumentStoreResult<UpdateArgs> {
        UpdateArgs::classify(self)
    }
}

impl IntoArgs<DeleteArgs> for Vec<Bson> {
    fn into_args(self) -> DocumentStoreResult<DeleteArgs> {
        DeleteArgs::classify(self)
    }
}

/// Accepted shapes for inserts.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertArgs {
    One(Document),
    Many(Vec<Document>),
}

impl InsertArgs {
    /// Classifies insert data: a non-empty mapping or a non-empty sequence of mappings.
    ///
    /// Anything else (absent, null, strings, numbers, empty mappings, empty sequences,
    /// sequences holding non-mappings) fails with
    /// [`DocumentStoreError::InvalidInsertData`].
    pub fn classify(data: Bson) -> DocumentStoreResult<Self> {
        match data {
            Bson::Document(record) if !record.is_empty() => Ok(InsertArgs::One(record)),
            Bson::Array(records) if !records.is_empty() => records
                .into_iter()
                .map(|record| match record {
                    Bson::Document(record) if !record.is_empty() => Ok(record),
                    other => Err(invalid_insert(&other)),
                })
                .collect::<DocumentStoreResult<Vec<_>>>()
                .map(InsertArgs::Many),
            other => Err(invalid_insert(&other)),
        }
    }

    /// Classifies data that must be a single record.
    pub fn classify_one(data: Bson) -> DocumentStoreResult<Document> {
        match Self::classify(data)? {
            InsertArgs::One(record) => Ok(record),
            InsertArgs::Many(_) => Err(DocumentStoreError::InvalidInsertData(
                "expected a single record, got a sequence".to_string(),
            )),
        }
    }

    /// Classifies data that must be a sequence of records.
    pub fn classify_many(data: Bson) -> DocumentStoreResult<Vec<Document>> {
        match Self::classify(data)? {
            InsertArgs::Many(records) => Ok(records),
            InsertArgs::One(_) => Err(DocumentStoreError::InvalidInsertData(
                "expected a sequence of records, got a single record".to_string(),
            )),
        }
    }
}

fn invalid_insert(data: &Bson) -> DocumentStoreError {
    let shape = match data {
        Bson::Null | Bson::Undefined => "missing data".to_string(),
        Bson::Document(_) => "empty record".to_string(),
        Bson::Array(_) => "empty record list".to_string(),
        other => format!("unsupported data of type {:?}", other.element_type()),
    };

    DocumentStoreError::InvalidInsertData(shape)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn find_string_shorthand_equals_id_mapping() {
        let shorthand = FindArgs::from("a@b.com").normalize();
        let mapping = FindArgs::from(doc! { "id": "a@b.com" }).normalize();

        assert_eq!(shorthand, mapping);
        assert_eq!(shorthand.filter.as_document(), &doc! { "id": "a@b.com" });
    }

    #[test]
    fn missing_and_empty_filters_are_indistinguishable() {
        let missing = FindArgs::from(()).normalize();
        let empty = FindArgs::from(doc! {}).normalize();
        let dynamic = FindArgs::classify(vec![]).unwrap().normalize();

        assert_eq!(missing, empty);
        assert_eq!(missing, dynamic);
        assert!(missing.filter.is_empty());
    }

    #[test]
    fn find_second_mapping_is_projection() {
        let descriptor = FindArgs::from((doc! { "authStrategy": "local" }, doc! { "name": 1 })).normalize();

        assert_eq!(descriptor.filter.as_document(), &doc! { "authStrategy": "local" });
        assert_eq!(descriptor.projection, Some(Projection::new(doc! { "name": 1 })));
        assert_eq!(descriptor.payload, None);
    }

    #[test]
    fn find_empty_projection_returns_full_records() {
        let descriptor = FindArgs::from((doc! {}, doc! {})).normalize();

        assert_eq!(descriptor.projection, None);
    }

    #[test]
    fn find_classify_covers_dynamic_shapes() {
        assert_eq!(
            FindArgs::classify(vec![Bson::from("a@b.com")]).unwrap(),
            FindArgs::Select(Selector::Id("a@b.com".to_string()))
        );
        assert_eq!(
            FindArgs::classify(vec![Bson::Null, Bson::Document(doc! { "name": 1 })]).unwrap(),
            FindArgs::Project(Selector::All, doc! { "name": 1 })
        );
        assert!(matches!(
            FindArgs::classify(vec![Bson::Int32(5)]),
            Err(DocumentStoreError::InvalidQuery(_))
        ));
        assert!(matches!(
            FindArgs::classify(vec![Bson::Null, Bson::from("name")]),
            Err(DocumentStoreError::InvalidQuery(_))
        ));
        assert!(matches!(
            FindArgs::classify(vec![Bson::Null, Bson::Null, Bson::Null]),
            Err(DocumentStoreError::InvalidQuery(_))
        ));
    }

    #[test]
    fn classify_rejects_operator_keys() {
        let operator = Bson::Document(doc! { "$or": [{ "id": "a@b.com" }, { "name": "Ada" }] });

        assert!(matches!(
            FindArgs::classify(vec![operator.clone()]),
            Err(DocumentStoreError::InvalidQuery(_))
        ));
        assert!(matches!(
            UpdateArgs::classify(vec![operator.clone(), Bson::Document(doc! { "name": "Eve" })]),
            Err(DocumentStoreError::InvalidQuery(_))
        ));
        assert!(matches!(
            DeleteArgs::classify(vec![operator]),
            Err(DocumentStoreError::InvalidQuery(_))
        ));
    }

    #[test]
    fn classify_keeps_operator_looking_values_as_literals() {
        let filter = doc! { "id": { "$ne": "" } };

        assert_eq!(
            FindArgs::classify(vec![Bson::Document(filter.clone())]).unwrap(),
            FindArgs::Select(Selector::Fields(filter))
        );
    }

    #[test]
    fn update_payload_only_targets_everything() {
        let descriptor = UpdateArgs::from(doc! { "authStrategy": "admin" }).normalize();

        assert!(descriptor.filter.is_empty());
        assert_eq!(descriptor.payload, Some(doc! { "authStrategy": "admin" }));
    }

    #[test]
    fn update_string_shorthand_equals_id_mapping() {
        let shorthand = UpdateArgs::from(("a@b.com", doc! { "name": "Ada" })).normalize();
        let mapping = UpdateArgs::from((doc! { "id": "a@b.com" }, doc! { "name": "Ada" })).normalize();

        assert_eq!(shorthand, mapping);
    }

    #[test]
    fn update_lone_string_has_empty_payload() {
        let descriptor = UpdateArgs::from("a@b.com").normalize();

        assert_eq!(descriptor.filter, Filter::by_id("a@b.com"));
        assert_eq!(descriptor.payload, Some(Document::new()));
    }

    #[test]
    fn update_classify_mirrors_static_shapes() {
        assert_eq!(
            UpdateArgs::classify(vec![Bson::Document(doc! { "a": 1 })]).unwrap(),
            UpdateArgs::from(doc! { "a": 1 })
        );
        assert_eq!(
            UpdateArgs::classify(vec![Bson::from("x@y.com"), Bson::Document(doc! { "a": 1 })]).unwrap(),
            UpdateArgs::from(("x@y.com", doc! { "a": 1 }))
        );
        assert_eq!(
            UpdateArgs::classify(vec![Bson::from("x@y.com")]).unwrap(),
            UpdateArgs::from("x@y.com")
        );
        assert_eq!(
            UpdateArgs::classify(vec![]).unwrap(),
            UpdateArgs::Payload(Document::new())
        );
        assert!(matches!(
            UpdateArgs::classify(vec![Bson::from("x@y.com"), Bson::from("oops")]),
            Err(DocumentStoreError::InvalidQuery(_))
        ));
    }

    #[test]
    fn delete_shapes_normalize_to_filters() {
        assert_eq!(DeleteArgs::from(()).normalize().filter, Filter::all());
        assert_eq!(DeleteArgs::from(doc! {}).normalize().filter, Filter::all());
        assert_eq!(
            DeleteArgs::from("a@b.com").normalize(),
            DeleteArgs::from(doc! { "id": "a@b.com" }).normalize()
        );
        assert_eq!(
            DeleteArgs::classify(vec![Bson::Null]).unwrap().normalize().filter,
            Filter::all()
        );
        assert!(DeleteArgs::classify(vec![Bson::Null, Bson::Null]).is_err());
    }

    #[test]
    fn insert_rejects_missing_null_string_and_empty_data() {
        for data in [
            Bson::Null,
            Bson::Undefined,
            Bson::from("someone@example.com"),
            Bson::Document(doc! {}),
            Bson::Array(vec![]),
            Bson::Int32(3),
        ] {
            assert!(
                matches!(InsertArgs::classify(data.clone()), Err(DocumentStoreError::InvalidInsertData(_))),
                "accepted {data:?}"
            );
        }
    }

    #[test]
    fn insert_rejects_sequences_with_non_mappings() {
        let data = Bson::Array(vec![Bson::Document(doc! { "email": "a@b.com" }), Bson::from("b@c.com")]);

        assert!(matches!(
            InsertArgs::classify(data),
            Err(DocumentStoreError::InvalidInsertData(_))
        ));
    }

    #[test]
    fn insert_splits_single_and_bulk() {
        assert_eq!(
            InsertArgs::classify(doc! { "email": "a@b.com" }.into()).unwrap(),
            InsertArgs::One(doc! { "email": "a@b.com" })
        );
        assert_eq!(
            InsertArgs::classify(vec![doc! { "email": "a@b.com" }].into()).unwrap(),
            InsertArgs::Many(vec![doc! { "email": "a@b.com" }])
        );
        assert!(InsertArgs::classify_one(vec![doc! { "email": "a@b.com" }].into()).is_err());
        assert!(InsertArgs::classify_many(doc! { "email": "a@b.com" }.into()).is_err());
    }
}
