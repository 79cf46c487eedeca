//! The `users` collection record and its factory.

use bson::{Bson, Document};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{DocumentStoreError, DocumentStoreResult},
    record::{ID_FIELD, Record},
};

/// Authentication strategy assigned when the input does not name one.
pub const DEFAULT_AUTH_STRATEGY: &str = "local";

/// A persisted user.
///
/// The primary key is the user's email address. `password_hash` is computed elsewhere;
/// this layer stores it verbatim and never hashes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    pub auth_strategy: String,
    /// ISO-8601 UTC timestamp with millisecond precision.
    pub created_at: String,
    #[serde(default)]
    pub settings: Document,
}

impl User {
    /// Builds a user from partial input as of the given instant.
    ///
    /// The id is taken from `email`, falling back to `id`. An empty or missing
    /// `authStrategy` becomes [`DEFAULT_AUTH_STRATEGY`]; settings always start empty.
    pub fn build_at(data: &Document, now: DateTime<Utc>) -> DocumentStoreResult<Self> {
        let id = non_empty_str(data, "email")
            .or_else(|| non_empty_str(data, ID_FIELD))
            .ok_or_else(|| {
                DocumentStoreError::InvalidInsertData("missing email".to_string())
            })?;

        Ok(Self {
            id: id.to_string(),
            name: non_empty_str(data, "name").map(str::to_string),
            password_hash: non_empty_str(data, "passwordHash").map(str::to_string),
            auth_strategy: non_empty_str(data, "authStrategy")
                .unwrap_or(DEFAULT_AUTH_STRATEGY)
                .to_string(),
            created_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            settings: Document::new(),
        })
    }
}

impl Record for User {
    fn id(&self) -> &str {
        &self.id
    }

    fn collection_name() -> &'static str {
        "users"
    }

    fn from_input(data: &Document) -> DocumentStoreResult<Self> {
        Self::build_at(data, Utc::now())
    }
}

fn non_empty_str<'a>(data: &'a Document, key: &str) -> Option<&'a str> {
    match data.get(key) {
        Some(Bson::String(value)) if !value.is_empty() => Some(value.as_str()),
        _ => None,
    }
}
