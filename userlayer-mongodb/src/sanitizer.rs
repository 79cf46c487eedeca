//! Field name sanitization for MongoDB compatibility.
//!
//! MongoDB gives dots and dollar signs in field names special meaning (nested paths and
//! operators). Stored records may still carry such keys, for example inside a user's
//! `settings`, so keys are escaped on the way in and restored on the way out. Values are
//! never touched: primary keys are email addresses and must stay queryable as written.

use bson::{Bson, Document};

/// Escapes and restores document keys around MongoDB's field name restrictions.
///
/// MongoDB does not allow field names to contain:
/// - Dots (`.`) - used for nested field access in queries
/// - Dollar signs (`$`) - used for operators in queries
/// - Null bytes (`\0`) - field name terminators
pub(crate) struct KeySanitizer;

impl KeySanitizer {
    const REPLACEMENTS: [(&'static str, &'static str); 3] = [
        (".", "__dot__"),
        ("$", "__dollar__"),
        ("\0", "__null__"),
    ];

    /// Recursively escapes every key in a document, including documents nested in arrays.
    pub(crate) fn sanitize_document(document: &Document) -> Document {
        document
            .iter()
            .map(|(k, v)| (Self::sanitize_string(k), Self::map_value(v, Self::sanitize_document)))
            .collect()
    }

    /// Inverse of [`KeySanitizer::sanitize_document`].
    pub(crate) fn restore_document(document: &Document) -> Document {
        document
            .iter()
            .map(|(k, v)| (Self::restore_string(k), Self::map_value(v, Self::restore_document)))
            .collect()
    }

    fn map_value(value: &Bson, f: fn(&Document) -> Document) -> Bson {
        match value {
            Bson::Document(doc) => Bson::Document(f(doc)),
            Bson::Array(arr) => Bson::Array(
                arr
                    .iter()
                    .map(|item| Self::map_value(item, f))
                    .collect(),
            ),
            _ => value.clone(),
        }
    }

    pub(crate) fn sanitize_string(input: &str) -> String {
        let mut sanitized = input.to_string();
        for (target, replacement) in Self::REPLACEMENTS.iter() {
            sanitized = sanitized.replace(*target, *replacement);
        }
        sanitized
    }

    pub(crate) fn restore_string(input: &str) -> String {
        let mut restored = input.to_string();
        for (target, replacement) in Self::REPLACEMENTS.iter().rev() {
            restored = restored.replace(*replacement, *target);
        }
        restored
    }
}
