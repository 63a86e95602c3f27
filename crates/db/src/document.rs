//! Untyped documents, identities, filters, and projections

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::DbError;

/// Field holding a document's identity
pub const ID_FIELD: &str = "_id";

/// A stored document: a JSON object keyed by field name
pub type Document = serde_json::Map<String, Value>;

/// Identity assigned by the store when a document is inserted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Generate a fresh, time-ordered identity
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for DocumentId {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| DbError::MalformedId(s.to_string()))
    }
}

impl From<DocumentId> for Value {
    fn from(id: DocumentId) -> Self {
        Value::String(id.to_string())
    }
}

#[derive(Debug, Clone)]
enum Condition {
    Eq(Value),
    In(Vec<Value>),
}

/// Conjunction of field conditions.
///
/// Equality follows document-store semantics: a condition against an array
/// field matches when any element of the array is equal to the operand.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    conditions: Vec<(String, Condition)>,
}

impl Filter {
    /// Filter matching every document
    pub fn all() -> Self {
        Self::default()
    }

    /// Require `field` to equal `value`
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions
            .push((field.into(), Condition::Eq(value.into())));
        self
    }

    /// Require `field` to equal one of `values`
    pub fn is_in<I, V>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.conditions.push((field.into(), Condition::In(values)));
        self
    }

    /// Check whether a document satisfies every condition
    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions.iter().all(|(field, condition)| {
            let Some(actual) = doc.get(field) else {
                return false;
            };
            match condition {
                Condition::Eq(expected) => value_matches(actual, expected),
                Condition::In(candidates) => candidates
                    .iter()
                    .any(|expected| value_matches(actual, expected)),
            }
        })
    }
}

fn value_matches(actual: &Value, expected: &Value) -> bool {
    match actual {
        Value::Array(items) if !expected.is_array() => items.iter().any(|item| item == expected),
        _ => actual == expected,
    }
}

/// Subset of fields to return from a query. The identity is always kept.
#[derive(Debug, Clone)]
pub struct Projection {
    fields: Vec<String>,
}

impl Projection {
    pub fn fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Copy the projected fields out of `doc`
    pub fn apply(&self, doc: &Document) -> Document {
        doc.iter()
            .filter(|(key, _)| key.as_str() == ID_FIELD || self.fields.iter().any(|f| f == *key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_id_roundtrips_through_display() {
        let id = DocumentId::new();
        let parsed: DocumentId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_malformed_id_is_rejected() {
        let err = "not-an-id".parse::<DocumentId>().unwrap_err();
        assert!(matches!(err, DbError::MalformedId(ref raw) if raw == "not-an-id"));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(Filter::all().matches(&doc(json!({"title": "Dune"}))));
    }

    #[test]
    fn test_eq_matches_array_elements() {
        let book = doc(json!({"title": "Dune", "genre": ["g1", "g2"]}));
        assert!(Filter::all().eq("genre", "g2").matches(&book));
        assert!(!Filter::all().eq("genre", "g3").matches(&book));
    }

    #[test]
    fn test_missing_field_never_matches() {
        let book = doc(json!({"title": "Dune"}));
        assert!(!Filter::all().eq("author", "a1").matches(&book));
    }

    #[test]
    fn test_is_in() {
        let copy = doc(json!({"status": "Loaned"}));
        assert!(Filter::all()
            .is_in("status", ["Available", "Loaned"])
            .matches(&copy));
        assert!(!Filter::all().is_in("status", ["Reserved"]).matches(&copy));
    }

    #[test]
    fn test_projection_keeps_identity() {
        let book = doc(json!({"_id": "x", "title": "Dune", "summary": "Spice"}));
        let projected = Projection::fields(["title"]).apply(&book);
        assert_eq!(Value::Object(projected), json!({"_id": "x", "title": "Dune"}));
    }
}
