use serde_json::Value;

use crate::document::{Document, ID_FIELD};
use crate::id::DocumentId;

/// Exact field-equality predicate.
///
/// A document matches when every clause matches. Field names may be dotted
/// paths (`"profile.team"`) to compare nested values. An empty filter
/// matches every document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, Value)>,
}

impl Filter {
    /// A filter with no clauses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Match on the identity field.
    pub fn by_id(id: &DocumentId) -> Self {
        Self::new().eq(ID_FIELD, id.to_string())
    }

    /// Add an equality clause.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push((field.into(), value.into()));
        self
    }

    /// Returns `true` if `doc` satisfies every clause.
    pub fn matches(&self, doc: &Document) -> bool {
        self.clauses
            .iter()
            .all(|(field, expected)| doc.get_path(field) == Some(expected))
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: Value) -> Document {
        Document::from_value(v).unwrap()
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(Filter::new().matches(&doc(json!({"a": 1}))));
        assert!(Filter::new().matches(&Document::new()));
    }

    #[test]
    fn all_clauses_must_match() {
        let d = doc(json!({"a": 1, "b": "x"}));
        assert!(Filter::new().eq("a", 1).eq("b", "x").matches(&d));
        assert!(!Filter::new().eq("a", 1).eq("b", "y").matches(&d));
    }

    #[test]
    fn missing_field_never_matches() {
        assert!(!Filter::new().eq("a", Value::Null).matches(&doc(json!({}))));
    }

    #[test]
    fn nested_equality() {
        let d = doc(json!({"owner": {"id": "u1"}}));
        assert!(Filter::new().eq("owner.id", "u1").matches(&d));
        assert!(!Filter::new().eq("owner.id", "u2").matches(&d));
    }

    #[test]
    fn by_id_matches_identity_field() {
        let id = DocumentId::new();
        let d = doc(json!({"_id": id.to_string()}));
        assert!(Filter::by_id(&id).matches(&d));
        assert!(!Filter::by_id(&DocumentId::new()).matches(&d));
    }

    #[test]
    fn equality_is_type_strict() {
        let d = doc(json!({"n": 1}));
        assert!(!Filter::new().eq("n", "1").matches(&d));
    }
}
