use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TypeError;
use crate::id::DocumentId;
use crate::merge::MergeRules;
use crate::temporal::Timestamp;

/// Name of the identity field carried by every stored document.
pub const ID_FIELD: &str = "_id";

/// Name of the creation timestamp field carried by every stored document.
pub const CREATED_FIELD: &str = "created";

/// A structured record with named fields: the unit of storage.
///
/// A `Document` is an owned JSON object. Cloning is a deep copy, so a
/// document handed to a caller can never alias stored state.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    /// An empty document.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Convert a JSON value; anything other than an object is rejected.
    pub fn from_value(value: Value) -> Result<Self, TypeError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(TypeError::NotAnObject(json_kind(&other).to_string())),
        }
    }

    /// Builder-style field insertion.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn get_mut(&mut self, field: &str) -> Option<&mut Value> {
        self.0.get_mut(field)
    }

    /// The field as a string slice, if present and a string.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    /// The field as an array, if present and an array.
    pub fn get_array(&self, field: &str) -> Option<&Vec<Value>> {
        self.0.get(field).and_then(Value::as_array)
    }

    /// Look up a dotted path (`"a.b.c"`) through nested objects.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let first = parts.next()?;
        let mut current = self.0.get(first)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    /// `true` if the field is present and not `null`.
    pub fn has(&self, field: &str) -> bool {
        matches!(self.0.get(field), Some(v) if !v.is_null())
    }

    pub fn contains_key(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Keep only the fields for which `keep` returns `true`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &mut Value) -> bool) {
        self.0.retain(|k, v| keep(k.as_str(), v));
    }

    /// The parsed `_id`, if present and well-formed.
    pub fn id(&self) -> Option<DocumentId> {
        self.get_str(ID_FIELD)
            .and_then(|s| DocumentId::parse(s).ok())
    }

    /// The parsed `created` timestamp, if present and well-formed.
    pub fn created(&self) -> Option<Timestamp> {
        self.get_str(CREATED_FIELD)
            .and_then(|s| Timestamp::parse(s).ok())
    }

    /// Apply an update patch according to `rules`.
    pub fn merge(&mut self, patch: Document, rules: &MergeRules) {
        rules.apply(&mut self.0, patch.0);
    }

    /// A copy with the named fields removed.
    pub fn without<'a>(&self, fields: impl IntoIterator<Item = &'a str>) -> Document {
        let hidden: BTreeSet<&str> = fields.into_iter().collect();
        let mut copy = self.clone();
        copy.0.retain(|k, _| !hidden.contains(k.as_str()));
        copy
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        doc.into_value()
    }
}

impl TryFrom<Value> for Document {
    type Error = TypeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get_str(ID_FIELD) {
            Some(id) => write!(f, "Document({id}, {} fields)", self.0.len()),
            None => write!(f, "Document(<unsaved>, {} fields)", self.0.len()),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Document {
        Document::from_value(json!({
            "_id": "0190a6d4-7c3e-7a1b-9f00-000000000001",
            "created": "2024-01-05T00:00:00.000Z",
            "name": "alice",
            "profile": {"team": {"name": "ops"}},
            "tags": ["a", "b"],
            "nothing": null
        }))
        .unwrap()
    }

    #[test]
    fn from_value_rejects_non_objects() {
        assert_eq!(
            Document::from_value(json!([1, 2])),
            Err(TypeError::NotAnObject("array".into()))
        );
    }

    #[test]
    fn id_and_created_parse() {
        let doc = sample();
        assert_eq!(
            doc.id().unwrap().to_string(),
            "0190a6d4-7c3e-7a1b-9f00-000000000001"
        );
        assert_eq!(doc.created().unwrap().epoch_millis(), 1_704_412_800_000);
    }

    #[test]
    fn get_path_walks_nested_objects() {
        let doc = sample();
        assert_eq!(doc.get_path("profile.team.name"), Some(&json!("ops")));
        assert_eq!(doc.get_path("profile.missing"), None);
        assert_eq!(doc.get_path("name.inner"), None);
    }

    #[test]
    fn has_treats_null_as_absent() {
        let doc = sample();
        assert!(doc.has("name"));
        assert!(!doc.has("nothing"));
        assert!(doc.contains_key("nothing"));
    }

    #[test]
    fn without_removes_fields_and_leaves_original() {
        let doc = sample();
        let view = doc.without(["name", "tags"]);
        assert!(!view.contains_key("name"));
        assert!(!view.contains_key("tags"));
        assert!(doc.contains_key("name"));
    }

    #[test]
    fn clones_do_not_alias() {
        let doc = sample();
        let mut copy = doc.clone();
        copy.get_mut("tags")
            .and_then(Value::as_array_mut)
            .unwrap()
            .push(json!("c"));
        assert_eq!(doc.get_array("tags").unwrap().len(), 2);
    }

    #[test]
    fn debug_shows_id() {
        let debug = format!("{:?}", sample());
        assert!(debug.contains("0190a6d4"));
        assert!(format!("{:?}", Document::new()).contains("<unsaved>"));
    }
}
