//! Input normalization against a [`SchemaDescriptor`].
//!
//! Entity services run caller input through these steps in order:
//! [`check_required`] (create only), [`strip_non_overwritable`],
//! [`coerce_enums`], [`trim_strings`], then [`apply_defaults`] (create only).

use serde_json::Value;

use recess_types::Document;

use crate::descriptor::SchemaDescriptor;

/// The first caller-supplied required field that is absent or `null`.
pub fn check_required(schema: &SchemaDescriptor, input: &Document) -> Option<String> {
    schema
        .input_required_fields()
        .into_iter()
        .find(|field| !input.has(field))
        .map(str::to_string)
}

/// Remove every locked field the caller attempted to set.
///
/// Returns the names of the removed fields.
pub fn strip_non_overwritable(schema: &SchemaDescriptor, input: &mut Document) -> Vec<String> {
    let mut removed = Vec::new();
    for field in schema.non_overwritable_fields() {
        if input.remove(field).is_some() {
            removed.push(field.to_string());
        }
    }
    removed
}

/// Map enumerated values case-insensitively onto their canonical spelling.
///
/// Applies to string fields and to each string element of list fields.
/// Values with no match are left untouched.
pub fn coerce_enums(schema: &SchemaDescriptor, input: &mut Document) {
    for (field, allowed) in schema.enum_constraints() {
        if let Some(value) = input.get_mut(field) {
            match value {
                Value::String(s) => coerce_one(s, allowed),
                Value::Array(items) => {
                    for item in items.iter_mut() {
                        if let Value::String(s) = item {
                            coerce_one(s, allowed);
                        }
                    }
                }
                _ => {}
            }
        }
    }
}

fn coerce_one(value: &mut String, allowed: &[String]) {
    if let Some(canonical) = allowed.iter().find(|a| a.eq_ignore_ascii_case(value)) {
        if canonical.as_str() != value.as_str() {
            *value = canonical.clone();
        }
    }
}

/// Trim surrounding whitespace on trim-eligible string fields.
pub fn trim_strings(schema: &SchemaDescriptor, input: &mut Document) {
    for field in schema.trim_fields() {
        if let Some(Value::String(s)) = input.get_mut(field) {
            let trimmed = s.trim();
            if trimmed.len() != s.len() {
                *s = trimmed.to_string();
            }
        }
    }
}

/// Insert defaults for every field absent from `input`.
pub fn apply_defaults(schema: &SchemaDescriptor, input: &mut Document) {
    for (field, default) in schema.defaults() {
        if !input.contains_key(field) {
            input.insert(field, default.produce());
        }
    }
}

/// Cut bounded lists down to their declared maximum, keeping the front.
pub fn truncate_bounded_lists(schema: &SchemaDescriptor, doc: &mut Document) {
    for (field, spec) in schema.fields() {
        if let (Some(max), Some(Value::Array(items))) = (spec.max, doc.get_mut(field)) {
            items.truncate(max);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{DefaultValue, FieldSpec};
    use proptest::prelude::*;
    use serde_json::json;

    fn schema() -> SchemaDescriptor {
        SchemaDescriptor::new("user")
            .field("username", FieldSpec::string().required().trim())
            .field("roles", FieldSpec::list().one_of(["user", "admin"]).default(
                DefaultValue::Literal(json!(["user"])),
            ))
            .field("level", FieldSpec::string().one_of(["Low", "High"]))
            .field("displayName", FieldSpec::string().locked().trim())
            .field("history", FieldSpec::list().locked().max(2).default(DefaultValue::EmptyList))
    }

    fn doc(v: Value) -> Document {
        Document::from_value(v).unwrap()
    }

    #[test]
    fn check_required_reports_first_missing() {
        let s = schema();
        assert_eq!(check_required(&s, &doc(json!({}))), Some("username".into()));
        assert_eq!(
            check_required(&s, &doc(json!({"username": null}))),
            Some("username".into())
        );
        assert_eq!(check_required(&s, &doc(json!({"username": "a"}))), None);
    }

    #[test]
    fn check_required_ignores_service_managed_fields() {
        // `_id` is required at rest but generated by the service.
        assert_eq!(check_required(&schema(), &doc(json!({"username": "a"}))), None);
    }

    #[test]
    fn strip_removes_locked_fields() {
        let mut d = doc(json!({
            "_id": "x", "created": "y", "displayName": "z", "username": "a"
        }));
        let removed = strip_non_overwritable(&schema(), &mut d);
        assert_eq!(removed, vec!["_id", "created", "displayName"]);
        assert_eq!(d.into_value(), json!({"username": "a"}));
    }

    #[test]
    fn coerce_maps_case_insensitively() {
        let mut d = doc(json!({"level": "HIGH", "roles": ["ADMIN", "User", "guest"]}));
        coerce_enums(&schema(), &mut d);
        assert_eq!(d.get("level"), Some(&json!("High")));
        assert_eq!(d.get("roles"), Some(&json!(["admin", "user", "guest"])));
    }

    #[test]
    fn coerce_leaves_unmatched_values() {
        let mut d = doc(json!({"level": "medium"}));
        coerce_enums(&schema(), &mut d);
        assert_eq!(d.get("level"), Some(&json!("medium")));
    }

    #[test]
    fn trim_only_touches_trim_fields() {
        let s = SchemaDescriptor::new("t")
            .field("a", FieldSpec::string().trim())
            .field("b", FieldSpec::string());
        let mut d = doc(json!({"a": "  x  ", "b": "  y  "}));
        trim_strings(&s, &mut d);
        assert_eq!(d.get("a"), Some(&json!("x")));
        assert_eq!(d.get("b"), Some(&json!("  y  ")));
    }

    #[test]
    fn defaults_fill_only_absent_fields() {
        let mut d = doc(json!({"roles": ["admin"]}));
        apply_defaults(&schema(), &mut d);
        assert_eq!(d.get("roles"), Some(&json!(["admin"])));
        assert_eq!(d.get("history"), Some(&json!([])));
        assert!(d.get_str("created").is_some());
    }

    #[test]
    fn truncate_keeps_front_of_bounded_lists() {
        let mut d = doc(json!({"history": [3, 2, 1], "roles": ["a", "b", "c"]}));
        truncate_bounded_lists(&schema(), &mut d);
        assert_eq!(d.get("history"), Some(&json!([3, 2])));
        assert_eq!(d.get("roles"), Some(&json!(["a", "b", "c"])));
    }

    proptest! {
        #[test]
        fn strip_never_leaves_locked_fields(
            keys in proptest::collection::vec(
                prop_oneof![
                    Just("_id"), Just("created"), Just("displayName"),
                    Just("history"), Just("username"), Just("roles")
                ],
                0..6,
            ),
            value in "[a-z]{0,8}",
        ) {
            let s = schema();
            let mut d = Document::new();
            for k in &keys {
                d.insert(*k, value.clone());
            }
            strip_non_overwritable(&s, &mut d);
            for locked in s.non_overwritable_fields() {
                prop_assert!(!d.contains_key(locked));
            }
        }
    }
}
