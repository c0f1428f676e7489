use recess_types::{MergePolicy, MergeRules, CREATED_FIELD, ID_FIELD};

use crate::field::{DefaultValue, FieldSpec};

/// Static metadata describing one document type.
///
/// Every descriptor starts with the identity field `_id` (required, locked)
/// and the creation timestamp `created` (locked, defaults to now). Field
/// order is declaration order.
#[derive(Clone, Debug, PartialEq)]
pub struct SchemaDescriptor {
    name: String,
    fields: Vec<(String, FieldSpec)>,
}

impl SchemaDescriptor {
    /// A descriptor holding only `_id` and `created`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: vec![
                (ID_FIELD.to_string(), FieldSpec::identity()),
                (
                    CREATED_FIELD.to_string(),
                    FieldSpec::date().locked().default(DefaultValue::Now),
                ),
            ],
        }
    }

    /// Declare (or redeclare) a field.
    ///
    /// `_id` and `created` stay locked whatever the caller passes; `_id`
    /// also stays required.
    pub fn field(mut self, name: impl Into<String>, mut spec: FieldSpec) -> Self {
        let name = name.into();
        if name == ID_FIELD {
            debug_assert!(!spec.overwriteable, "identity field must be locked");
            spec.required = true;
            spec.overwriteable = false;
        } else if name == CREATED_FIELD {
            debug_assert!(!spec.overwriteable, "creation timestamp must be locked");
            spec.overwriteable = false;
        }
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = spec,
            None => self.fields.push((name, spec)),
        }
        self
    }

    /// The entity name (used in logs and errors).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, field: &str) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|(n, _)| n == field)
            .map(|(_, spec)| spec)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(n, spec)| (n.as_str(), spec))
    }

    fn select(&self, pred: impl Fn(&FieldSpec) -> bool) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(_, spec)| pred(spec))
            .map(|(n, _)| n.as_str())
            .collect()
    }

    /// Every field marked required, including service-managed ones.
    pub fn required_fields(&self) -> Vec<&str> {
        self.select(|s| s.required)
    }

    /// Required fields the caller must supply.
    pub fn input_required_fields(&self) -> Vec<&str> {
        self.select(FieldSpec::required_on_input)
    }

    pub fn non_overwritable_fields(&self) -> Vec<&str> {
        self.select(|s| !s.overwriteable)
    }

    pub fn defaults(&self) -> Vec<(&str, &DefaultValue)> {
        self.fields
            .iter()
            .filter_map(|(n, spec)| spec.default.as_ref().map(|d| (n.as_str(), d)))
            .collect()
    }

    pub fn enum_constraints(&self) -> Vec<(&str, &[String])> {
        self.fields
            .iter()
            .filter_map(|(n, spec)| spec.allowed.as_deref().map(|a| (n.as_str(), a)))
            .collect()
    }

    pub fn trim_fields(&self) -> Vec<&str> {
        self.select(|s| s.trim)
    }

    pub fn unique_fields(&self) -> Vec<&str> {
        self.select(|s| s.unique)
    }

    pub fn secret_fields(&self) -> Vec<&str> {
        self.select(|s| s.secret)
    }

    /// Bound on a list field's length, if declared.
    pub fn max_len(&self, field: &str) -> Option<usize> {
        self.get(field).and_then(|s| s.max)
    }

    /// Update merge rules: `Replace` unless a field declares otherwise.
    pub fn merge_rules(&self) -> MergeRules {
        self.fields
            .iter()
            .filter(|(_, spec)| spec.merge != MergePolicy::Replace)
            .fold(MergeRules::replace_all(), |rules, (n, spec)| {
                rules.with_field(n.clone(), spec.merge)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> SchemaDescriptor {
        SchemaDescriptor::new("widget")
            .field("name", FieldSpec::string().required().trim().unique())
            .field("kind", FieldSpec::string().one_of(["small", "large"]))
            .field("history", FieldSpec::list().locked().max(3).default(DefaultValue::EmptyList))
            .field("meta", FieldSpec::object().merge(MergePolicy::DeepMerge))
            .field("secret", FieldSpec::string().required().secret())
    }

    #[test]
    fn identity_and_created_are_always_present() {
        let s = SchemaDescriptor::new("empty");
        let id = s.get(ID_FIELD).unwrap();
        assert!(id.required && !id.overwriteable);
        assert!(!s.get(CREATED_FIELD).unwrap().overwriteable);
    }

    #[test]
    fn identity_cannot_be_unlocked() {
        let s = SchemaDescriptor::new("w").field(ID_FIELD, FieldSpec::identity().unique());
        let id = s.get(ID_FIELD).unwrap();
        assert!(id.required && !id.overwriteable && id.unique);
        assert_eq!(s.fields().filter(|(n, _)| *n == ID_FIELD).count(), 1);
    }

    #[test]
    fn required_derivations() {
        let s = schema();
        assert_eq!(s.required_fields(), vec!["_id", "name", "secret"]);
        assert_eq!(s.input_required_fields(), vec!["name", "secret"]);
    }

    #[test]
    fn non_overwritable_derivation() {
        assert_eq!(
            schema().non_overwritable_fields(),
            vec!["_id", "created", "history"]
        );
    }

    #[test]
    fn other_derivations() {
        let s = schema();
        assert_eq!(s.trim_fields(), vec!["name"]);
        assert_eq!(s.unique_fields(), vec!["name"]);
        assert_eq!(s.secret_fields(), vec!["secret"]);
        assert_eq!(s.max_len("history"), Some(3));
        assert_eq!(s.max_len("name"), None);
        let enums = s.enum_constraints();
        assert_eq!(enums.len(), 1);
        assert_eq!(enums[0].0, "kind");
        let defaults: Vec<&str> = s.defaults().into_iter().map(|(n, _)| n).collect();
        assert_eq!(defaults, vec!["created", "history"]);
    }

    #[test]
    fn merge_rules_follow_fields() {
        let rules = schema().merge_rules();
        assert_eq!(rules.policy_for("meta"), MergePolicy::DeepMerge);
        assert_eq!(rules.policy_for("name"), MergePolicy::Replace);
    }

    #[test]
    fn redeclaring_replaces_in_place() {
        let s = schema().field("name", FieldSpec::string());
        assert!(!s.get("name").unwrap().required);
        assert_eq!(s.fields().nth(2).unwrap().0, "name");
    }
}
