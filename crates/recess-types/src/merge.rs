//! Explicit merge semantics for document updates.
//!
//! An update patch is applied field-by-field. Each top-level field follows
//! its [`MergePolicy`]; fields without an explicit rule use
//! the default policy given to [`MergeRules::new`]. Lists are never merged element-wise.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// How a patch value is combined with the stored value of the same field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MergePolicy {
    /// The patch value replaces the stored value wholesale, whatever its type.
    #[default]
    Replace,
    /// Objects are merged key-by-key, recursively. Scalars and lists are
    /// still replaced wholesale.
    DeepMerge,
}

/// Per-field merge policies for one document type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRules {
    default_policy: MergePolicy,
    fields: BTreeMap<String, MergePolicy>,
}

impl MergeRules {
    /// Rules where every field uses `default_policy`.
    pub fn new(default_policy: MergePolicy) -> Self {
        Self {
            default_policy,
            fields: BTreeMap::new(),
        }
    }

    /// Every field replaced wholesale.
    pub fn replace_all() -> Self {
        Self::new(MergePolicy::Replace)
    }

    /// Override the policy for one field.
    pub fn with_field(mut self, field: impl Into<String>, policy: MergePolicy) -> Self {
        self.fields.insert(field.into(), policy);
        self
    }

    /// The effective policy for `field`.
    pub fn policy_for(&self, field: &str) -> MergePolicy {
        self.fields
            .get(field)
            .copied()
            .unwrap_or(self.default_policy)
    }

    /// Apply `patch` onto `target` in place.
    pub fn apply(&self, target: &mut Map<String, Value>, patch: Map<String, Value>) {
        for (key, value) in patch {
            match self.policy_for(&key) {
                MergePolicy::Replace => {
                    target.insert(key, value);
                }
                MergePolicy::DeepMerge => match target.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                },
            }
        }
    }
}

fn deep_merge(existing: &mut Value, incoming: Value) {
    match (existing, incoming) {
        (Value::Object(dst), Value::Object(src)) => {
            for (key, value) in src {
                match dst.get_mut(&key) {
                    Some(slot) => deep_merge(slot, value),
                    None => {
                        dst.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
