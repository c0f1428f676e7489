use serde::{Deserialize, Serialize};
use serde_json::Value;

use recess_types::{MergePolicy, Timestamp};

/// The JSON shape a field is expected to hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    String,
    /// RFC 3339 timestamp string.
    Date,
    List,
    Object,
}

/// Default applied to a field absent from input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DefaultValue {
    /// A fixed value, cloned on every use.
    Literal(Value),
    /// The current time, evaluated when the default is applied.
    Now,
    /// A fresh empty list.
    EmptyList,
    /// A fresh empty object.
    EmptyObject,
}

impl DefaultValue {
    /// Produce the default value.
    pub fn produce(&self) -> Value {
        match self {
            Self::Literal(v) => v.clone(),
            Self::Now => Timestamp::now().to_value(),
            Self::EmptyList => Value::Array(Vec::new()),
            Self::EmptyObject => Value::Object(Default::default()),
        }
    }
}

/// Metadata for one field of a schema.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub kind: FieldKind,
    pub required: bool,
    /// Whether callers may set this field. Defaults to `true`.
    pub overwriteable: bool,
    pub default: Option<DefaultValue>,
    /// Enumerated acceptable values (compared case-insensitively).
    pub allowed: Option<Vec<String>>,
    pub trim: bool,
    /// Upper bound on list length.
    pub max: Option<usize>,
    /// At most one stored document may hold a given value of this field.
    pub unique: bool,
    /// Holds a credential that must never leave the trust boundary.
    pub secret: bool,
    pub merge: MergePolicy,
}

impl FieldSpec {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            required: false,
            overwriteable: true,
            default: None,
            allowed: None,
            trim: false,
            max: None,
            unique: false,
            secret: false,
            merge: MergePolicy::Replace,
        }
    }

    pub fn string() -> Self {
        Self::new(FieldKind::String)
    }

    pub fn date() -> Self {
        Self::new(FieldKind::Date)
    }

    pub fn list() -> Self {
        Self::new(FieldKind::List)
    }

    pub fn object() -> Self {
        Self::new(FieldKind::Object)
    }

    /// The identity field: required and never overwritable.
    pub fn identity() -> Self {
        Self::string().required().locked()
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Mark as non-overwritable: callers can never set this field.
    pub fn locked(mut self) -> Self {
        self.overwriteable = false;
        self
    }

    pub fn default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    pub fn one_of<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn trim(mut self) -> Self {
        self.trim = true;
        self
    }

    pub fn max(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn secret(mut self) -> Self {
        self.secret = true;
        self
    }

    pub fn merge(mut self, policy: MergePolicy) -> Self {
        self.merge = policy;
        self
    }

    /// Required of caller input: required and settable by the caller.
    /// Locked required fields are supplied by the service itself.
    pub fn required_on_input(&self) -> bool {
        self.required && self.overwriteable
    }
}
