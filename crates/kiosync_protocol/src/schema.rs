//! Declarative payload schemas.
//!
//! A `Schema` describes the shape a JSON value must have without tying that
//! description to any particular validation engine.

use serde_json::Value;
use std::fmt;

/// Engine-neutral description of an expected JSON shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schema {
    /// A JSON string.
    String,
    /// A JSON string with at least one character.
    NonEmptyString,
    /// Any value, including `null` or an absent field.
    Any,
    /// An array whose every item matches the inner schema.
    Array(Box<Schema>),
    /// An object with the listed fields. Every field is required unless its
    /// schema is `Any`; unlisted fields are ignored.
    Object(Vec<(&'static str, Schema)>),
}

impl Schema {
    /// Builds an object schema.
    pub fn object(fields: impl IntoIterator<Item = (&'static str, Schema)>) -> Self {
        Schema::Object(fields.into_iter().collect())
    }

    /// Builds an array schema.
    pub fn array(item: Schema) -> Self {
        Schema::Array(Box::new(item))
    }

    /// Returns the JSON kind this schema expects, if it constrains one.
    pub fn expected_kind(&self) -> Option<JsonKind> {
        match self {
            Schema::String | Schema::NonEmptyString => Some(JsonKind::String),
            Schema::Any => None,
            Schema::Array(_) => Some(JsonKind::Array),
            Schema::Object(_) => Some(JsonKind::Object),
        }
    }

    /// Returns true if an absent value satisfies this schema.
    pub fn accepts_absent(&self) -> bool {
        matches!(self, Schema::Any)
    }
}

/// The kind of a JSON value, as named in validation messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonKind {
    /// `null`
    Null,
    /// `true` / `false`
    Boolean,
    /// Any number.
    Number,
    /// A string.
    String,
    /// An array.
    Array,
    /// An object.
    Object,
}

impl JsonKind {
    /// Classifies a JSON value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => JsonKind::Null,
            Value::Bool(_) => JsonKind::Boolean,
            Value::Number(_) => JsonKind::Number,
            Value::String(_) => JsonKind::String,
            Value::Array(_) => JsonKind::Array,
            Value::Object(_) => JsonKind::Object,
        }
    }
}

impl fmt::Display for JsonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JsonKind::Null => "null",
            JsonKind::Boolean => "boolean",
            JsonKind::Number => "number",
            JsonKind::String => "string",
            JsonKind::Array => "array",
            JsonKind::Object => "object",
        };
        f.write_str(name)
    }
}

/// Schema of a `SyncRequest` envelope.
pub fn sync_request_schema() -> Schema {
    let fragment = Schema::object([
        ("documentId", Schema::String),
        ("timestamp", Schema::String),
        ("table", Schema::String),
        ("row", Schema::String),
        ("column", Schema::String),
        ("value", Schema::Any),
    ]);

    Schema::object([
        ("nodeId", Schema::String),
        ("fragments", Schema::array(fragment)),
        ("merkle", Schema::Any),
    ])
}

/// Schema of a `ProvisionRequest`.
pub fn provision_request_schema() -> Schema {
    Schema::object([
        ("documentId", Schema::NonEmptyString),
        ("password", Schema::String),
    ])
}
