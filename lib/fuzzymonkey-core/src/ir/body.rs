use indexmap::IndexSet;
use std::collections::BTreeMap;

use super::sid::Sid;

/// A tagged literal value, used for enum members and for campaign-state
/// values (§3 "Campaign State"). Carrying the tag explicitly (rather than
/// relying on `serde_json::Value`'s own discrimination) keeps equality
/// across IR round-trips well-defined even for `null` vs. "absent".
#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub enum Literal {
    /// JSON `null`.
    Null,
    /// JSON boolean.
    Bool(bool),
    /// JSON number, stored as `f64` regardless of int/float source form.
    Number(f64),
    /// JSON string.
    Text(String),
    /// JSON array of literals.
    Array(Vec<Literal>),
    /// JSON object, insertion order preserved (callers sort when determinism matters).
    Object(Vec<(String, Literal)>),
}

impl Literal {
    /// Converts a `serde_json::Value` into a tagged `Literal`.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Self::Text(s.clone()),
            serde_json::Value::Array(a) => Self::Array(a.iter().map(Self::from_json).collect()),
            serde_json::Value::Object(o) => {
                Self::Object(o.iter().map(|(k, v)| (k.clone(), Self::from_json(v))).collect())
            }
        }
    }

    /// Converts back to a `serde_json::Value`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::Array(a) => serde_json::Value::Array(a.iter().map(Self::to_json).collect()),
            Self::Object(o) => serde_json::Value::Object(
                o.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }

    /// An acyclic literal never contains itself; always true for values built
    /// from JSON, kept as a named predicate because the campaign `State`
    /// invariant (§3) calls it out explicitly.
    #[must_use]
    pub fn is_acyclic(&self) -> bool {
        true
    }
}

/// Format hints recognized specially by the IR; everything else round-trips
/// as an opaque string (§4.2 "unknown formats become NONE" — modeled here as
/// `Other` carrying the original text so structural equality still works,
/// rather than discarding information on an unknown format).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Format {
    /// No format declared.
    #[default]
    None,
    /// `"date-time"`.
    DateTime,
    /// `"uri-reference"` or `"uriref"`.
    UriReference,
    /// Anything else, carried through unchanged.
    Other(String),
}

impl Format {
    /// Maps an OpenAPI `format` string onto the IR's specially-recognized values.
    #[must_use]
    pub fn from_str(value: &str) -> Self {
        match value {
            "date-time" => Self::DateTime,
            "uri-reference" | "uriref" => Self::UriReference,
            "" => Self::None,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Numeric bound with the `exclusive*` discriminator kept alongside the value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericBound {
    /// The bound value.
    pub value: f64,
    /// Whether the bound excludes the value itself.
    pub exclusive: bool,
}

/// A normalized JSON Schema node: the union of draft keywords used by
/// OpenAPI v3 (§3 "Schema body"). Combinators and `items`/`properties`
/// reference children only by [`Sid`] — never inline — so structural
/// equality over a `SchemaBody` is total and cheap.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaBody {
    /// Enumerated literal values, if this schema is an enum.
    pub r#enum: Vec<Literal>,
    /// JSON Schema `type` keyword, multi-valued: `nullable` adds `"null"`.
    pub types: Vec<String>,
    /// Recognized/opaque `format` keyword.
    pub format: Format,
    /// `minLength`.
    pub min_length: Option<u64>,
    /// `maxLength`.
    pub max_length: Option<u64>,
    /// `pattern`.
    pub pattern: Option<String>,
    /// `minimum` (+ `exclusiveMinimum`).
    pub minimum: Option<NumericBound>,
    /// `maximum` (+ `exclusiveMaximum`).
    pub maximum: Option<NumericBound>,
    /// `multipleOf - 1.0`; zero means "unset" (§3).
    pub translated_multiple_of: f64,
    /// `uniqueItems`.
    pub unique_items: bool,
    /// `minItems`.
    pub min_items: Option<u64>,
    /// `maxItems`.
    pub max_items: Option<u64>,
    /// `items`, a list of child SIDs (a singleton common-case item is still
    /// represented as a one-element list, per §4.1 determinism rules).
    pub items: Vec<Sid>,
    /// `minProperties`.
    pub min_properties: Option<u64>,
    /// `maxProperties`.
    pub max_properties: Option<u64>,
    /// `properties`, name-sorted on emission — a `BTreeMap` enforces that
    /// ordering structurally rather than by convention at call sites.
    pub properties: BTreeMap<String, Sid>,
    /// `required` property names.
    pub required: IndexSet<String>,
    /// `additionalProperties`: `None` (unset/default-true), `Some(false)`
    /// (disallowed), or `Some(true)` with a schema SID of `0`/absent meaning
    /// "any value allowed".
    pub additional_properties: Option<AdditionalProperties>,
    /// `allOf` child SIDs.
    pub all_of: Vec<Sid>,
    /// `anyOf` child SIDs.
    pub any_of: Vec<Sid>,
    /// `oneOf` child SIDs.
    pub one_of: Vec<Sid>,
    /// `not` child SID.
    pub not: Option<Sid>,
}

/// `additionalProperties` keyword, which in JSON Schema is either a boolean
/// or a schema.
#[derive(Debug, Clone, PartialEq)]
pub enum AdditionalProperties {
    /// `additionalProperties: false`.
    Forbidden,
    /// `additionalProperties: true` or `additionalProperties: { ... }`.
    Allowed(Option<Sid>),
}

impl SchemaBody {
    /// multipleOf = 1.0 round-trips through translatedMultipleOf = 0.0 without loss (§8).
    #[must_use]
    pub fn multiple_of(&self) -> Option<f64> {
        if self.translated_multiple_of == 0.0 {
            None
        } else {
            Some(self.translated_multiple_of + 1.0)
        }
    }

    /// Sets `multipleOf`, encoding the zero-value convention.
    pub fn set_multiple_of(&mut self, value: f64) {
        self.translated_multiple_of = value - 1.0;
    }
}
