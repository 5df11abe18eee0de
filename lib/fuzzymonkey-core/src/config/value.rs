use indexmap::IndexMap;

/// A dynamically-typed value inside the configuration sandbox and the
/// campaign `State` (§3 "Campaign State": "none/bool/int/float/string/
/// list/dict/set").
///
/// Kept distinct from [`crate::ir::Literal`] (which models JSON Schema enum
/// members and always round-trips through `serde_json::Value`): script
/// values additionally distinguish `Int`/`Float` and have a `Set` variant,
/// neither of which has a JSON counterpart.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `None`.
    None,
    /// `True`/`False`.
    Bool(bool),
    /// An integer literal.
    Int(i64),
    /// A floating-point literal.
    Float(f64),
    /// A string literal.
    Text(String),
    /// A list literal, order preserved.
    List(Vec<Value>),
    /// A dict literal, insertion order preserved.
    Dict(IndexMap<String, Value>),
    /// A set literal; membership, not order, is meaningful.
    Set(Vec<Value>),
}

impl Value {
    /// Every value constructed from a literal script expression is acyclic
    /// by construction; named as a predicate because the campaign `State`
    /// invariant (§3) calls it out explicitly.
    #[must_use]
    pub fn is_acyclic(&self) -> bool {
        true
    }

    /// A short, stable type name for error messages (`"a string"`, `"a dict"`, …).
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Bool(_) => "a bool",
            Self::Int(_) => "an int",
            Self::Float(_) => "a float",
            Self::Text(_) => "a string",
            Self::List(_) => "a list",
            Self::Dict(_) => "a dict",
            Self::Set(_) => "a set",
        }
    }

    /// Truthiness for `and`/`or`/`not`, following the usual dynamic-language rules.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::None => false,
            Self::Bool(b) => *b,
            Self::Int(n) => *n != 0,
            Self::Float(f) => *f != 0.0,
            Self::Text(s) => !s.is_empty(),
            Self::List(items) | Self::Set(items) => !items.is_empty(),
            Self::Dict(map) => !map.is_empty(),
        }
    }

    /// Extracts a string, if this value is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Set(items) => {
                write!(f, "{{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "}}")
            }
            Self::Dict(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key:?}: {value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}
