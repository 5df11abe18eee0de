//! Campaign `State`: the mutable dict a configuration script seeds and
//! checks/triggers read and write over the life of a campaign (§3 "Campaign
//! State").

use indexmap::IndexMap;

use super::value::Value;

/// Errors validating or mutating campaign state.
#[derive(Debug, Clone, derive_more::Error, derive_more::Display)]
pub enum StateError {
    /// A key was not lowercase-initial printable ASCII (§3).
    #[display("state key {_0:?} must start with a lowercase ASCII letter")]
    InvalidKey(String),
    /// A key contained non-printable-ASCII bytes.
    #[display("state key {_0:?} must be printable ASCII")]
    NonAsciiKey(String),
}

/// The campaign `State` dict: printable-ASCII, lowercase-initial keys
/// mapping to acyclic literal [`Value`]s, deep-copied on ingest so later
/// mutation of the source script's bindings cannot alias into campaign
/// state (§3: "State is deep-copied on ingest").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct State {
    entries: IndexMap<String, Value>,
}

impl State {
    /// Validates and deep-copies `dict` into a fresh [`State`].
    ///
    /// # Errors
    /// Returns [`StateError`] if any key violates the naming invariant.
    pub fn from_dict(dict: &IndexMap<String, Value>) -> Result<Self, StateError> {
        let mut entries = IndexMap::with_capacity(dict.len());
        for (key, value) in dict {
            validate_key(key)?;
            entries.insert(key.clone(), value.clone());
        }
        Ok(Self { entries })
    }

    /// Reads a key's current value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Sets a key's value, validating its name.
    ///
    /// # Errors
    /// Returns [`StateError`] if `key` violates the naming invariant.
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Result<(), StateError> {
        let key = key.into();
        validate_key(&key)?;
        self.entries.insert(key, value);
        Ok(())
    }

    /// Iterates over the current entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Whether state holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn validate_key(key: &str) -> Result<(), StateError> {
    if !key.bytes().all(|b| b.is_ascii_graphic() || b == b' ') {
        return Err(StateError::NonAsciiKey(key.to_string()));
    }
    match key.chars().next() {
        Some(c) if c.is_ascii_lowercase() => Ok(()),
        _ => Err(StateError::InvalidKey(key.to_string())),
    }
}
