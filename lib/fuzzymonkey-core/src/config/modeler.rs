//! Modeler registry: named constructors a configuration script can call to
//! bind a protocol modeler (§4.4: "ConfigSandbox produces a Modeler bound to
//! SpecNormalizer → SchemaIR → Validator, and a Resetter").

use indexmap::IndexMap;

use super::value::Value;

/// The resetter sub-configuration threaded through any modeler call via its
/// reserved, uppercase-initial keyword arguments (§4.4: "keys beginning with
/// an uppercase letter are reserved for resetter wiring and are not passed
/// to the modeler").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResetterConfig {
    /// Shell command run once before the campaign starts.
    pub exec_start: Option<String>,
    /// Shell command run between test cases to restore SUT state.
    pub exec_reset: Option<String>,
    /// Shell command run once after the campaign ends.
    pub exec_stop: Option<String>,
}

/// A bound, not-yet-resolved modeler: the kind name plus its lowercase
/// (modeler-specific) keyword arguments and resetter wiring.
///
/// Resolving `fields` into an actual [`crate::ir::SchemaIr`] +
/// [`crate::endpoint::EndpointTable`] (e.g. loading and parsing the
/// `file` the `OpenAPIv3` modeler names) happens outside the sandbox —
/// OpenAPI/YAML parsing is explicitly someone else's job (§1 Non-goals).
#[derive(Debug, Clone, PartialEq)]
pub struct Modeler {
    /// The registered constructor name, e.g. `"OpenAPIv3"`.
    pub kind: String,
    /// Lowercase keyword arguments, in call-site order.
    pub fields: IndexMap<String, Value>,
    /// Resetter wiring pulled out of the reserved uppercase keys.
    pub resetter: ResetterConfig,
}

/// Errors constructing a modeler from call-site keyword arguments.
#[derive(Debug, Clone, derive_more::Error, derive_more::Display)]
pub enum ModelerError {
    /// The script named a constructor no modeler is registered under.
    #[display("no modeler registered as {_0:?}")]
    UnknownKind(String),
    /// Modeler constructors accept keyword arguments only (§4.4).
    #[display("{kind} takes keyword arguments only, got {count} positional argument(s)")]
    PositionalArgsRejected {
        /// The modeler kind being constructed.
        kind: String,
        /// How many positional arguments were supplied.
        count: usize,
    },
    /// A reserved key's value was not a string.
    #[display("{key} must be a string")]
    ReservedValueNotString {
        /// The reserved key name, e.g. `"ExecStart"`.
        key: &'static str,
    },
    /// An uppercase-initial key was supplied that isn't one of the fixed
    /// resetter-wiring keys (§4.4: "unknown uppercase-initial keys are an
    /// error naming every offender").
    #[display("unrecognized reserved key(s): {}", _0.join(", "))]
    UnknownReservedKeys(Vec<String>),
}

/// The fixed set of reserved (uppercase-initial) keyword argument names.
const RESERVED_KEYS: &[&str] = &["ExecStart", "ExecReset", "ExecStop"];

/// Returns whether `key` is a reserved resetter-wiring key rather than a
/// modeler-specific field (§4.4: "keys beginning with an uppercase letter").
#[must_use]
pub fn is_reserved_key(key: &str) -> bool {
    key.chars().next().is_some_and(char::is_uppercase)
}

/// A registry of modeler constructors, looked up by name at call time.
///
/// Mirrors the "each modeler type registers itself into a global registry"
/// shape, but since this crate ships exactly one modeler kind today, the
/// registry is a plain allow-list rather than a trait-object table — the
/// shape still leaves room to register more without touching call sites.
#[derive(Debug, Clone)]
pub struct ModelerRegistry {
    known_kinds: Vec<&'static str>,
}

impl Default for ModelerRegistry {
    fn default() -> Self {
        Self {
            known_kinds: vec!["OpenAPIv3"],
        }
    }
}

impl ModelerRegistry {
    /// Constructs a registry with only the built-in `OpenAPIv3` modeler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `kind` names a registered modeler constructor.
    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.known_kinds.contains(&kind)
    }

    /// Instantiates `kind` from call-site positional and keyword arguments.
    ///
    /// # Errors
    /// Returns [`ModelerError::UnknownKind`] if `kind` is not registered,
    /// [`ModelerError::PositionalArgsRejected`] if `args` is non-empty, or
    /// [`ModelerError::ReservedValueNotString`] if a reserved key's value
    /// is not text.
    pub fn construct(
        &self,
        kind: &str,
        args: &[Value],
        kwargs: Vec<(String, Value)>,
    ) -> Result<Modeler, ModelerError> {
        if !self.contains(kind) {
            return Err(ModelerError::UnknownKind(kind.to_string()));
        }
        if !args.is_empty() {
            return Err(ModelerError::PositionalArgsRejected {
                kind: kind.to_string(),
                count: args.len(),
            });
        }

        let mut fields = IndexMap::with_capacity(kwargs.len());
        let mut resetter = ResetterConfig::default();
        let mut unknown_reserved = Vec::new();
        for (key, value) in kwargs {
            if is_reserved_key(&key) {
                let Some(&known) = RESERVED_KEYS.iter().find(|&&known| known == key) else {
                    unknown_reserved.push(key);
                    continue;
                };
                let text = value
                    .as_text()
                    .ok_or(ModelerError::ReservedValueNotString { key: known })?
                    .to_string();
                match known {
                    "ExecStart" => resetter.exec_start = Some(text),
                    "ExecReset" => resetter.exec_reset = Some(text),
                    "ExecStop" => resetter.exec_stop = Some(text),
                    _ => unreachable!("known is one of RESERVED_KEYS"),
                }
            } else {
                fields.insert(key, value);
            }
        }

        if !unknown_reserved.is_empty() {
            return Err(ModelerError::UnknownReservedKeys(unknown_reserved));
        }

        Ok(Modeler {
            kind: kind.to_string(),
            fields,
            resetter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_keys_bind_resetter_hooks() {
        let registry = ModelerRegistry::new();
        let modeler = registry
            .construct(
                "OpenAPIv3",
                &[],
                vec![("ExecReset".to_string(), Value::Text("echo reset".to_string()))],
            )
            .expect("valid construction");
        assert_eq!(modeler.resetter.exec_reset.as_deref(), Some("echo reset"));
    }

    #[test]
    fn unknown_uppercase_key_is_rejected_by_name() {
        let registry = ModelerRegistry::new();
        let err = registry
            .construct(
                "OpenAPIv3",
                &[],
                vec![("ExecFoo".to_string(), Value::Text("nope".to_string()))],
            )
            .unwrap_err();
        assert!(matches!(err, ModelerError::UnknownReservedKeys(keys) if keys == vec!["ExecFoo".to_string()]));
    }

    #[test]
    fn every_unknown_uppercase_key_is_named() {
        let registry = ModelerRegistry::new();
        let err = registry
            .construct(
                "OpenAPIv3",
                &[],
                vec![
                    ("ExecFoo".to_string(), Value::Text("a".to_string())),
                    ("ExecBar".to_string(), Value::Text("b".to_string())),
                ],
            )
            .unwrap_err();
        let ModelerError::UnknownReservedKeys(keys) = err else {
            panic!("expected UnknownReservedKeys, got {err:?}");
        };
        assert_eq!(keys, vec!["ExecFoo".to_string(), "ExecBar".to_string()]);
    }

    #[test]
    fn lowercase_keys_are_treated_as_modeler_fields() {
        let registry = ModelerRegistry::new();
        let modeler = registry
            .construct(
                "OpenAPIv3",
                &[],
                vec![("host".to_string(), Value::Text("http://x".to_string()))],
            )
            .expect("valid construction");
        assert!(modeler.fields.contains_key("host"));
    }
}
