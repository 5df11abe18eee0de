//! Embedded user-configuration sandbox (§4.4 "ConfigSandbox").
//!
//! A configuration script is a flat sequence of top-level bindings and
//! builtin calls evaluated by a small tree-walk interpreter over a fixed,
//! enumerated expression grammar — never the host's own scripting language,
//! and never able to reach arbitrary Rust code (§9 design notes).

mod ast;
mod interpreter;
mod lexer;
mod modeler;
mod parser;
mod state;
mod value;

pub use interpreter::{ScriptOutput, Trigger};
pub use modeler::{Modeler, ModelerRegistry, ResetterConfig, is_reserved_key};
pub use state::{State, StateError};
pub use value::Value;

use std::env;

use tracing::{debug, info};

/// Errors loading, parsing, or evaluating a configuration script.
#[derive(Debug, Clone, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum ConfigError {
    /// The script failed to parse.
    #[display("{_0}")]
    Parse(parser::ParseError),
    /// The script failed to evaluate against the sandbox's builtins.
    #[display("{_0}")]
    Eval(interpreter::EvalError),
    /// Campaign `State` violated its naming invariant.
    #[display("{_0}")]
    State(StateError),
    /// The script bound no modeler at all.
    #[display("configuration script must construct at least one modeler")]
    #[from(skip)]
    NoModelerConstructed,
    /// An exported top-level name was not lowercase-initial printable ASCII.
    #[display("exported name {_0:?} must start with a lowercase ASCII letter")]
    #[from(skip)]
    InvalidExportName(String),
}

/// The fully-evaluated result of loading a configuration script: one or
/// more bound modelers, the seeded campaign state, registered triggers, and
/// every other top-level export (§4.4 "Data flow").
#[derive(Debug, Clone)]
pub struct Sandbox {
    /// Modelers constructed by the script, in call order.
    pub modelers: Vec<Modeler>,
    /// Reactive rules registered via `TriggerActionAfterProbe`.
    pub triggers: Vec<Trigger>,
    /// The seeded campaign `State`, if the script bound one.
    pub state: State,
    /// Every other top-level export the script produced.
    pub exports: indexmap::IndexMap<String, Value>,
    /// Every environment variable name the script read via `Env(...)`.
    pub env_reads: Vec<String>,
}

/// Loads, parses, and evaluates a configuration script.
///
/// Reads environment variables for `Env(...)` calls through the real
/// process environment (`std::env::var`); tests inject a stub lookup via
/// [`load_with_env`].
///
/// # Errors
/// Returns [`ConfigError`] on a parse failure, an evaluation failure, an
/// invalid `State` key, a script that constructs no modeler, or an export
/// name that is not lowercase-initial printable ASCII.
pub fn load(source: &str) -> Result<Sandbox, ConfigError> {
    load_with_env(source, |name| env::var(name).ok())
}

/// Same as [`load`], but resolves `Env(...)` lookups through `env_lookup`
/// instead of the real process environment.
pub fn load_with_env(
    source: &str,
    env_lookup: impl Fn(&str) -> Option<String>,
) -> Result<Sandbox, ConfigError> {
    let stmts = parser::parse_program(source)?;
    debug!(statements = stmts.len(), "parsed configuration script");

    let registry = ModelerRegistry::new();
    let output = interpreter::run(&stmts, &registry, env_lookup)?;

    if output.modelers.is_empty() {
        return Err(ConfigError::NoModelerConstructed);
    }
    for name in output.exports.keys() {
        if !is_valid_export_name(name) {
            return Err(ConfigError::InvalidExportName(name.clone()));
        }
    }

    let state = State::from_dict(&output.state)?;
    info!(
        modelers = output.modelers.len(),
        triggers = output.triggers.len(),
        exports = output.exports.len(),
        "configuration script evaluated"
    );

    Ok(Sandbox {
        modelers: output.modelers,
        triggers: output.triggers,
        state,
        exports: output.exports,
        env_reads: output.env_reads,
    })
}

fn is_valid_export_name(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_script_binds_one_modeler() {
        let sandbox = load_with_env(
            r#"
api = OpenAPIv3(
    file = "openapi.yml",
    ExecStart = "docker compose up -d",
)
"#,
            |_| None,
        )
        .expect("valid script");
        assert_eq!(sandbox.modelers.len(), 1);
        assert_eq!(sandbox.modelers[0].kind, "OpenAPIv3");
        assert_eq!(
            sandbox.modelers[0].resetter.exec_start.as_deref(),
            Some("docker compose up -d")
        );
    }

    #[test]
    fn script_without_a_modeler_is_rejected() {
        let err = load_with_env("x = 1", |_| None).unwrap_err();
        assert!(matches!(err, ConfigError::NoModelerConstructed));
    }

    #[test]
    fn env_call_prefers_process_value_over_default() {
        let sandbox = load_with_env(
            r#"
host = Env("HOST", "http://localhost:3000")
api = OpenAPIv3(file = "openapi.yml", host = host)
"#,
            |name| (name == "HOST").then(|| "http://sut:8080".to_string()),
        )
        .expect("valid script");
        assert_eq!(
            sandbox.exports.get("host"),
            Some(&Value::Text("http://sut:8080".to_string()))
        );
        assert_eq!(sandbox.env_reads, vec!["HOST".to_string()]);
    }

    #[test]
    fn env_call_falls_back_to_default_when_unset() {
        let sandbox = load_with_env(
            r#"
host = Env("HOST", "http://localhost:3000")
api = OpenAPIv3(file = "openapi.yml", host = host)
"#,
            |_| None,
        )
        .expect("valid script");
        assert_eq!(
            sandbox.exports.get("host"),
            Some(&Value::Text("http://localhost:3000".to_string()))
        );
    }

    #[test]
    fn state_dict_is_captured_separately_from_exports() {
        let sandbox = load_with_env(
            r#"
api = OpenAPIv3(file = "openapi.yml")
State = {
    "counter": 0,
    "seen": [],
}
"#,
            |_| None,
        )
        .expect("valid script");
        assert!(!sandbox.exports.contains_key("State"));
        assert_eq!(sandbox.state.get("counter"), Some(&Value::Int(0)));
    }

    #[test]
    fn trigger_registers_with_explicit_name() {
        let sandbox = load_with_env(
            r#"
api = OpenAPIv3(file = "openapi.yml")
TriggerActionAfterProbe(
    name = "retry_on_conflict",
    probe = "create_pet",
    predicate = "status_is_409",
    action = "retry_create_pet",
)
"#,
            |_| None,
        )
        .expect("valid script");
        assert_eq!(sandbox.triggers.len(), 1);
        assert_eq!(sandbox.triggers[0].name, "retry_on_conflict");
    }

    #[test]
    fn trigger_name_defaults_to_action() {
        let sandbox = load_with_env(
            r#"
api = OpenAPIv3(file = "openapi.yml")
TriggerActionAfterProbe(probe = "create_pet", predicate = "status_is_409", action = "retry_create_pet")
"#,
            |_| None,
        )
        .expect("valid script");
        assert_eq!(sandbox.triggers[0].name, "retry_create_pet");
    }

    #[test]
    fn modeler_rejects_positional_arguments() {
        let err = load_with_env(r#"api = OpenAPIv3("openapi.yml")"#, |_| None).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Eval(interpreter::EvalError::Modeler(
                modeler::ModelerError::PositionalArgsRejected { .. }
            ))
        ));
    }

    #[test]
    fn unknown_modeler_kind_is_rejected() {
        let err = load_with_env(r#"api = NotARealModeler(file = "x")"#, |_| None).unwrap_err();
        assert!(matches!(err, ConfigError::Eval(interpreter::EvalError::UndefinedName(_))));
    }

    #[test]
    fn uppercase_export_name_is_rejected() {
        let err = load_with_env(
            r#"
api = OpenAPIv3(file = "openapi.yml")
Helper = 1
"#,
            |_| None,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidExportName(_)));
    }
}
