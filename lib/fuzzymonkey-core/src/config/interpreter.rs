//! Tree-walk evaluator for the configuration sandbox's fixed AST (§4.4).

use indexmap::IndexMap;

use super::ast::{BinOp, Expr, Stmt, UnaryOp};
use super::modeler::{Modeler, ModelerRegistry};
use super::value::Value;

/// A reactive rule registered by `TriggerActionAfterProbe` (§4.4: "Registers
/// a reactive rule; name defaults to the action function's name").
///
/// `predicate` and `action` are carried as opaque identifiers rather than
/// callables: the grammar has no function-definition form, so both are
/// references the runtime resolves against its own fixed menu of probes,
/// predicates, and actions rather than user-authored bodies.
#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    /// The trigger's name (defaults to the action name when not given explicitly).
    pub name: String,
    /// Which probe this trigger watches.
    pub probe: String,
    /// The predicate identifier gating the action.
    pub predicate: String,
    /// The action identifier run when the predicate holds.
    pub action: String,
}

/// Errors evaluating a parsed script against the sandbox's builtins.
#[derive(Debug, Clone, derive_more::Error, derive_more::Display)]
pub enum EvalError {
    /// An identifier with no binding was referenced.
    #[display("undefined name {_0:?}")]
    UndefinedName(String),
    /// A call target was neither a builtin nor a registered modeler.
    #[display("{_0:?} is not callable")]
    NotCallable(String),
    /// `Env` was called with the wrong argument shape.
    #[display("Env() takes a name and an optional default, both strings")]
    BadEnvCall,
    /// `TriggerActionAfterProbe` was called with a missing required keyword.
    #[display("TriggerActionAfterProbe() is missing the {_0:?} keyword argument")]
    MissingTriggerArg(&'static str),
    /// A keyword argument to a builtin had the wrong type.
    #[display("{call}'s {keyword:?} argument must be {expected}")]
    BadArgType {
        /// The builtin or modeler being called.
        call: &'static str,
        /// The offending keyword.
        keyword: &'static str,
        /// What type was actually expected.
        expected: &'static str,
    },
    /// Attribute access on a value that is not a dict.
    #[display("{_0} has no attributes")]
    NotAnObject(&'static str),
    /// Attribute access named a key the dict doesn't have.
    #[display("no attribute {_0:?}")]
    NoSuchAttr(String),
    /// A binary/unary operator was applied to incompatible operand types.
    #[display("cannot apply {op} to {lhs} and {rhs}")]
    BadOperands {
        /// The operator, rendered for diagnostics.
        op: &'static str,
        /// The left operand's type name.
        lhs: &'static str,
        /// The right operand's type name.
        rhs: &'static str,
    },
    /// A modeler constructor call failed.
    #[display("{_0}")]
    Modeler(super::modeler::ModelerError),
}

impl From<super::modeler::ModelerError> for EvalError {
    fn from(err: super::modeler::ModelerError) -> Self {
        Self::Modeler(err)
    }
}

/// One binding a global name can hold. Plain [`Value`]s and constructed
/// [`Modeler`]s are both first-class so `api = OpenAPIv3(...)` can be
/// re-read later in the script (e.g. for a diagnostic print an author adds
/// temporarily); nothing downstream needs that, so [`Modeler`] bindings are
/// opaque to further attribute access.
#[derive(Debug, Clone, PartialEq)]
enum Binding {
    Value(Value),
    Modeler(Modeler),
}

/// Everything a configuration script produced, ready for the runtime to
/// consume (§4.4 "Data flow").
#[derive(Debug, Clone, Default)]
pub struct ScriptOutput {
    /// Every modeler the script constructed, in call order.
    pub modelers: Vec<Modeler>,
    /// Every trigger the script registered, in registration order.
    pub triggers: Vec<Trigger>,
    /// The `State` dict, if the script bound one.
    pub state: IndexMap<String, Value>,
    /// Every other top-level binding, excluding the builtins `Env` and
    /// `TriggerActionAfterProbe` and the `State` dict itself.
    pub exports: IndexMap<String, Value>,
    /// Every environment variable name the script read via `Env(...)`.
    pub env_reads: Vec<String>,
}

/// Evaluates a parsed program, dispatching `Env`/`TriggerActionAfterProbe`/
/// modeler calls against `registry` and resolving `Env(...)` defaults
/// against `env_lookup`.
pub fn run(
    stmts: &[Stmt],
    registry: &ModelerRegistry,
    env_lookup: impl Fn(&str) -> Option<String>,
) -> Result<ScriptOutput, EvalError> {
    let mut globals: IndexMap<String, Binding> = IndexMap::new();
    let mut output = ScriptOutput::default();

    for stmt in stmts {
        match stmt {
            Stmt::Assign { name, value } => {
                let binding = eval_to_binding(value, &globals, registry, &env_lookup, &mut output)?;
                globals.insert(name.clone(), binding);
            }
            Stmt::Expr(expr) => {
                eval_to_binding(expr, &globals, registry, &env_lookup, &mut output)?;
            }
        }
    }

    for (name, binding) in globals {
        match binding {
            Binding::Modeler(modeler) => output.modelers.push(modeler),
            Binding::Value(value) => {
                if name == "State" {
                    if let Value::Dict(dict) = value {
                        output.state = dict;
                    }
                } else {
                    output.exports.insert(name, value);
                }
            }
        }
    }

    Ok(output)
}

fn eval_to_binding(
    expr: &Expr,
    globals: &IndexMap<String, Binding>,
    registry: &ModelerRegistry,
    env_lookup: &impl Fn(&str) -> Option<String>,
    output: &mut ScriptOutput,
) -> Result<Binding, EvalError> {
    if let Expr::Call { callee, args, kwargs } = expr {
        if let Expr::Ident(name) = callee.as_ref() {
            if registry.contains(name) {
                let args = eval_args(args, globals, registry, env_lookup, output)?;
                let kwargs = eval_kwargs(kwargs, globals, registry, env_lookup, output)?;
                let modeler = registry.construct(name, &args, kwargs)?;
                return Ok(Binding::Modeler(modeler));
            }
        }
    }
    eval_value(expr, globals, registry, env_lookup, output).map(Binding::Value)
}

#[allow(clippy::too_many_lines)]
fn eval_value(
    expr: &Expr,
    globals: &IndexMap<String, Binding>,
    registry: &ModelerRegistry,
    env_lookup: &impl Fn(&str) -> Option<String>,
    output: &mut ScriptOutput,
) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Ident(name) => match globals.get(name) {
            Some(Binding::Value(value)) => Ok(value.clone()),
            Some(Binding::Modeler(_)) => Err(EvalError::NotAnObject("a modeler")),
            None => Err(EvalError::UndefinedName(name.clone())),
        },
        Expr::Attr { base, name } => {
            let base = eval_value(base, globals, registry, env_lookup, output)?;
            match base {
                Value::Dict(dict) => dict
                    .get(name)
                    .cloned()
                    .ok_or_else(|| EvalError::NoSuchAttr(name.clone())),
                other => Err(EvalError::NotAnObject(other.type_name())),
            }
        }
        Expr::List(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(eval_value(item, globals, registry, env_lookup, output)?);
            }
            Ok(Value::List(out))
        }
        Expr::Dict(items) => {
            let mut out = IndexMap::with_capacity(items.len());
            for (key, value) in items {
                let Expr::Literal(Value::Text(key)) = key else {
                    return Err(EvalError::BadArgType {
                        call: "a dict literal",
                        keyword: "<key>",
                        expected: "a string literal",
                    });
                };
                out.insert(key.clone(), eval_value(value, globals, registry, env_lookup, output)?);
            }
            Ok(Value::Dict(out))
        }
        Expr::UnaryOp { op, expr } => {
            let value = eval_value(expr, globals, registry, env_lookup, output)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
                UnaryOp::Neg => match value {
                    Value::Int(n) => Ok(Value::Int(-n)),
                    Value::Float(f) => Ok(Value::Float(-f)),
                    other => Err(EvalError::BadOperands {
                        op: "unary -",
                        lhs: other.type_name(),
                        rhs: other.type_name(),
                    }),
                },
            }
        }
        Expr::BinOp { op, lhs, rhs } => {
            eval_binop(*op, lhs, rhs, globals, registry, env_lookup, output)
        }
        Expr::Call { callee, args, kwargs } => {
            eval_call(callee, args, kwargs, globals, registry, env_lookup, output)
        }
    }
}

fn eval_binop(
    op: BinOp,
    lhs: &Expr,
    rhs: &Expr,
    globals: &IndexMap<String, Binding>,
    registry: &ModelerRegistry,
    env_lookup: &impl Fn(&str) -> Option<String>,
    output: &mut ScriptOutput,
) -> Result<Value, EvalError> {
    if op == BinOp::And {
        let lhs = eval_value(lhs, globals, registry, env_lookup, output)?;
        if !lhs.is_truthy() {
            return Ok(lhs);
        }
        return eval_value(rhs, globals, registry, env_lookup, output);
    }
    if op == BinOp::Or {
        let lhs = eval_value(lhs, globals, registry, env_lookup, output)?;
        if lhs.is_truthy() {
            return Ok(lhs);
        }
        return eval_value(rhs, globals, registry, env_lookup, output);
    }

    let lhs = eval_value(lhs, globals, registry, env_lookup, output)?;
    let rhs = eval_value(rhs, globals, registry, env_lookup, output)?;
    match op {
        BinOp::Eq => Ok(Value::Bool(lhs == rhs)),
        BinOp::NotEq => Ok(Value::Bool(lhs != rhs)),
        BinOp::In => match &rhs {
            Value::List(items) | Value::Set(items) => Ok(Value::Bool(items.contains(&lhs))),
            Value::Dict(dict) => match &lhs {
                Value::Text(key) => Ok(Value::Bool(dict.contains_key(key))),
                other => Err(EvalError::BadOperands {
                    op: "in",
                    lhs: other.type_name(),
                    rhs: rhs.type_name(),
                }),
            },
            other => Err(EvalError::BadOperands {
                op: "in",
                lhs: lhs.type_name(),
                rhs: other.type_name(),
            }),
        },
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => compare_ordered(op, &lhs, &rhs),
        BinOp::And | BinOp::Or => unreachable!("handled above with short-circuit"),
    }
}

fn compare_ordered(op: BinOp, lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
    let ordering = match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
        (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
        (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
        (Value::Text(a), Value::Text(b)) => a.partial_cmp(b),
        _ => {
            return Err(EvalError::BadOperands {
                op: "a comparison operator",
                lhs: lhs.type_name(),
                rhs: rhs.type_name(),
            });
        }
    };
    let Some(ordering) = ordering else {
        return Err(EvalError::BadOperands {
            op: "a comparison operator",
            lhs: lhs.type_name(),
            rhs: rhs.type_name(),
        });
    };
    let result = match op {
        BinOp::Lt => ordering.is_lt(),
        BinOp::Le => ordering.is_le(),
        BinOp::Gt => ordering.is_gt(),
        BinOp::Ge => ordering.is_ge(),
        _ => unreachable!("only ordering operators reach here"),
    };
    Ok(Value::Bool(result))
}

fn eval_args(
    args: &[Expr],
    globals: &IndexMap<String, Binding>,
    registry: &ModelerRegistry,
    env_lookup: &impl Fn(&str) -> Option<String>,
    output: &mut ScriptOutput,
) -> Result<Vec<Value>, EvalError> {
    args.iter()
        .map(|arg| eval_value(arg, globals, registry, env_lookup, output))
        .collect()
}

fn eval_kwargs(
    kwargs: &[(String, Expr)],
    globals: &IndexMap<String, Binding>,
    registry: &ModelerRegistry,
    env_lookup: &impl Fn(&str) -> Option<String>,
    output: &mut ScriptOutput,
) -> Result<Vec<(String, Value)>, EvalError> {
    kwargs
        .iter()
        .map(|(key, value)| {
            Ok((
                key.clone(),
                eval_value(value, globals, registry, env_lookup, output)?,
            ))
        })
        .collect()
}

fn eval_call(
    callee: &Expr,
    args: &[Expr],
    kwargs: &[(String, Expr)],
    globals: &IndexMap<String, Binding>,
    registry: &ModelerRegistry,
    env_lookup: &impl Fn(&str) -> Option<String>,
    output: &mut ScriptOutput,
) -> Result<Value, EvalError> {
    let Expr::Ident(name) = callee else {
        return Err(EvalError::NotCallable("<non-identifier callee>".to_string()));
    };

    match name.as_str() {
        "Env" => {
            let args = eval_args(args, globals, registry, env_lookup, output)?;
            let kwargs = eval_kwargs(kwargs, globals, registry, env_lookup, output)?;
            eval_env_call(&args, &kwargs, env_lookup, output)
        }
        "TriggerActionAfterProbe" => {
            let kwargs = eval_kwargs(kwargs, globals, registry, env_lookup, output)?;
            eval_trigger_call(&kwargs, output)?;
            Ok(Value::None)
        }
        other if registry.contains(other) => Err(EvalError::NotCallable(format!(
            "{other} is a modeler constructor and cannot be used as a value"
        ))),
        other => Err(EvalError::UndefinedName(other.to_string())),
    }
}

fn eval_env_call(
    args: &[Value],
    kwargs: &[(String, Value)],
    env_lookup: &impl Fn(&str) -> Option<String>,
    output: &mut ScriptOutput,
) -> Result<Value, EvalError> {
    let mut positional = args.iter();
    let name = positional
        .next()
        .and_then(Value::as_text)
        .ok_or(EvalError::BadEnvCall)?
        .to_string();
    let mut default = positional.next().cloned();
    for (key, value) in kwargs {
        match key.as_str() {
            "default" => default = Some(value.clone()),
            "name" => {}
            _ => {}
        }
    }
    output.env_reads.push(name.clone());
    match env_lookup(&name) {
        Some(found) => Ok(Value::Text(found)),
        None => Ok(default.unwrap_or(Value::None)),
    }
}

fn eval_trigger_call(
    kwargs: &[(String, Value)],
    output: &mut ScriptOutput,
) -> Result<(), EvalError> {
    let mut probe = None;
    let mut predicate = None;
    let mut action = None;
    let mut name = None;
    for (key, value) in kwargs {
        let text = value.as_text().map(str::to_string);
        match key.as_str() {
            "probe" => probe = text,
            "predicate" => predicate = text,
            "action" => action = text,
            "name" => name = text,
            _ => {}
        }
    }
    let probe = probe.ok_or(EvalError::MissingTriggerArg("probe"))?;
    let predicate = predicate.ok_or(EvalError::MissingTriggerArg("predicate"))?;
    let action = action.ok_or(EvalError::MissingTriggerArg("action"))?;
    let name = name.unwrap_or_else(|| action.clone());
    output.triggers.push(Trigger {
        name,
        probe,
        predicate,
        action,
    });
    Ok(())
}
