//! The fixed, enumerated expression grammar shared by the configuration
//! sandbox and the check engine (§9 design notes: "re-expressed as an
//! embedded interpreter over a fixed, enumerated AST").

use super::value::Value;

/// A binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `and`
    And,
    /// `or`
    Or,
    /// `in`
    In,
}

/// A unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `not`
    Not,
    /// unary `-`
    Neg,
}

/// An expression node. Every variant here is exhaustively handled by the
/// tree-walk evaluator in [`super::interpreter`]; there is no escape hatch
/// to arbitrary host code.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal value (`None`, `True`, `42`, `"x"`, …).
    Literal(Value),
    /// A bare identifier reference.
    Ident(String),
    /// `base.name` attribute access.
    Attr {
        /// The object expression being accessed.
        base: Box<Expr>,
        /// The attribute name.
        name: String,
    },
    /// `callee(args..., kw=expr...)`.
    Call {
        /// The callee expression (usually an [`Expr::Ident`] or [`Expr::Attr`]).
        callee: Box<Expr>,
        /// Positional arguments, in call-site order.
        args: Vec<Expr>,
        /// Keyword arguments, in call-site order.
        kwargs: Vec<(String, Expr)>,
    },
    /// A `[a, b, c]` list literal.
    List(Vec<Expr>),
    /// A `{"k": v, ...}` dict literal (keys are string-literal expressions).
    Dict(Vec<(Expr, Expr)>),
    /// A binary operator expression.
    BinOp {
        /// The operator.
        op: BinOp,
        /// Left-hand operand.
        lhs: Box<Expr>,
        /// Right-hand operand.
        rhs: Box<Expr>,
    },
    /// A unary operator expression.
    UnaryOp {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        expr: Box<Expr>,
    },
}

/// A top-level statement. The grammar intentionally has no `def`, `if`, or
/// `for`: configuration scripts are a flat sequence of bindings and bare
/// builtin calls (§4.4).
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `name = expr`.
    Assign {
        /// The bound name.
        name: String,
        /// The value expression.
        value: Expr,
    },
    /// A bare expression statement, e.g. a builtin call made for effect.
    Expr(Expr),
}
