//! Recursive-descent parser producing [`super::ast::Stmt`]/[`super::ast::Expr`]
//! trees from the token stream in [`super::lexer`].

use indexmap::IndexMap;

use super::ast::{BinOp, Expr, Stmt, UnaryOp};
use super::lexer::{LexError, Token, tokenize};
use super::value::Value;

/// Errors parsing configuration source into the fixed AST.
#[derive(Debug, Clone, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum ParseError {
    /// Tokenizing failed before parsing could start.
    #[display("{_0}")]
    Lex(LexError),
    /// The parser expected one thing and found another.
    #[display("expected {expected}, found {found:?}")]
    #[from(skip)]
    Unexpected {
        /// A human-readable description of what was expected.
        expected: &'static str,
        /// The token actually found.
        found: Token,
    },
    /// A dict literal's key was not a string literal.
    #[display("dict keys must be string literals")]
    #[from(skip)]
    NonLiteralDictKey,
}

/// Parses a complete configuration script into its top-level statements.
pub fn parse_program(source: &str) -> Result<Vec<Stmt>, ParseError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    parser.program()
}

/// Parses a single standalone expression (used by the check engine to
/// evaluate one user assertion at a time).
pub fn parse_expr_str(source: &str) -> Result<Expr, ParseError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.expr()?;
    parser.skip_newlines();
    parser.expect_eof()?;
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens.get(self.pos).cloned().unwrap_or(Token::Eof);
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek(), Token::Newline) {
            self.pos += 1;
        }
    }

    fn expect_eof(&self) -> Result<(), ParseError> {
        if matches!(self.peek(), Token::Eof) {
            Ok(())
        } else {
            Err(ParseError::Unexpected {
                expected: "end of input",
                found: self.peek().clone(),
            })
        }
    }

    fn eat(&mut self, expected: &Token, what: &'static str) -> Result<(), ParseError> {
        if self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::Unexpected {
                expected: what,
                found: self.peek().clone(),
            })
        }
    }

    fn program(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut stmts = Vec::new();
        self.skip_newlines();
        while !matches!(self.peek(), Token::Eof) {
            stmts.push(self.stmt()?);
            self.skip_newlines();
        }
        Ok(stmts)
    }

    fn stmt(&mut self) -> Result<Stmt, ParseError> {
        if let Token::Ident(name) = self.peek().clone() {
            if self.tokens.get(self.pos + 1) == Some(&Token::Assign) {
                self.advance();
                self.advance();
                let value = self.expr()?;
                return Ok(Stmt::Assign { name, value });
            }
        }
        Ok(Stmt::Expr(self.expr()?))
    }

    fn expr(&mut self) -> Result<Expr, ParseError> {
        self.or_expr()
    }

    fn or_expr(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.and_expr()?;
        while matches!(self.peek(), Token::Or) {
            self.advance();
            let rhs = self.and_expr()?;
            lhs = Expr::BinOp {
                op: BinOp::Or,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.not_expr()?;
        while matches!(self.peek(), Token::And) {
            self.advance();
            let rhs = self.not_expr()?;
            lhs = Expr::BinOp {
                op: BinOp::And,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn not_expr(&mut self) -> Result<Expr, ParseError> {
        if matches!(self.peek(), Token::Not) {
            self.advance();
            let inner = self.not_expr()?;
            return Ok(Expr::UnaryOp {
                op: UnaryOp::Not,
                expr: Box::new(inner),
            });
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.unary()?;
        let op = match self.peek() {
            Token::Eq => BinOp::Eq,
            Token::NotEq => BinOp::NotEq,
            Token::Lt => BinOp::Lt,
            Token::Le => BinOp::Le,
            Token::Gt => BinOp::Gt,
            Token::Ge => BinOp::Ge,
            Token::In => BinOp::In,
            _ => return Ok(lhs),
        };
        self.advance();
        let rhs = self.unary()?;
        Ok(Expr::BinOp {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        if matches!(self.peek(), Token::Minus) {
            self.advance();
            let inner = self.unary()?;
            return Ok(Expr::UnaryOp {
                op: UnaryOp::Neg,
                expr: Box::new(inner),
            });
        }
        self.postfix()
    }

    fn postfix(&mut self) -> Result<Expr, ParseError> {
        let mut base = self.primary()?;
        loop {
            match self.peek() {
                Token::Dot => {
                    self.advance();
                    let Token::Ident(name) = self.advance() else {
                        return Err(ParseError::Unexpected {
                            expected: "attribute name",
                            found: self.peek().clone(),
                        });
                    };
                    base = Expr::Attr {
                        base: Box::new(base),
                        name,
                    };
                }
                Token::LParen => {
                    self.advance();
                    let (args, kwargs) = self.call_args()?;
                    base = Expr::Call {
                        callee: Box::new(base),
                        args,
                        kwargs,
                    };
                }
                _ => break,
            }
        }
        Ok(base)
    }

    #[allow(clippy::type_complexity)]
    fn call_args(&mut self) -> Result<(Vec<Expr>, Vec<(String, Expr)>), ParseError> {
        let mut args = Vec::new();
        let mut kwargs = Vec::new();
        self.skip_newlines();
        while !matches!(self.peek(), Token::RParen) {
            if let Token::Ident(name) = self.peek().clone() {
                if self.tokens.get(self.pos + 1) == Some(&Token::Assign) {
                    self.advance();
                    self.advance();
                    let value = self.expr()?;
                    kwargs.push((name, value));
                    self.skip_newlines();
                    if matches!(self.peek(), Token::Comma) {
                        self.advance();
                        self.skip_newlines();
                        continue;
                    }
                    break;
                }
            }
            args.push(self.expr()?);
            self.skip_newlines();
            if matches!(self.peek(), Token::Comma) {
                self.advance();
                self.skip_newlines();
                continue;
            }
            break;
        }
        self.skip_newlines();
        self.eat(&Token::RParen, "`)`")?;
        Ok((args, kwargs))
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        match self.advance() {
            Token::None => Ok(Expr::Literal(Value::None)),
            Token::True => Ok(Expr::Literal(Value::Bool(true))),
            Token::False => Ok(Expr::Literal(Value::Bool(false))),
            Token::Int(n) => Ok(Expr::Literal(Value::Int(n))),
            Token::Float(f) => Ok(Expr::Literal(Value::Float(f))),
            Token::Str(s) => Ok(Expr::Literal(Value::Text(s))),
            Token::Ident(name) => Ok(Expr::Ident(name)),
            Token::LParen => {
                self.skip_newlines();
                let inner = self.expr()?;
                self.skip_newlines();
                self.eat(&Token::RParen, "`)`")?;
                Ok(inner)
            }
            Token::LBracket => {
                let mut items = Vec::new();
                self.skip_newlines();
                while !matches!(self.peek(), Token::RBracket) {
                    items.push(self.expr()?);
                    self.skip_newlines();
                    if matches!(self.peek(), Token::Comma) {
                        self.advance();
                        self.skip_newlines();
                        continue;
                    }
                    break;
                }
                self.skip_newlines();
                self.eat(&Token::RBracket, "`]`")?;
                Ok(Expr::List(items))
            }
            Token::LBrace => {
                let mut items = Vec::new();
                self.skip_newlines();
                while !matches!(self.peek(), Token::RBrace) {
                    let key = self.expr()?;
                    self.skip_newlines();
                    self.eat(&Token::Colon, "`:`")?;
                    self.skip_newlines();
                    let value = self.expr()?;
                    items.push((key, value));
                    self.skip_newlines();
                    if matches!(self.peek(), Token::Comma) {
                        self.advance();
                        self.skip_newlines();
                        continue;
                    }
                    break;
                }
                self.skip_newlines();
                self.eat(&Token::RBrace, "`}`")?;
                Ok(Expr::Dict(items))
            }
            other => Err(ParseError::Unexpected {
                expected: "an expression",
                found: other,
            }),
        }
    }
}

/// Validates that every dict-literal key is a string literal, as the
/// grammar requires (§4.4: dicts are `State`/kwargs-shaped, not general
/// maps). Kept separate from parsing so the interpreter can reuse it
/// when materializing nested dict literals.
pub fn dict_literal_keys(items: &[(Expr, Expr)]) -> Result<IndexMap<String, &Expr>, ParseError> {
    let mut out = IndexMap::with_capacity(items.len());
    for (key, value) in items {
        let Expr::Literal(Value::Text(key)) = key else {
            return Err(ParseError::NonLiteralDictKey);
        };
        out.insert(key.clone(), value);
    }
    Ok(out)
}
