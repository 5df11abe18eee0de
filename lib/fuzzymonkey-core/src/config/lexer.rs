//! Hand-rolled tokenizer for the embedded configuration grammar.

/// A lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    None,
    True,
    False,
    And,
    Or,
    Not,
    In,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Dot,
    Assign,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Minus,
    Newline,
    Eof,
}

/// Errors tokenizing configuration source.
#[derive(Debug, Clone, derive_more::Error, derive_more::Display)]
pub enum LexError {
    /// An unterminated string literal.
    #[display("unterminated string literal starting at byte {_0}")]
    UnterminatedString(usize),
    /// A character the grammar has no token for.
    #[display("unexpected character {_0:?} at byte {_1}")]
    UnexpectedChar(char, usize),
    /// A malformed numeric literal.
    #[display("invalid number literal {_0:?}")]
    InvalidNumber(String),
}

/// Tokenizes `source`, collapsing comments (`# ...` to end of line) and
/// blank lines, and folding consecutive newlines into one `Newline` token
/// so the parser can treat it as a plain statement separator.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let bytes = source.as_bytes();
    let mut i = 0;
    let mut tokens = Vec::new();
    let mut pending_newline = false;

    while i < bytes.len() {
        let c = bytes[i] as char;
        match c {
            ' ' | '\t' | '\r' => i += 1,
            '#' => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            '\n' => {
                pending_newline = true;
                i += 1;
            }
            '(' => {
                push_newline(&mut tokens, &mut pending_newline);
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                push_newline(&mut tokens, &mut pending_newline);
                tokens.push(Token::RParen);
                i += 1;
            }
            '[' => {
                push_newline(&mut tokens, &mut pending_newline);
                tokens.push(Token::LBracket);
                i += 1;
            }
            ']' => {
                push_newline(&mut tokens, &mut pending_newline);
                tokens.push(Token::RBracket);
                i += 1;
            }
            '{' => {
                push_newline(&mut tokens, &mut pending_newline);
                tokens.push(Token::LBrace);
                i += 1;
            }
            '}' => {
                push_newline(&mut tokens, &mut pending_newline);
                tokens.push(Token::RBrace);
                i += 1;
            }
            ',' => {
                push_newline(&mut tokens, &mut pending_newline);
                tokens.push(Token::Comma);
                i += 1;
            }
            ':' => {
                push_newline(&mut tokens, &mut pending_newline);
                tokens.push(Token::Colon);
                i += 1;
            }
            '.' => {
                push_newline(&mut tokens, &mut pending_newline);
                tokens.push(Token::Dot);
                i += 1;
            }
            '-' => {
                push_newline(&mut tokens, &mut pending_newline);
                tokens.push(Token::Minus);
                i += 1;
            }
            '=' => {
                push_newline(&mut tokens, &mut pending_newline);
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token::Eq);
                    i += 2;
                } else {
                    tokens.push(Token::Assign);
                    i += 1;
                }
            }
            '!' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    push_newline(&mut tokens, &mut pending_newline);
                    tokens.push(Token::NotEq);
                    i += 2;
                } else {
                    return Err(LexError::UnexpectedChar('!', i));
                }
            }
            '<' => {
                push_newline(&mut tokens, &mut pending_newline);
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token::Le);
                    i += 2;
                } else {
                    tokens.push(Token::Lt);
                    i += 1;
                }
            }
            '>' => {
                push_newline(&mut tokens, &mut pending_newline);
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token::Ge);
                    i += 2;
                } else {
                    tokens.push(Token::Gt);
                    i += 1;
                }
            }
            '"' | '\'' => {
                push_newline(&mut tokens, &mut pending_newline);
                let quote = bytes[i];
                let start = i;
                i += 1;
                let mut s = String::new();
                loop {
                    if i >= bytes.len() {
                        return Err(LexError::UnterminatedString(start));
                    }
                    if bytes[i] == quote {
                        i += 1;
                        break;
                    }
                    if bytes[i] == b'\\' && i + 1 < bytes.len() {
                        let escaped = bytes[i + 1] as char;
                        s.push(match escaped {
                            'n' => '\n',
                            't' => '\t',
                            other => other,
                        });
                        i += 2;
                        continue;
                    }
                    s.push(bytes[i] as char);
                    i += 1;
                }
                tokens.push(Token::Str(s));
            }
            c if c.is_ascii_digit() => {
                push_newline(&mut tokens, &mut pending_newline);
                let start = i;
                let mut is_float = false;
                while i < bytes.len()
                    && (bytes[i].is_ascii_digit() || bytes[i] == b'.' || bytes[i] == b'_')
                {
                    if bytes[i] == b'.' {
                        is_float = true;
                    }
                    i += 1;
                }
                let text: String = source[start..i].chars().filter(|c| *c != '_').collect();
                if is_float {
                    let value = text
                        .parse::<f64>()
                        .map_err(|_| LexError::InvalidNumber(text.clone()))?;
                    tokens.push(Token::Float(value));
                } else {
                    let value = text
                        .parse::<i64>()
                        .map_err(|_| LexError::InvalidNumber(text.clone()))?;
                    tokens.push(Token::Int(value));
                }
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                push_newline(&mut tokens, &mut pending_newline);
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                let word = &source[start..i];
                tokens.push(match word {
                    "None" => Token::None,
                    "True" => Token::True,
                    "False" => Token::False,
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    "in" => Token::In,
                    _ => Token::Ident(word.to_string()),
                });
            }
            other => return Err(LexError::UnexpectedChar(other, i)),
        }
    }
    push_newline(&mut tokens, &mut pending_newline);
    tokens.push(Token::Eof);
    Ok(tokens)
}

fn push_newline(tokens: &mut Vec<Token>, pending: &mut bool) {
    if *pending {
        if !matches!(tokens.last(), None | Some(Token::Newline)) {
            tokens.push(Token::Newline);
        }
        *pending = false;
    }
}
