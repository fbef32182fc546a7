//! Parser for render code.
//!
//! Render code is a single expression:
//!
//! ```text
//! expr  := call | array | string | number | literal | path
//! call  := ident '(' [expr (',' expr)*] ')'
//! array := '[' [expr (',' expr)*] ']'
//! path  := ident ('.' ident)*
//! ```
//!
//! Strings use JSON syntax. `true`, `false`, `null` and `undefined` are
//! literals.

use memchr::memchr2;
use serde_json::{Number, Value};

const MAX_DEPTH: usize = 1024;

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Literal(Value),
    Path(Vec<String>),
    Array(Vec<Expr>),
    Call {
        helper: String,
        args: Vec<Expr>,
        offset: usize,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    pub offset: usize,
    pub message: String,
}

/// Parses a complete piece of render code.
pub fn parse_code(code: &str) -> Result<Expr, ParseError> {
    let mut parser = CodeParser {
        src: code,
        pos: 0,
        depth: 0,
    };
    let expr = parser.expr()?;
    parser.skip_ws();
    if parser.pos != code.len() {
        return Err(parser.error("unexpected token"));
    }
    Ok(expr)
}

struct CodeParser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

impl CodeParser<'_> {
    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        let rest = &self.src[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, b: u8) -> bool {
        self.skip_ws();
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expr(&mut self) -> Result<Expr, ParseError> {
        self.skip_ws();
        if self.depth >= MAX_DEPTH {
            return Err(self.error("expression nested too deeply"));
        }
        self.depth += 1;
        let expr = match self.peek() {
            None => Err(self.error("unexpected end of code")),
            Some(b'"') => self.string().map(|s| Expr::Literal(Value::String(s))),
            Some(b'[') => {
                self.pos += 1;
                self.list(b']').map(Expr::Array)
            }
            Some(b) if b.is_ascii_digit() || b == b'-' => self.number(),
            Some(b) if is_ident_start(b) => self.ident_expr(),
            Some(_) => {
                let ch = self.src[self.pos..].chars().next().unwrap_or_default();
                Err(self.error(format!("unexpected character `{ch}`")))
            }
        };
        self.depth -= 1;
        expr
    }

    /// Comma-separated expressions up to `close`; the opener is consumed.
    fn list(&mut self, close: u8) -> Result<Vec<Expr>, ParseError> {
        let mut items = Vec::new();
        if self.eat(close) {
            return Ok(items);
        }
        loop {
            items.push(self.expr()?);
            if self.eat(close) {
                return Ok(items);
            }
            if !self.eat(b',') {
                return Err(self.error(format!("expected `,` or `{}`", close as char)));
            }
        }
    }

    fn ident(&mut self) -> &str {
        let start = self.pos;
        let len = self.src.as_bytes()[start..]
            .iter()
            .take_while(|b| is_ident_char(**b))
            .count();
        self.pos += len;
        &self.src[start..start + len]
    }

    fn ident_expr(&mut self) -> Result<Expr, ParseError> {
        let offset = self.pos;
        let first = self.ident().to_string();
        if self.eat(b'(') {
            let args = self.list(b')')?;
            return Ok(Expr::Call {
                helper: first,
                args,
                offset,
            });
        }
        match first.as_str() {
            "true" => return Ok(Expr::Literal(Value::Bool(true))),
            "false" => return Ok(Expr::Literal(Value::Bool(false))),
            "null" | "undefined" => return Ok(Expr::Literal(Value::Null)),
            _ => {}
        }
        let mut segments = vec![first];
        while self.peek() == Some(b'.') {
            self.pos += 1;
            if !self.peek().is_some_and(is_ident_start) {
                return Err(self.error("expected property name after `.`"));
            }
            segments.push(self.ident().to_string());
        }
        Ok(Expr::Path(segments))
    }

    fn string(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        let bytes = self.src.as_bytes();
        let mut i = start + 1;
        loop {
            let Some(hit) = memchr2(b'"', b'\\', &bytes[i..]) else {
                return Err(self.error("unterminated string literal"));
            };
            i += hit;
            if bytes[i] == b'\\' {
                i += 2;
                if i > bytes.len() {
                    return Err(self.error("unterminated string literal"));
                }
                continue;
            }
            break;
        }
        let literal = &self.src[start..=i];
        let value = serde_json::from_str::<String>(literal).map_err(|err| ParseError {
            offset: start,
            message: format!("invalid string literal: {err}"),
        })?;
        self.pos = i + 1;
        Ok(value)
    }

    fn number(&mut self) -> Result<Expr, ParseError> {
        let start = self.pos;
        let len = self.src.as_bytes()[start..]
            .iter()
            .take_while(|b| b.is_ascii_digit() || matches!(b, b'-' | b'+' | b'.' | b'e' | b'E'))
            .count();
        let text = &self.src[start..start + len];
        let number = serde_json::from_str::<Number>(text).map_err(|_| ParseError {
            offset: start,
            message: format!("invalid number `{text}`"),
        })?;
        self.pos += len;
        Ok(Expr::Literal(Value::Number(number)))
    }
}
