//! Recursive descent parser for boolean expressions
use std::fmt;

use crate::error::{CompileError, Result};
use crate::lexer::{Token, TokenKind};

pub const KEYWORDS: [&str; 9] = [
    "and", "or", "not", "nand", "nor", "xor", "xnor", "input", "output",
];

/// Hidden input that fires once when the circuit starts.
pub const INIT_SIGNAL: &str = "_INIT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    And,
    Or,
    Nand,
    Nor,
    Xor,
    Xnor,
}

impl BinaryOp {
    fn from_keyword(word: &str) -> Option<BinaryOp> {
        match word {
            "and" => Some(BinaryOp::And),
            "or" => Some(BinaryOp::Or),
            "nand" => Some(BinaryOp::Nand),
            "nor" => Some(BinaryOp::Nor),
            "xor" => Some(BinaryOp::Xor),
            "xnor" => Some(BinaryOp::Xnor),
            _ => None,
        }
    }

    fn binds_tight(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Nand)
    }

    pub fn apply(self, a: bool, b: bool) -> bool {
        match self {
            BinaryOp::And => a && b,
            BinaryOp::Or => a || b,
            BinaryOp::Nand => !(a && b),
            BinaryOp::Nor => !(a || b),
            BinaryOp::Xor => a != b,
            BinaryOp::Xnor => a == b,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Nand => "nand",
            BinaryOp::Nor => "nor",
            BinaryOp::Xor => "xor",
            BinaryOp::Xnor => "xnor",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Identifier(String),
    Not(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Expr {
        Expr::Identifier(name.into())
    }

    pub fn not(operand: Expr) -> Expr {
        Expr::Not(Box::new(operand))
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary(op, Box::new(left), Box::new(right))
    }

    /// Evaluates the tree, looking identifiers up through `lookup`.
    pub fn evaluate<F>(&self, lookup: &F) -> Result<bool>
    where
        F: Fn(&str) -> Option<bool>,
    {
        match self {
            Expr::Identifier(name) => lookup(name).ok_or_else(|| CompileError::Reference {
                name: name.clone(),
            }),
            Expr::Not(operand) => Ok(!operand.evaluate(lookup)?),
            Expr::Binary(op, left, right) => {
                Ok(op.apply(left.evaluate(lookup)?, right.evaluate(lookup)?))
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Identifier(name) => write!(f, "{}", name),
            Expr::Not(operand) => write!(f, "not {}", operand),
            Expr::Binary(op, left, right) => write!(f, "({} {} {})", left, op.keyword(), right),
        }
    }
}

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

pub fn is_valid_identifier(word: &str) -> bool {
    !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// Checks a user-written name: it must match `[A-Z0-9_]+` and must not be reserved.
pub fn check_identifier(word: &str) -> Result<()> {
    if !is_valid_identifier(word) {
        return Err(CompileError::lexical(
            word,
            "names must contain only uppercase letters, digits and underscores",
        ));
    }
    if word == INIT_SIGNAL {
        return Err(CompileError::lexical(word, "reserved name"));
    }
    Ok(())
}

pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    /// Source text of the statement, for error reporting.
    context: String,
    init_signal: Option<&'a str>,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token], context: impl Into<String>) -> Self {
        Self {
            tokens,
            pos: 0,
            context: context.into(),
            init_signal: None,
        }
    }

    /// Rewrites every `not X` into `not (<signal> or X)`.
    pub fn with_init_signal(mut self, signal: &'a str) -> Self {
        self.init_signal = Some(signal);
        self
    }

    /// Parses the whole token slice as a single expression.
    pub fn parse(mut self) -> Result<Expr> {
        let expr = self.parse_expr()?;
        if let Some(token) = self.peek() {
            return Err(self.error(format!("unexpected token '{}' after expression", token.text)));
        }
        Ok(expr)
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn error(&self, message: impl Into<String>) -> CompileError {
        CompileError::syntax(message, self.context.as_str())
    }

    fn peek_binary(&self, tight: bool) -> Option<BinaryOp> {
        self.peek()
            .and_then(|t| BinaryOp::from_keyword(&t.text))
            .filter(|op| op.binds_tight() == tight)
    }

    // or, nor, xor, xnor
    fn parse_expr(&mut self) -> Result<Expr> {
        let mut left = self.parse_and_level()?;
        while let Some(op) = self.peek_binary(false) {
            self.pos += 1;
            let right = self.parse_and_level()?;
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    // and, nand
    fn parse_and_level(&mut self) -> Result<Expr> {
        let mut left = self.parse_primary()?;
        while let Some(op) = self.peek_binary(true) {
            self.pos += 1;
            let right = self.parse_primary()?;
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let token = self
            .next()
            .ok_or_else(|| self.error("unexpected end of expression"))?;

        if token.is("(") {
            let expr = self.parse_expr()?;
            match self.next() {
                Some(t) if t.is(")") => Ok(expr),
                _ => Err(self.error("expected ')'")),
            }
        } else if token.is("not") {
            let operand = self.parse_primary()?;
            Ok(match self.init_signal {
                Some(signal) => Expr::not(Expr::binary(BinaryOp::Or, Expr::ident(signal), operand)),
                None => Expr::not(operand),
            })
        } else if is_valid_identifier(&token.text) {
            check_identifier(&token.text)?;
            Ok(Expr::ident(token.text.as_str()))
        } else if token.kind != TokenKind::Word || is_keyword(&token.text) {
            Err(self.error(format!("unexpected token '{}'", token.text)))
        } else {
            Err(CompileError::lexical(token.text.as_str(), "unknown token"))
        }
    }
}
