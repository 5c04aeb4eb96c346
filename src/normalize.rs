//! Rewrites derived gates (nand, nor, xor, xnor) into and/or/not
use std::fmt;

use crate::error::{CompileError, Result};
use crate::parser::{BinaryOp, Expr};

/// Expression tree restricted to the gates that exist as physical parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Primitive {
    Identifier(String),
    Not(Box<Primitive>),
    And(Box<Primitive>, Box<Primitive>),
    Or(Box<Primitive>, Box<Primitive>),
}

impl Primitive {
    fn not(operand: Primitive) -> Primitive {
        Primitive::Not(Box::new(operand))
    }

    fn and(left: Primitive, right: Primitive) -> Primitive {
        Primitive::And(Box::new(left), Box::new(right))
    }

    fn or(left: Primitive, right: Primitive) -> Primitive {
        Primitive::Or(Box::new(left), Box::new(right))
    }

    pub fn evaluate<F>(&self, lookup: &F) -> Result<bool>
    where
        F: Fn(&str) -> Option<bool>,
    {
        match self {
            Primitive::Identifier(name) => lookup(name).ok_or_else(|| CompileError::Reference {
                name: name.clone(),
            }),
            Primitive::Not(operand) => Ok(!operand.evaluate(lookup)?),
            Primitive::And(left, right) => Ok(left.evaluate(lookup)? && right.evaluate(lookup)?),
            Primitive::Or(left, right) => Ok(left.evaluate(lookup)? || right.evaluate(lookup)?),
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::Identifier(name) => write!(f, "{}", name),
            Primitive::Not(operand) => write!(f, "not {}", operand),
            Primitive::And(left, right) => write!(f, "({} and {})", left, right),
            Primitive::Or(left, right) => write!(f, "({} or {})", left, right),
        }
    }
}

/// Bottom-up rewrite; children are normalized before their parent.
pub fn normalize(expr: &Expr) -> Primitive {
    match expr {
        Expr::Identifier(name) => Primitive::Identifier(name.clone()),
        Expr::Not(operand) => Primitive::not(normalize(operand)),
        Expr::Binary(op, left, right) => {
            let a = normalize(left);
            let b = normalize(right);
            match op {
                BinaryOp::And => Primitive::and(a, b),
                BinaryOp::Or => Primitive::or(a, b),
                BinaryOp::Nand => Primitive::not(Primitive::and(a, b)),
                BinaryOp::Nor => Primitive::not(Primitive::or(a, b)),
                // (a and not b) or (not a and b)
                BinaryOp::Xor => Primitive::or(
                    Primitive::and(a.clone(), Primitive::not(b.clone())),
                    Primitive::and(Primitive::not(a), b),
                ),
                // (a and b) or (not a and not b)
                BinaryOp::Xnor => Primitive::or(
                    Primitive::and(a.clone(), b.clone()),
                    Primitive::and(Primitive::not(a), Primitive::not(b)),
                ),
            }
        }
    }
}
