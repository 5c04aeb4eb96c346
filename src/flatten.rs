//! Three-address flattening of normalized expressions
use std::fmt;

use serde::Serialize;

use crate::normalize::Primitive;

/// A single primitive operation over already-named operands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Alias(String),
    Not(String),
    And(String, String),
    Or(String, String),
}

impl Operation {
    pub fn operands(&self) -> Vec<&str> {
        match self {
            Operation::Alias(a) | Operation::Not(a) => vec![a.as_str()],
            Operation::And(a, b) | Operation::Or(a, b) => vec![a.as_str(), b.as_str()],
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Alias(a) => write!(f, "{}", a),
            Operation::Not(a) => write!(f, "not {}", a),
            Operation::And(a, b) => write!(f, "{} and {}", a, b),
            Operation::Or(a, b) => write!(f, "{} or {}", a, b),
        }
    }
}

/// Source of fresh temporary names for one compile invocation.
///
/// Temporaries live in the `$` namespace, which user identifiers cannot reach.
#[derive(Debug, Default)]
pub struct TempCounter {
    next: usize,
}

impl TempCounter {
    pub fn fresh(&mut self) -> String {
        let name = format!("$T{}", self.next);
        self.next += 1;
        name
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flattened {
    /// Name holding the value of the whole expression.
    pub result: String,
    /// Temporaries in post-order, each defined before its first use.
    pub temps: Vec<(String, Operation)>,
}

pub fn flatten(expr: &Primitive, counter: &mut TempCounter) -> Flattened {
    let mut temps = Vec::new();
    let result = flatten_into(expr, counter, &mut temps);
    Flattened { result, temps }
}

fn flatten_into(
    expr: &Primitive,
    counter: &mut TempCounter,
    temps: &mut Vec<(String, Operation)>,
) -> String {
    let op = match expr {
        Primitive::Identifier(name) => return name.clone(),
        Primitive::Not(operand) => Operation::Not(flatten_into(operand, counter, temps)),
        Primitive::And(left, right) => {
            let a = flatten_into(left, counter, temps);
            let b = flatten_into(right, counter, temps);
            Operation::And(a, b)
        }
        Primitive::Or(left, right) => {
            let a = flatten_into(left, counter, temps);
            let b = flatten_into(right, counter, temps);
            Operation::Or(a, b)
        }
    };
    let name = counter.fresh();
    temps.push((name.clone(), op));
    name
}
