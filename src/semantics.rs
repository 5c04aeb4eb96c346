//! Statement classification, redefinition resolution and the name table
use std::collections::HashMap;
use std::fmt;

use log::{debug, trace};
use serde::Serialize;

use crate::error::{CompileError, Result};
use crate::flatten::{flatten, Operation, TempCounter};
use crate::lexer::{split_statements, Statement, Token, TokenKind};
use crate::normalize::normalize;
use crate::parser::{check_identifier, is_valid_identifier, Expr, Parser, INIT_SIGNAL};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Adds the hidden `_INIT` input and feeds it into every source-level `not`.
    pub init_pulse: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NameKind {
    Input,
    Temp,
    Variable,
    Output,
}

impl NameKind {
    /// Whether a definition of kind `by` may shadow a live binding of this kind.
    ///
    /// Outputs may republish anything; plain assignments never replace an input.
    pub fn is_shadowable_by(self, by: NameKind) -> bool {
        self != NameKind::Input || by == NameKind::Output
    }
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NameKind::Input => "an input",
            NameKind::Temp => "a temporary",
            NameKind::Variable => "a variable",
            NameKind::Output => "an output",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameRecord {
    /// Key in the name table; hidden successors get a `$` suffix.
    pub name: String,
    /// Name as written in the source.
    pub declared_as: String,
    pub kind: NameKind,
    /// `None` for inputs.
    pub value: Option<Operation>,
}

/// Insertion-ordered table of every name defined by one program.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct NameTable {
    records: Vec<NameRecord>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record; a name may only be bound once.
    pub fn insert(&mut self, record: NameRecord) -> Result<()> {
        if let Some(existing) = self.get(&record.name) {
            return Err(CompileError::Redefinition {
                name: record.declared_as,
                kind: existing.kind,
            });
        }
        self.index.insert(record.name.clone(), self.records.len());
        self.records.push(record);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&NameRecord> {
        self.index.get(name).map(|&i| &self.records[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &NameRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn inputs(&self) -> impl Iterator<Item = &NameRecord> {
        self.records.iter().filter(|r| r.kind == NameKind::Input)
    }

    pub fn outputs(&self) -> impl Iterator<Item = &NameRecord> {
        self.records.iter().filter(|r| r.kind == NameKind::Output)
    }

    /// Runs the table as a combinational circuit and returns each output's value,
    /// in declaration order.
    ///
    /// The init pulse reads as low unless `inputs` says otherwise.
    pub fn evaluate<F>(&self, inputs: F) -> Result<Vec<(String, bool)>>
    where
        F: Fn(&str) -> Option<bool>,
    {
        let mut values: HashMap<&str, bool> = HashMap::new();
        let mut outputs = Vec::new();

        for record in &self.records {
            let value = match &record.value {
                None => inputs(&record.declared_as)
                    .or_else(|| (record.name == INIT_SIGNAL).then_some(false))
                    .ok_or_else(|| CompileError::Reference {
                        name: record.declared_as.clone(),
                    })?,
                Some(op) => {
                    let operand = |name: &str| {
                        values
                            .get(name)
                            .copied()
                            .ok_or_else(|| CompileError::Reference { name: name.to_string() })
                    };
                    match op {
                        Operation::Alias(a) => operand(a)?,
                        Operation::Not(a) => !operand(a)?,
                        Operation::And(a, b) => operand(a)? && operand(b)?,
                        Operation::Or(a, b) => operand(a)? || operand(b)?,
                    }
                }
            };
            values.insert(&record.name, value);
            if record.kind == NameKind::Output {
                outputs.push((record.declared_as.clone(), value));
            }
        }

        Ok(outputs)
    }
}

/// Versioned name resolver: `X` → generation → `X$<generation>`.
#[derive(Debug, Default)]
pub struct Renames {
    generations: HashMap<String, usize>,
}

impl Renames {
    /// The table key currently bound to `name`.
    pub fn resolve(&self, name: &str) -> String {
        match self.generations.get(name) {
            Some(generation) => format!("{}${}", name, generation),
            None => name.to_string(),
        }
    }

    /// Mints the next hidden successor of `name` and makes it current.
    pub fn shadow(&mut self, name: &str) -> String {
        let generation = self.generations.entry(name.to_string()).or_insert(0);
        *generation += 1;
        format!("{}${}", name, generation)
    }

    fn rename_identifiers(&self, expr: Expr) -> Expr {
        match expr {
            Expr::Identifier(name) => Expr::Identifier(self.resolve(&name)),
            Expr::Not(operand) => Expr::not(self.rename_identifiers(*operand)),
            Expr::Binary(op, left, right) => Expr::binary(
                op,
                self.rename_identifiers(*left),
                self.rename_identifiers(*right),
            ),
        }
    }
}

/// Per-invocation analysis state.
#[derive(Debug, Default)]
pub struct Context {
    pub table: NameTable,
    pub renames: Renames,
    pub temps: TempCounter,
    pub options: CompileOptions,
}

/// Shape of a statement, checked before anything is bound.
enum Definition<'a> {
    Input(&'a str),
    Assign {
        target: &'a str,
        kind: NameKind,
        expr: &'a [Token],
        statement: &'a Statement,
    },
}

fn expect_assign<'a>(statement: &'a Statement, rest: &'a [Token]) -> Result<&'a [Token]> {
    match rest.first() {
        Some(token) if token.kind == TokenKind::Assign => Ok(&rest[1..]),
        _ => Err(CompileError::syntax(
            "definition must start with '='",
            statement.to_string(),
        )),
    }
}

fn classify(statement: &Statement) -> Result<Definition<'_>> {
    let tokens = &statement.tokens;
    let head = &tokens[0];

    if head.is("input") {
        if tokens.len() != 2 {
            return Err(CompileError::syntax(
                "input must name exactly one value",
                statement.to_string(),
            ));
        }
        check_identifier(&tokens[1].text)?;
        return Ok(Definition::Input(&tokens[1].text));
    }

    if head.is("output") {
        let target = tokens.get(1).ok_or_else(|| {
            CompileError::syntax("output must name a value", statement.to_string())
        })?;
        check_identifier(&target.text)?;
        // `output X;` publishes the current value of X
        let expr = if tokens.len() == 2 {
            &tokens[1..]
        } else {
            expect_assign(statement, &tokens[2..])?
        };
        return Ok(Definition::Assign {
            target: &target.text,
            kind: NameKind::Output,
            expr,
            statement,
        });
    }

    if is_valid_identifier(&head.text) {
        check_identifier(&head.text)?;
        let expr = expect_assign(statement, &tokens[1..])?;
        return Ok(Definition::Assign {
            target: &head.text,
            kind: NameKind::Variable,
            expr,
            statement,
        });
    }

    Err(CompileError::syntax(
        format!("unknown token '{}'", head.text),
        statement.to_string(),
    ))
}

impl Context {
    pub fn new(options: CompileOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    fn declare_input(&mut self, name: &str) -> Result<()> {
        if let Some(existing) = self.table.get(&self.renames.resolve(name)) {
            return Err(CompileError::Redefinition {
                name: name.to_string(),
                kind: existing.kind,
            });
        }
        self.table.insert(NameRecord {
            name: name.to_string(),
            declared_as: name.to_string(),
            kind: NameKind::Input,
            value: None,
        })
    }

    fn define(
        &mut self,
        target: &str,
        kind: NameKind,
        expr: &[Token],
        statement: &Statement,
    ) -> Result<()> {
        let current = self.renames.resolve(target);
        let live = self.table.get(&current).map(|record| record.kind);
        if let Some(existing) = live.filter(|k| !k.is_shadowable_by(kind)) {
            return Err(CompileError::Redefinition {
                name: target.to_string(),
                kind: existing,
            });
        }

        let mut parser = Parser::new(expr, statement.to_string());
        if self.options.init_pulse {
            parser = parser.with_init_signal(INIT_SIGNAL);
        }
        // Operands are resolved before the target is shadowed, so `X = X and Y`
        // reads the previous X.
        let tree = self.renames.rename_identifiers(parser.parse()?);
        let flat = flatten(&normalize(&tree), &mut self.temps);

        for (name, op) in flat.temps {
            trace!("{} = {}", name, op);
            self.table.insert(NameRecord {
                declared_as: name.clone(),
                name,
                kind: NameKind::Temp,
                value: Some(op),
            })?;
        }

        let binding = if live.is_some() {
            self.renames.shadow(target)
        } else {
            target.to_string()
        };
        trace!("{} ({}) = {}", binding, kind, flat.result);
        self.table.insert(NameRecord {
            name: binding,
            declared_as: target.to_string(),
            kind,
            value: Some(Operation::Alias(flat.result)),
        })
    }
}

pub fn analyze(source: &str) -> Result<NameTable> {
    analyze_with(source, &CompileOptions::default())
}

pub fn analyze_with(source: &str, options: &CompileOptions) -> Result<NameTable> {
    let statements = split_statements(source)?;
    let definitions = statements.iter().map(classify).collect::<Result<Vec<_>>>()?;
    debug!("split source into {} statements", statements.len());

    let mut ctx = Context::new(options.clone());
    if options.init_pulse {
        ctx.table.insert(NameRecord {
            name: INIT_SIGNAL.to_string(),
            declared_as: INIT_SIGNAL.to_string(),
            kind: NameKind::Input,
            value: None,
        })?;
    }

    for definition in definitions {
        match definition {
            Definition::Input(name) => ctx.declare_input(name)?,
            Definition::Assign {
                target,
                kind,
                expr,
                statement,
            } => ctx.define(target, kind, expr, statement)?,
        }
    }

    debug!("analysis bound {} names", ctx.table.len());
    Ok(ctx.table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(table: &NameTable, name: &str) -> Option<Operation> {
        table.get(name).and_then(|r| r.value.clone())
    }

    #[test]
    fn test_inputs_and_outputs() {
        let table = analyze("input A; input B; output OUT = A and B;").unwrap();
        let names: Vec<(&str, NameKind)> = table
            .iter()
            .map(|r| (r.name.as_str(), r.kind))
            .collect();
        assert_eq!(
            names,
            vec![
                ("A", NameKind::Input),
                ("B", NameKind::Input),
                ("$T0", NameKind::Temp),
                ("OUT", NameKind::Output),
            ]
        );
        assert_eq!(value(&table, "$T0"), Some(Operation::And("A".into(), "B".into())));
        assert_eq!(value(&table, "OUT"), Some(Operation::Alias("$T0".into())));
        assert_eq!(value(&table, "A"), None);
    }

    #[test]
    fn test_bare_output_publishes_variable() {
        let table = analyze("input A; X = not A; output X;").unwrap();
        let output = table.outputs().next().unwrap();
        assert_eq!(output.name, "X$1");
        assert_eq!(output.declared_as, "X");
        assert_eq!(output.value, Some(Operation::Alias("X".into())));
    }

    #[test]
    fn test_redefinition_is_forward_only() {
        let table = analyze("input X; input Y; A = X; B = A; A = A and Y; C = A;").unwrap();
        assert_eq!(value(&table, "A"), Some(Operation::Alias("X".into())));
        assert_eq!(value(&table, "B"), Some(Operation::Alias("A".into())));
        assert_eq!(value(&table, "$T0"), Some(Operation::And("A".into(), "Y".into())));
        assert_eq!(value(&table, "A$1"), Some(Operation::Alias("$T0".into())));
        assert_eq!(value(&table, "C"), Some(Operation::Alias("A$1".into())));
    }

    #[test]
    fn test_accumulation_chains_generations() {
        let table =
            analyze("input X; input Y; A = X; A = A or Y; A = A and X; output O = A;").unwrap();
        assert_eq!(value(&table, "A$2"), Some(Operation::Alias("$T1".into())));
        assert_eq!(value(&table, "$T1"), Some(Operation::And("A$1".into(), "X".into())));
        assert_eq!(value(&table, "O"), Some(Operation::Alias("A$2".into())));
    }

    #[test]
    fn test_duplicate_input_is_rejected() {
        let err = analyze("input A; input A;").unwrap_err();
        assert!(matches!(
            err,
            CompileError::Redefinition { ref name, kind: NameKind::Input } if name == "A"
        ));
    }

    #[test]
    fn test_inputs_are_not_reassignable() {
        assert!(matches!(
            analyze("input A; A = A;"),
            Err(CompileError::Redefinition { kind: NameKind::Input, .. })
        ));
        assert!(matches!(
            analyze("input A; X = A; input X;"),
            Err(CompileError::Redefinition { kind: NameKind::Variable, .. })
        ));
        assert!(matches!(
            analyze("input A; output O = A; input O;"),
            Err(CompileError::Redefinition { kind: NameKind::Output, .. })
        ));
    }

    #[test]
    fn test_input_passes_straight_through() {
        let table = analyze("input A; output A;").unwrap();
        let output = table.outputs().next().unwrap();
        assert_eq!(output.name, "A$1");
        assert_eq!(output.declared_as, "A");
        assert_eq!(output.value, Some(Operation::Alias("A".into())));
        assert_eq!(table.get("A").map(|r| r.kind), Some(NameKind::Input));

        for a in [false, true] {
            let out = table.evaluate(|_| Some(a)).unwrap();
            assert_eq!(out, vec![("A".to_string(), a)]);
        }
    }

    #[test]
    fn test_published_variable_can_be_reassigned() {
        let table =
            analyze("input A; input B; X = A; output X; X = X and B; output X;").unwrap();
        assert_eq!(value(&table, "X$1"), Some(Operation::Alias("X".into())));
        assert_eq!(value(&table, "$T0"), Some(Operation::And("X$1".into(), "B".into())));
        assert_eq!(value(&table, "X$3"), Some(Operation::Alias("X$2".into())));

        let published: Vec<&str> = table.outputs().map(|r| r.name.as_str()).collect();
        assert_eq!(published, vec!["X$1", "X$3"]);

        for (a, b) in [(false, false), (false, true), (true, false), (true, true)] {
            let out = table
                .evaluate(|name| match name {
                    "A" => Some(a),
                    "B" => Some(b),
                    _ => None,
                })
                .unwrap();
            assert_eq!(out, vec![("X".to_string(), a), ("X".to_string(), a && b)]);
        }

        let reassigned = analyze("input A; output O = A; O = not A;").unwrap();
        assert_eq!(value(&reassigned, "O$1"), Some(Operation::Alias("$T0".into())));
    }

    #[test]
    fn test_statement_shape_errors() {
        assert!(matches!(analyze("input;"), Err(CompileError::Syntax { .. })));
        assert!(matches!(analyze("input A B;"), Err(CompileError::Syntax { .. })));
        assert!(matches!(analyze("output;"), Err(CompileError::Syntax { .. })));
        assert!(matches!(analyze("X A;"), Err(CompileError::Syntax { .. })));
        assert!(matches!(analyze("X;"), Err(CompileError::Syntax { .. })));
        assert!(matches!(analyze("foo = A;"), Err(CompileError::Syntax { .. })));
        assert!(matches!(analyze("= A;"), Err(CompileError::Syntax { .. })));
        assert!(matches!(analyze("input a;"), Err(CompileError::Lexical { .. })));
        assert!(matches!(analyze("input _INIT;"), Err(CompileError::Lexical { .. })));
    }

    #[test]
    fn test_shape_is_checked_before_binding() {
        // the bad last statement wins over the redefinition before it
        let err = analyze("input A; input A; B A;").unwrap_err();
        assert!(matches!(err, CompileError::Syntax { .. }));
    }

    #[test]
    fn test_init_pulse() {
        let options = CompileOptions { init_pulse: true };
        let table = analyze_with("input A; output O = not A;", &options).unwrap();
        let inputs: Vec<&str> = table.inputs().map(|r| r.name.as_str()).collect();
        assert_eq!(inputs, vec![INIT_SIGNAL, "A"]);
        assert_eq!(
            value(&table, "$T0"),
            Some(Operation::Or(INIT_SIGNAL.into(), "A".into()))
        );

        let out = table.evaluate(|name| (name == "A").then_some(false)).unwrap();
        assert_eq!(out, vec![("O".to_string(), true)]);
    }

    #[test]
    fn test_evaluate_outputs() {
        let table = analyze(
            "input A; input B; S = A xor B; output SUM = S; output CARRY = A and B;",
        )
        .unwrap();
        for (a, b) in [(false, false), (false, true), (true, false), (true, true)] {
            let out = table
                .evaluate(|name| match name {
                    "A" => Some(a),
                    "B" => Some(b),
                    _ => None,
                })
                .unwrap();
            assert_eq!(
                out,
                vec![("SUM".to_string(), a != b), ("CARRY".to_string(), a && b)]
            );
        }
    }

    #[test]
    fn test_each_invocation_starts_fresh() {
        let first = analyze("input A; X = not A;").unwrap();
        let second = analyze("input A; X = not A;").unwrap();
        assert_eq!(
            first.iter().collect::<Vec<_>>(),
            second.iter().collect::<Vec<_>>()
        );
    }
}
