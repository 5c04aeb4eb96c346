//! Compiler from a small boolean-logic language to buildable part records.
//!
//! ```text
//! source → statements → tokens → AST → and/or/not AST → temp chain
//!        → name table → part graph → ordered records → base64(JSON)
//! ```

pub mod compiler;
pub mod error;
pub mod flatten;
pub mod layout;
pub mod lexer;
pub mod normalize;
pub mod parser;
pub mod parts;
pub mod semantics;
pub mod stack;
pub mod wire;

pub use compiler::realize;
pub use error::{CompileError, Result, StructuralError};
pub use semantics::{analyze, analyze_with, CompileOptions, NameKind, NameRecord, NameTable};
pub use stack::CompileStack;

/// Analyzes and realizes `source` into a fresh stack.
pub fn compile(source: &str, options: &CompileOptions) -> Result<CompileStack> {
    let table = analyze_with(source, options)?;
    let mut stack = CompileStack::new();
    realize(&table, &mut stack)?;
    Ok(stack)
}
