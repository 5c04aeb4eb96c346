//! Compile errors

use thiserror::Error;

use crate::semantics::NameKind;

pub type Result<T> = std::result::Result<T, CompileError>;

/// Every error aborts the whole compile invocation.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("syntax error: {message} in `{statement}`")]
    Syntax { message: String, statement: String },

    #[error("lexical error: {reason}: `{token}`")]
    Lexical { token: String, reason: &'static str },

    #[error("unresolved reference `{name}`")]
    Reference { name: String },

    #[error("`{name}` is already defined as {kind} and cannot be redefined")]
    Redefinition { name: String, kind: NameKind },

    #[error(transparent)]
    Structural(#[from] StructuralError),
}

impl CompileError {
    pub(crate) fn syntax(message: impl Into<String>, statement: impl Into<String>) -> Self {
        CompileError::Syntax {
            message: message.into(),
            statement: statement.into(),
        }
    }

    pub(crate) fn lexical(token: impl Into<String>, reason: &'static str) -> Self {
        CompileError::Lexical {
            token: token.into(),
            reason,
        }
    }
}

/// Violations of the part/connection model.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StructuralError {
    #[error("cup {cup} of {part} is already used")]
    CupInUse { part: &'static str, cup: u8 },

    #[error("{part} has no cup {cup}")]
    UnknownCup { part: &'static str, cup: u8 },

    #[error("{part} has no free cup")]
    NoFreeCup { part: &'static str },

    #[error("{part} has no free attachment")]
    NoFreeAttachment { part: &'static str },

    #[error("{part} references {dependency}, which is not finalized yet")]
    UnfinalizedDependency {
        part: &'static str,
        dependency: &'static str,
    },

    #[error("{part} is already finalized")]
    AlreadyFinalized { part: &'static str },
}
