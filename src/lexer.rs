//! Comment stripping, statement splitting and tokenization
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{CompileError, Result};

/// Comments are bracketed by single slashes and may span lines: `/ like this /`.
static COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)/.*?/").unwrap());

pub const STATEMENT_TERMINATOR: char = ';';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifiers and keywords alike.
    Word,
    Assign,
    LeftParen,
    RightParen,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn is(&self, text: &str) -> bool {
        self.text == text
    }
}

/// One `;`-terminated statement, already tokenized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub tokens: Vec<Token>,
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", token.text)?;
        }
        Ok(())
    }
}

pub fn strip_comments(source: &str) -> String {
    COMMENT.replace_all(source, "").into_owned()
}

pub fn split_statements(source: &str) -> Result<Vec<Statement>> {
    let code = strip_comments(source);
    let mut statements = Vec::new();
    for segment in code.split(STATEMENT_TERMINATOR) {
        let tokens = tokenize(segment.trim())?;
        if !tokens.is_empty() {
            statements.push(Statement { tokens });
        }
    }
    Ok(statements)
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

pub fn tokenize(segment: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = segment.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        let kind = match c {
            '=' => TokenKind::Assign,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            c if c.is_whitespace() => continue,
            c if is_word_char(c) => {
                let mut end = start + c.len_utf8();
                while let Some(&(i, next)) = chars.peek() {
                    if !is_word_char(next) {
                        break;
                    }
                    end = i + next.len_utf8();
                    chars.next();
                }
                tokens.push(Token {
                    kind: TokenKind::Word,
                    text: segment[start..end].to_string(),
                });
                continue;
            }
            other => return Err(CompileError::lexical(other, "unexpected character")),
        };
        tokens.push(Token {
            kind,
            text: c.to_string(),
        });
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(statement: &Statement) -> Vec<&str> {
        statement.tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_split_and_tokenize() {
        let statements = split_statements("input A;\n  OUT=(A and B) ;").unwrap();
        assert_eq!(statements.len(), 2);
        assert_eq!(texts(&statements[0]), vec!["input", "A"]);
        assert_eq!(
            texts(&statements[1]),
            vec!["OUT", "=", "(", "A", "and", "B", ")"]
        );
        assert_eq!(statements[1].tokens[1].kind, TokenKind::Assign);
        assert_eq!(statements[1].tokens[2].kind, TokenKind::LeftParen);
        assert_eq!(statements[1].tokens[6].kind, TokenKind::RightParen);
    }

    #[test]
    fn test_empty_statements_are_dropped() {
        let statements = split_statements(";;  ;\n\t;input A;;").unwrap();
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].to_string(), "input A");
    }

    #[test]
    fn test_comment_spans_lines() {
        let stripped = strip_comments("input A; / first\nsecond ; / input B;");
        assert_eq!(stripped, "input A;  input B;");
    }

    #[test]
    fn test_adjacent_comments() {
        assert_eq!(strip_comments("A/x//y/B"), "AB");
        assert_eq!(strip_comments("/a/ /b/"), " ");
    }

    #[test]
    fn test_nested_delimiters_close_at_first_slash() {
        // The first pair closes early, leaving the middle text in place.
        assert_eq!(strip_comments("/ x /Y/ z /"), "Y");
    }

    #[test]
    fn test_unmatched_slash_is_rejected() {
        let err = split_statements("input A; / dangling").unwrap_err();
        assert!(matches!(err, CompileError::Lexical { ref token, .. } if token == "/"));
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("A = B & C").unwrap_err();
        assert!(matches!(err, CompileError::Lexical { ref token, .. } if token == "&"));
    }
}
