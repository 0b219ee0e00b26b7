//! Error types for filter compilation.

use std::fmt;

use crate::predicate::CompareOp;
use crate::schema::FType;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("'{0}' is not a valid filter type")]
    UnknownResourceType(String),

    #[error("field '{field}' of {resource} has kind {kind}, which has no grammar production")]
    UnsupportedFieldKind {
        resource: String,
        field: String,
        kind: FType,
    },

    #[error("Filter syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    #[error("Filter has no field '{0}'")]
    UnknownField(String),

    #[error("Invalid {kind} literal '{raw}': {reason}")]
    InvalidLiteral {
        kind: FType,
        raw: String,
        reason: String,
    },

    #[error("Predicate cannot be negated: {0}")]
    NotNegatable(String),

    #[error("Filter expands to more than {limit} OR-clauses; factor out common conditions")]
    TooManyClauses { limit: usize },

    #[error("Operator '{op}' is not supported by field '{field}'")]
    UnsupportedOperator { field: String, op: CompareOp },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl Error {
    pub(crate) fn invalid_literal(kind: FType, raw: &str, reason: impl Into<String>) -> Self {
        Error::InvalidLiteral {
            kind,
            raw: raw.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// A rejected filter expression, positioned in the original input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    /// Byte offset of the offending token.
    pub offset: usize,
    /// 1-based character column of the offending token.
    pub column: usize,
    /// Excerpt of the input with a caret under the offending token.
    pub context: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    UnexpectedToken { found: String, expected: Vec<String> },
    UnexpectedEndOfInput { expected: Vec<String> },
}

/// Characters of input shown on each side of the error position.
const CONTEXT_SPAN: usize = 40;

impl SyntaxError {
    pub(crate) fn unexpected_token(
        input: &str,
        offset: usize,
        found: impl Into<String>,
        expected: &[&str],
    ) -> Self {
        Self::new(
            input,
            offset,
            SyntaxErrorKind::UnexpectedToken {
                found: found.into(),
                expected: expected.iter().map(|e| e.to_string()).collect(),
            },
        )
    }

    pub(crate) fn unexpected_end(input: &str, expected: &[&str]) -> Self {
        Self::new(
            input,
            input.len(),
            SyntaxErrorKind::UnexpectedEndOfInput {
                expected: expected.iter().map(|e| e.to_string()).collect(),
            },
        )
    }

    fn new(input: &str, offset: usize, kind: SyntaxErrorKind) -> Self {
        let column = input[..offset].chars().count() + 1;
        Self {
            kind,
            offset,
            column,
            context: context_snippet(input, offset),
        }
    }

    /// Tokens that would have been accepted at the error position.
    pub fn expected(&self) -> &[String] {
        match &self.kind {
            SyntaxErrorKind::UnexpectedToken { expected, .. } => expected,
            SyntaxErrorKind::UnexpectedEndOfInput { expected } => expected,
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SyntaxErrorKind::UnexpectedToken { found, .. } => {
                write!(f, "unexpected '{}' at column {}", found, self.column)?;
            }
            SyntaxErrorKind::UnexpectedEndOfInput { .. } => {
                write!(f, "unexpected end of input at column {}", self.column)?;
            }
        }
        let expected = self.expected();
        if !expected.is_empty() {
            write!(f, ", expected one of: {}", expected.join(", "))?;
        }
        write!(f, "\n{}", self.context)
    }
}

impl std::error::Error for SyntaxError {}

/// Render the input around `offset` with a caret on the line below.
fn context_snippet(input: &str, offset: usize) -> String {
    let before: Vec<char> = input[..offset].chars().collect();
    let start = before.len().saturating_sub(CONTEXT_SPAN);
    let head: String = before[start..].iter().collect();
    let tail: String = input[offset..]
        .chars()
        .take_while(|c| *c != '\n')
        .take(CONTEXT_SPAN)
        .collect();
    format!("{}{}\n{}^", head, tail, " ".repeat(before.len() - start))
}
