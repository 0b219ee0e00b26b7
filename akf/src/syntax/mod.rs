//! Filter expression syntax: contextual lexer, predictive parser and the
//! concrete parse tree they produce.
//!
//! The parser is built from a [`GrammarSpec`](crate::grammar::GrammarSpec)
//! and never changes afterwards. Each call to [`Parser::parse`] runs in time
//! linear in the input and either yields a full tree or the first error.

mod lexer;
mod parser;


pub use parser::Parser;

use crate::grammar::ValueToken;
use crate::predicate::CompareOp;

/// Byte range of a token in the parsed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both.
    pub fn to(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

/// Root of a parsed expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTree {
    pub expr: Expr,
}

/// `term ("or" term)*`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    pub first: Term,
    pub rest: Vec<Term>,
}

impl Expr {
    pub fn terms(&self) -> impl Iterator<Item = &Term> {
        std::iter::once(&self.first).chain(&self.rest)
    }
}

/// `factor ("and" factor)*`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub first: Factor,
    pub rest: Vec<Factor>,
}

impl Term {
    pub fn factors(&self) -> impl Iterator<Item = &Factor> {
        std::iter::once(&self.first).chain(&self.rest)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Factor {
    /// Parenthesized sub-expression.
    Group(Box<Expr>),
    Comparison(Comparison),
}

/// `<field> <comparator> <value>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub field: String,
    /// Map key for keyed fields (`options.key`, `options['key']`).
    pub key: Option<String>,
    pub op: CompareOp,
    pub literal: Literal,
    /// From the field name to the end of the value.
    pub span: Span,
}

/// Right-hand side of a comparison as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    pub token: ValueToken,
    /// Literal text with quotes removed and escapes resolved.
    pub text: String,
    pub quoted: bool,
    pub span: Span,
}
