//! Predictive parser over a generated grammar.

use std::collections::HashMap;

use crate::error::SyntaxError;
use crate::grammar::{GrammarSpec, Production, ValueToken};
use crate::{Error, Result};

use super::lexer::Cursor;
use super::{Comparison, Expr, Factor, Literal, ParseTree, Span, Term};

/// Deepest parenthesis nesting accepted.
const MAX_NESTING: usize = 64;

const AFTER_EXPR: &[&str] = &["and", "or", "end of input"];
const AFTER_GROUP: &[&str] = &["and", "or", "')'"];
const FACTOR_START: &[&str] = &["'('", "field name"];

/// Parser for one resource's grammar. Immutable once built.
#[derive(Debug, Clone)]
pub struct Parser {
    grammar: GrammarSpec,
    index: HashMap<&'static str, usize>,
}

impl Parser {
    pub fn new(grammar: GrammarSpec) -> Self {
        let index = grammar
            .productions()
            .iter()
            .enumerate()
            .map(|(i, p)| (p.field, i))
            .collect();
        Self { grammar, index }
    }

    pub fn grammar(&self) -> &GrammarSpec {
        &self.grammar
    }

    fn production(&self, field: &str) -> Option<&Production> {
        self.index.get(field).map(|&i| &self.grammar.productions()[i])
    }

    /// Parse a whole expression. Trailing input is an error.
    pub fn parse(&self, input: &str) -> Result<ParseTree> {
        let mut state = State {
            parser: self,
            cursor: Cursor::new(input),
            depth: 0,
        };
        let expr = state.expr()?;
        state.cursor.skip_whitespace();
        if !state.cursor.is_eof() {
            return Err(state.unexpected(AFTER_EXPR));
        }
        Ok(ParseTree { expr })
    }
}

struct State<'p, 'a> {
    parser: &'p Parser,
    cursor: Cursor<'a>,
    depth: usize,
}

impl State<'_, '_> {
    fn expr(&mut self) -> Result<Expr> {
        let first = self.term()?;
        let mut rest = Vec::new();
        loop {
            self.cursor.skip_whitespace();
            if !self.cursor.eat_keyword("or") {
                break;
            }
            rest.push(self.term()?);
        }
        Ok(Expr { first, rest })
    }

    fn term(&mut self) -> Result<Term> {
        let first = self.factor()?;
        let mut rest = Vec::new();
        loop {
            self.cursor.skip_whitespace();
            if !self.cursor.eat_keyword("and") {
                break;
            }
            rest.push(self.factor()?);
        }
        Ok(Term { first, rest })
    }

    fn factor(&mut self) -> Result<Factor> {
        self.cursor.skip_whitespace();
        let open = self.cursor.pos();
        if self.cursor.eat_char('(') {
            if self.depth == MAX_NESTING {
                return Err(SyntaxError::unexpected_token(
                    self.cursor.input(),
                    open,
                    "(",
                    &["field name"],
                )
                .into());
            }
            self.depth += 1;
            let inner = self.expr()?;
            self.depth -= 1;
            self.cursor.skip_whitespace();
            if !self.cursor.eat_char(')') {
                return Err(self.unexpected(AFTER_GROUP));
            }
            return Ok(Factor::Group(Box::new(inner)));
        }

        let Some((name, name_span)) = self.cursor.identifier() else {
            return Err(self.unexpected(FACTOR_START));
        };
        let parser = self.parser;
        let production = parser
            .production(name)
            .ok_or_else(|| Error::UnknownField(name.to_string()))?;

        let key = if production.keyed {
            Some(self.key()?)
        } else {
            None
        };

        self.cursor.skip_whitespace();
        let at = self.cursor.pos();
        let op = match self.cursor.comparator() {
            Some((op, _)) if production.comparators.allows(op) => op,
            found => {
                let expected: Vec<&str> =
                    production.comparators.ops().iter().map(|op| op.symbol()).collect();
                return Err(match found {
                    Some((op, _)) => {
                        SyntaxError::unexpected_token(self.cursor.input(), at, op.symbol(), &expected)
                    }
                    None => self.syntax_error(at, &expected),
                }
                .into());
            }
        };

        let literal = self.literal(production.token)?;
        Ok(Factor::Comparison(Comparison {
            field: name.to_string(),
            key,
            op,
            span: name_span.to(literal.span),
            literal,
        }))
    }

    /// `"." KEY | "[" QUOTED "]"`
    fn key(&mut self) -> Result<String> {
        self.cursor.skip_whitespace();
        if self.cursor.eat_char('.') {
            self.cursor.skip_whitespace();
            return match self.cursor.bare_key() {
                Some((key, _)) => Ok(key.to_string()),
                None => Err(self.unexpected(&["map key"])),
            };
        }
        if self.cursor.eat_char('[') {
            self.cursor.skip_whitespace();
            if !self.cursor.at_quote() {
                return Err(self.unexpected(&["quoted string"]));
            }
            let (key, _) = self.cursor.quoted()?;
            self.cursor.skip_whitespace();
            if !self.cursor.eat_char(']') {
                return Err(self.unexpected(&["']'"]));
            }
            return Ok(key);
        }
        Err(self.unexpected(&["'.'", "'['"]))
    }

    fn literal(&mut self, token: ValueToken) -> Result<Literal> {
        self.cursor.skip_whitespace();
        let start = self.cursor.pos();
        if token == ValueToken::String && self.cursor.at_quote() {
            let (text, span) = self.cursor.quoted()?;
            return Ok(Literal {
                token,
                text,
                quoted: true,
                span,
            });
        }
        let Some((text, span)) = self.cursor.bare() else {
            return Err(self.unexpected(&[token.describe()]));
        };
        let well_formed = match token {
            ValueToken::Bool => {
                text.eq_ignore_ascii_case("true") || text.eq_ignore_ascii_case("false")
            }
            ValueToken::SignedInt => {
                let digits = text.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(text);
                !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
            }
            _ => true,
        };
        if !well_formed {
            return Err(
                SyntaxError::unexpected_token(self.cursor.input(), start, text, &[token.describe()])
                    .into(),
            );
        }
        Ok(Literal {
            token,
            text: text.to_string(),
            quoted: false,
            span,
        })
    }

    fn syntax_error(&self, at: usize, expected: &[&str]) -> SyntaxError {
        let input = self.cursor.input();
        if at == input.len() {
            SyntaxError::unexpected_end(input, expected)
        } else {
            SyntaxError::unexpected_token(input, at, self.cursor.lexeme_at(at), expected)
        }
    }

    /// Error for whatever token sits at the cursor.
    fn unexpected(&self, expected: &[&str]) -> Error {
        self.syntax_error(self.cursor.pos(), expected).into()
    }
}
