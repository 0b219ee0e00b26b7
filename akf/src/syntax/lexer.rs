//! Contextual lexer for filter expressions.
//!
//! The parser tells the cursor which token class it expects next, so the same
//! characters can lex differently depending on position: `created_at` is an
//! identifier in field position and a bare string in value position.

use crate::error::SyntaxError;
use crate::predicate::{is_bare_delimiter, is_bare_key_char, CompareOp};

use super::Span;

/// Longest excerpt reported as the offending token.
const MAX_LEXEME: usize = 32;

#[derive(Debug, Clone)]
pub(crate) struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    pub fn input(&self) -> &'a str {
        self.input
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn is_eof(&self) -> bool {
        self.pos == self.input.len()
    }

    pub fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    /// Consume `c` if it is the next character.
    pub fn eat_char(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    /// Take the longest prefix whose characters satisfy `accept`.
    fn take_while(&mut self, accept: impl Fn(char) -> bool) -> Option<(&'a str, Span)> {
        let rest = self.rest();
        let len = rest.find(|c: char| !accept(c)).unwrap_or(rest.len());
        if len == 0 {
            return None;
        }
        let span = Span::new(self.pos, self.pos + len);
        self.pos += len;
        Some((&rest[..len], span))
    }

    /// `[A-Za-z_][A-Za-z0-9_]*`
    pub fn identifier(&mut self) -> Option<(&'a str, Span)> {
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => self.take_while(is_word_char),
            _ => None,
        }
    }

    /// Consume `keyword` (case-insensitive) when it stands as a whole word.
    pub fn eat_keyword(&mut self, keyword: &str) -> bool {
        let rest = self.rest();
        let Some(head) = rest.get(..keyword.len()) else {
            return false;
        };
        if !head.eq_ignore_ascii_case(keyword) {
            return false;
        }
        if rest[keyword.len()..].starts_with(is_word_char) {
            return false;
        }
        self.pos += keyword.len();
        true
    }

    /// A comparator symbol or word. Nothing is consumed on failure.
    pub fn comparator(&mut self) -> Option<(CompareOp, Span)> {
        let start = self.pos;
        let rest = self.rest();
        for symbol in ["<=", ">=", "!=", "=", "<", ">"] {
            if rest.starts_with(symbol) {
                self.pos += symbol.len();
                return CompareOp::from_symbol(symbol).map(|op| (op, Span::new(start, self.pos)));
            }
        }
        let len = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        let op = CompareOp::from_symbol(&rest[..len])?;
        if rest[len..].starts_with(is_word_char) {
            return None;
        }
        self.pos += len;
        Some((op, Span::new(start, self.pos)))
    }

    /// Whether the next character opens a quoted string.
    pub fn at_quote(&self) -> bool {
        matches!(self.peek(), Some('\'' | '"'))
    }

    /// A `'…'` or `"…"` string with backslash escapes, returned unescaped.
    pub fn quoted(&mut self) -> Result<(String, Span), SyntaxError> {
        let start = self.pos;
        let mut chars = self.rest().char_indices();
        let quote = match chars.next() {
            Some((_, q @ ('\'' | '"'))) => q,
            _ => {
                return Err(SyntaxError::unexpected_token(
                    self.input,
                    start,
                    self.lexeme(),
                    &["quoted string"],
                ))
            }
        };
        let mut text = String::new();
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some((_, escaped)) => text.push(escaped),
                    None => break,
                },
                c if c == quote => {
                    self.pos = start + i + c.len_utf8();
                    return Ok((text, Span::new(start, self.pos)));
                }
                c => text.push(c),
            }
        }
        let closing = if quote == '\'' { "\"'\"" } else { "'\"'" };
        Err(SyntaxError::unexpected_end(self.input, &[closing]))
    }

    /// An unquoted string: everything up to whitespace, a parenthesis or a quote.
    pub fn bare(&mut self) -> Option<(&'a str, Span)> {
        self.take_while(|c| !is_bare_delimiter(c))
    }

    /// An unbracketed map key.
    pub fn bare_key(&mut self) -> Option<(&'a str, Span)> {
        self.take_while(is_bare_key_char)
    }

    /// The token at the cursor as it should appear in an error message.
    pub fn lexeme(&self) -> String {
        self.lexeme_at(self.pos)
    }

    pub fn lexeme_at(&self, pos: usize) -> String {
        let rest = &self.input[pos..];
        match rest.chars().next() {
            None => String::new(),
            Some(c) if is_bare_delimiter(c) => c.to_string(),
            Some(_) => rest
                .chars()
                .take_while(|c| !is_bare_delimiter(*c))
                .take(MAX_LEXEME)
                .collect(),
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
