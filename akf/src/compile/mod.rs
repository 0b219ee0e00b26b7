//! Filter compiler: schema, grammar, parser and transformer behind one type.
//!
//! # Example
//!
//! ```
//! use akf::FilterCompiler;
//!
//! let compiler = FilterCompiler::compile("session").unwrap();
//! let filter = compiler.parse("status = running and created_at > 2024-01-01").unwrap();
//! assert_eq!(filter.to_string(), "status = running and created_at > 2024-01-01T00:00:00Z");
//! ```

mod duration;
mod literal;
mod transform;


use log::debug;

use crate::grammar::{self, GrammarSpec};
use crate::predicate::Predicate;
use crate::schema::ResourceType;
use crate::syntax::{ParseTree, Parser};
use crate::Result;

use transform::Transformer;

/// Compiles filter expressions for one resource type.
///
/// Building a compiler generates the grammar and parser; keep it around and
/// call [`FilterCompiler::parse`] for each expression. A compiler can be
/// shared between threads.
#[derive(Debug, Clone)]
pub struct FilterCompiler {
    resource: ResourceType,
    parser: Parser,
}

impl FilterCompiler {
    /// Build a compiler from a resource selector such as `"Session"` or `"tasks"`.
    pub fn compile(resource: &str) -> Result<Self> {
        Self::new(ResourceType::from_name(resource)?)
    }

    pub fn new(resource: ResourceType) -> Result<Self> {
        let grammar = grammar::for_resource(resource)?;
        debug!(
            "Built {} filter grammar with {} productions",
            resource,
            grammar.productions().len()
        );
        Ok(Self {
            resource,
            parser: Parser::new(grammar),
        })
    }

    pub fn resource(&self) -> ResourceType {
        self.resource
    }

    pub fn grammar(&self) -> &GrammarSpec {
        self.parser.grammar()
    }

    /// Parse without lowering, for inspection.
    pub fn parse_tree(&self, expression: &str) -> Result<ParseTree> {
        self.parser.parse(expression)
    }

    /// Compile an expression into a predicate.
    pub fn parse(&self, expression: &str) -> Result<Predicate> {
        let tree = self.parser.parse(expression)?;
        Transformer::new(self.resource).transform(&tree)
    }
}
