//! Lowering of parse trees into predicates.

use crate::binding::{accessor, FieldAccessor};
use crate::predicate::{CompareOp, Predicate};
use crate::schema::ResourceType;
use crate::syntax::{Comparison, Expr, Factor, ParseTree, Term};
use crate::{Error, Result};

use super::literal;

/// Reduces a parse tree bottom-up. Holds no state besides the resource.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Transformer {
    resource: ResourceType,
}

impl Transformer {
    pub fn new(resource: ResourceType) -> Self {
        Self { resource }
    }

    pub fn transform(&self, tree: &ParseTree) -> Result<Predicate> {
        self.expr(&tree.expr)
    }

    /// OR of the terms, left to right.
    fn expr(&self, expr: &Expr) -> Result<Predicate> {
        expr.rest
            .iter()
            .try_fold(self.term(&expr.first)?, |acc, term| Ok(acc.or(self.term(term)?)))
    }

    /// AND of the factors, left to right.
    fn term(&self, term: &Term) -> Result<Predicate> {
        term.rest
            .iter()
            .try_fold(self.factor(&term.first)?, |acc, factor| {
                Ok(acc.and(self.factor(factor)?))
            })
    }

    fn factor(&self, factor: &Factor) -> Result<Predicate> {
        match factor {
            Factor::Group(inner) => self.expr(inner),
            Factor::Comparison(comparison) => self.comparison(comparison),
        }
    }

    fn comparison(&self, c: &Comparison) -> Result<Predicate> {
        let bound = accessor(self.resource, &c.field, c.key.as_deref())
            .ok_or_else(|| Error::UnknownField(c.field.clone()))?;
        let raw = c.literal.text.as_str();
        match bound {
            FieldAccessor::String(field) => match c.op {
                CompareOp::NotContains => field.contains(raw).negate(),
                op => field.compare(op, raw),
            },
            FieldAccessor::Boolean(field) => field.compare(c.op, literal::boolean(raw)?),
            FieldAccessor::Number(field) => field.compare(c.op, literal::number(raw)?),
            FieldAccessor::Date(field) => field.compare(c.op, literal::date(raw)?),
            FieldAccessor::Duration(field) => field.compare(c.op, literal::duration(raw)?),
            FieldAccessor::Status(field) => {
                field.compare(c.op, literal::status(self.resource.schema(), raw)?)
            }
        }
    }
}
