//! ArmoniK filter expressions.
//!
//! Compiles human-readable filters such as
//! `status = running and created_at > 2024-01-01T00:00:00Z` against a
//! resource type (session, task, result, partition) into a [`Predicate`] the
//! ArmoniK API understands. Each resource's grammar is generated from its
//! field catalogue, so only filterable fields and the comparators their kind
//! supports are accepted.

pub mod binding;
pub mod compile;
pub mod config;
pub mod error;
pub mod grammar;
pub mod predicate;
pub mod schema;
pub mod syntax;

pub use binding::{accessor, FieldAccessor};
pub use compile::FilterCompiler;
pub use config::{Config, OutputFormat};
pub use error::{Error, Result, SyntaxError, SyntaxErrorKind};
pub use grammar::{Comparators, GrammarSpec, Production, ValueToken};
pub use predicate::{
    CompareOp, Condition, FieldRef, Predicate, Value, WireConjunction, WireFilter, MAX_CLAUSES,
};
pub use schema::{FType, FieldDescriptor, ResourceType, Schema, StatusValue};
pub use syntax::{ParseTree, Parser};
