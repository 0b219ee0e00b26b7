//! Typed field accessors that build predicates.
//!
//! An accessor is bound from a field descriptor by matching on its kind, so
//! each kind only exposes the comparators it supports: strings get the text
//! operators, ordered kinds get `<`/`<=`/`>`/`>=`, booleans and statuses only
//! get equality.

use std::marker::PhantomData;

use chrono::{DateTime, TimeDelta, Utc};

use crate::predicate::{CompareOp, Condition, FieldRef, Predicate, Value};
use crate::schema::{FType, FieldDescriptor, ResourceType, StatusValue};
use crate::{Error, Result};

/// A field bound to the comparators its kind supports.
#[derive(Debug, Clone)]
pub enum FieldAccessor {
    String(StringField),
    Boolean(EqualityField<bool>),
    Number(OrderedField<i64>),
    Date(OrderedField<DateTime<Utc>>),
    Duration(OrderedField<TimeDelta>),
    Status(EqualityField<StatusValue>),
}

impl FieldAccessor {
    /// Bind a descriptor; `key` must be given exactly when the field is keyed.
    ///
    /// Returns `None` for kinds that cannot be filtered on.
    pub fn bind(descriptor: &FieldDescriptor, key: Option<&str>) -> Option<Self> {
        let field = match (descriptor.keyed, key) {
            (false, None) => FieldRef::new(descriptor.name),
            (true, Some(key)) => FieldRef::keyed(descriptor.name, key),
            _ => return None,
        };
        let accessor = match descriptor.kind {
            FType::String => FieldAccessor::String(StringField { field }),
            FType::Boolean => FieldAccessor::Boolean(EqualityField::new(field, FType::Boolean)),
            FType::Number => FieldAccessor::Number(OrderedField::new(field, FType::Number)),
            FType::Date => FieldAccessor::Date(OrderedField::new(field, FType::Date)),
            FType::Duration => FieldAccessor::Duration(OrderedField::new(field, FType::Duration)),
            FType::Status => FieldAccessor::Status(EqualityField::new(field, FType::Status)),
            FType::Array | FType::NotApplicable | FType::Unknown => return None,
        };
        Some(accessor)
    }

    pub fn field(&self) -> &FieldRef {
        match self {
            FieldAccessor::String(f) => &f.field,
            FieldAccessor::Boolean(f) => &f.field,
            FieldAccessor::Number(f) => &f.field,
            FieldAccessor::Date(f) => &f.field,
            FieldAccessor::Duration(f) => &f.field,
            FieldAccessor::Status(f) => &f.field,
        }
    }

    pub fn kind(&self) -> FType {
        match self {
            FieldAccessor::String(_) => FType::String,
            FieldAccessor::Boolean(_) => FType::Boolean,
            FieldAccessor::Number(_) => FType::Number,
            FieldAccessor::Date(_) => FType::Date,
            FieldAccessor::Duration(_) => FType::Duration,
            FieldAccessor::Status(_) => FType::Status,
        }
    }
}

/// Resolve a field of `resource` to its accessor.
pub fn accessor(resource: ResourceType, name: &str, key: Option<&str>) -> Option<FieldAccessor> {
    let descriptor = resource.schema().field(name)?;
    FieldAccessor::bind(descriptor, key)
}

fn condition(field: &FieldRef, kind: FType, op: CompareOp, value: Value) -> Predicate {
    Predicate::Condition(Condition {
        field: field.clone(),
        kind,
        op,
        value,
    })
}

fn unsupported(field: &FieldRef, op: CompareOp) -> Error {
    Error::UnsupportedOperator {
        field: field.to_string(),
        op,
    }
}

/// Accessor for STRING fields.
#[derive(Debug, Clone)]
pub struct StringField {
    field: FieldRef,
}

impl StringField {
    pub fn compare(&self, op: CompareOp, value: impl Into<String>) -> Result<Predicate> {
        match op {
            CompareOp::Eq
            | CompareOp::NotEq
            | CompareOp::Contains
            | CompareOp::NotContains
            | CompareOp::StartsWith
            | CompareOp::EndsWith => Ok(self.text(op, value)),
            op => Err(unsupported(&self.field, op)),
        }
    }

    fn text(&self, op: CompareOp, value: impl Into<String>) -> Predicate {
        condition(&self.field, FType::String, op, Value::String(value.into()))
    }

    pub fn eq(&self, value: impl Into<String>) -> Predicate {
        self.text(CompareOp::Eq, value)
    }

    pub fn ne(&self, value: impl Into<String>) -> Predicate {
        self.text(CompareOp::NotEq, value)
    }

    pub fn contains(&self, value: impl Into<String>) -> Predicate {
        self.text(CompareOp::Contains, value)
    }

    /// Complement of [`StringField::contains`] on the same operands.
    pub fn not_contains(&self, value: impl Into<String>) -> Predicate {
        self.text(CompareOp::NotContains, value)
    }

    pub fn starts_with(&self, value: impl Into<String>) -> Predicate {
        self.text(CompareOp::StartsWith, value)
    }

    pub fn ends_with(&self, value: impl Into<String>) -> Predicate {
        self.text(CompareOp::EndsWith, value)
    }
}

/// Accessor for kinds that only support `=` and `!=`.
#[derive(Debug, Clone)]
pub struct EqualityField<T> {
    field: FieldRef,
    kind: FType,
    _value: PhantomData<fn() -> T>,
}

impl<T: Into<Value>> EqualityField<T> {
    fn new(field: FieldRef, kind: FType) -> Self {
        Self {
            field,
            kind,
            _value: PhantomData,
        }
    }

    pub fn compare(&self, op: CompareOp, value: T) -> Result<Predicate> {
        match op {
            CompareOp::Eq | CompareOp::NotEq => {
                Ok(condition(&self.field, self.kind, op, value.into()))
            }
            op => Err(unsupported(&self.field, op)),
        }
    }

    pub fn eq(&self, value: T) -> Predicate {
        condition(&self.field, self.kind, CompareOp::Eq, value.into())
    }

    pub fn ne(&self, value: T) -> Predicate {
        condition(&self.field, self.kind, CompareOp::NotEq, value.into())
    }
}

/// Accessor for NUMBER, DATE and DURATION fields.
#[derive(Debug, Clone)]
pub struct OrderedField<T> {
    field: FieldRef,
    kind: FType,
    _value: PhantomData<fn() -> T>,
}

impl<T: Into<Value>> OrderedField<T> {
    fn new(field: FieldRef, kind: FType) -> Self {
        Self {
            field,
            kind,
            _value: PhantomData,
        }
    }

    pub fn compare(&self, op: CompareOp, value: T) -> Result<Predicate> {
        match op {
            CompareOp::Eq
            | CompareOp::NotEq
            | CompareOp::Lt
            | CompareOp::Lte
            | CompareOp::Gt
            | CompareOp::Gte => Ok(condition(&self.field, self.kind, op, value.into())),
            op => Err(unsupported(&self.field, op)),
        }
    }

    pub fn eq(&self, value: T) -> Predicate {
        condition(&self.field, self.kind, CompareOp::Eq, value.into())
    }

    pub fn ne(&self, value: T) -> Predicate {
        condition(&self.field, self.kind, CompareOp::NotEq, value.into())
    }

    pub fn lt(&self, value: T) -> Predicate {
        condition(&self.field, self.kind, CompareOp::Lt, value.into())
    }

    pub fn le(&self, value: T) -> Predicate {
        condition(&self.field, self.kind, CompareOp::Lte, value.into())
    }

    pub fn gt(&self, value: T) -> Predicate {
        condition(&self.field, self.kind, CompareOp::Gt, value.into())
    }

    pub fn ge(&self, value: T) -> Predicate {
        condition(&self.field, self.kind, CompareOp::Gte, value.into())
    }
}
