//! Predicate algebra produced by filter compilation.
//!
//! A [`Predicate`] is a tree of field comparisons joined by AND/OR. It is
//! what the remote API evaluates; this crate only builds it, compares it
//! structurally, and serializes it to the API's disjunctive wire form
//! (an OR of AND-clauses of conditions).

use std::fmt;
use std::ops::{BitAnd, BitOr};

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use serde::{Serialize, Serializer};

use crate::schema::{FType, StatusValue};
use crate::{Error, Result};

/// Upper bound on the OR-clauses a predicate may expand to on the wire.
pub const MAX_CLAUSES: usize = 1024;

/// Comparison operators understood by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CompareOp {
    #[serde(rename = "equal")]
    Eq,
    #[serde(rename = "not_equal")]
    NotEq,
    #[serde(rename = "less_than")]
    Lt,
    #[serde(rename = "less_than_or_equal")]
    Lte,
    #[serde(rename = "greater_than")]
    Gt,
    #[serde(rename = "greater_than_or_equal")]
    Gte,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "not_contains")]
    NotContains,
    #[serde(rename = "starts_with")]
    StartsWith,
    #[serde(rename = "ends_with")]
    EndsWith,
}

impl CompareOp {
    /// Surface syntax of the operator in a filter expression.
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "!=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Contains => "contains",
            CompareOp::NotContains => "notcontains",
            CompareOp::StartsWith => "startswith",
            CompareOp::EndsWith => "endswith",
        }
    }

    /// Parse an operator symbol; word operators ignore case.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol {
            "=" => CompareOp::Eq,
            "!=" => CompareOp::NotEq,
            "<" => CompareOp::Lt,
            "<=" => CompareOp::Lte,
            ">" => CompareOp::Gt,
            ">=" => CompareOp::Gte,
            word => match word.to_ascii_lowercase().as_str() {
                "contains" => CompareOp::Contains,
                "notcontains" => CompareOp::NotContains,
                "startswith" => CompareOp::StartsWith,
                "endswith" => CompareOp::EndsWith,
                _ => return None,
            },
        };
        Some(op)
    }

    /// The operator selecting exactly the complement, if the API has one.
    pub fn negated(self) -> Option<Self> {
        match self {
            CompareOp::Eq => Some(CompareOp::NotEq),
            CompareOp::NotEq => Some(CompareOp::Eq),
            CompareOp::Lt => Some(CompareOp::Gte),
            CompareOp::Lte => Some(CompareOp::Gt),
            CompareOp::Gt => Some(CompareOp::Lte),
            CompareOp::Gte => Some(CompareOp::Lt),
            CompareOp::Contains => Some(CompareOp::NotContains),
            CompareOp::NotContains => Some(CompareOp::Contains),
            CompareOp::StartsWith | CompareOp::EndsWith => None,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A typed literal bound into a condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Boolean(bool),
    Number(i64),
    Date(DateTime<Utc>),
    Duration(#[serde(serialize_with = "serialize_duration")] TimeDelta),
    Status(StatusValue),
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Date(value)
    }
}

impl From<TimeDelta> for Value {
    fn from(value: TimeDelta) -> Self {
        Value::Duration(value)
    }
}

impl From<StatusValue> for Value {
    fn from(value: StatusValue) -> Self {
        Value::Status(value)
    }
}

/// Durations travel as protobuf-style `{seconds, nanos}` with matching signs.
fn serialize_duration<S>(delta: &TimeDelta, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    #[derive(Serialize)]
    struct WireDuration {
        seconds: i64,
        nanos: i32,
    }
    WireDuration {
        seconds: delta.num_seconds(),
        nanos: delta.subsec_nanos(),
    }
    .serialize(serializer)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", quote_if_needed(s)),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::Date(d) => write!(f, "{}", d.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::Duration(d) => write!(f, "{}", format_duration(*d)),
            Value::Status(s) => write!(f, "{}", s),
        }
    }
}

/// Characters that end a bare (unquoted) string in filter syntax.
pub(crate) fn is_bare_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | '\'' | '"')
}

fn quote_if_needed(s: &str) -> String {
    if !s.is_empty() && !s.chars().any(is_bare_delimiter) {
        s.to_string()
    } else {
        quote(s)
    }
}

fn quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('\'');
    for c in s.chars() {
        if c == '\'' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

/// ISO-8601 rendering using days and clock units only, e.g. `P1DT2H0.5S`.
fn format_duration(delta: TimeDelta) -> String {
    let sign = if delta < TimeDelta::zero() { "-" } else { "" };
    let magnitude = delta.abs();
    let total = magnitude.num_seconds();
    let nanos = magnitude.subsec_nanos();
    let (days, rest) = (total / 86_400, total % 86_400);
    let (hours, rest) = (rest / 3_600, rest % 3_600);
    let (minutes, seconds) = (rest / 60, rest % 60);

    let mut out = format!("{}P", sign);
    if days > 0 {
        out.push_str(&format!("{}D", days));
    }
    if hours > 0 || minutes > 0 || seconds > 0 || nanos > 0 || days == 0 {
        out.push('T');
        if hours > 0 {
            out.push_str(&format!("{}H", hours));
        }
        if minutes > 0 {
            out.push_str(&format!("{}M", minutes));
        }
        if nanos > 0 {
            let fraction = format!("{:09}", nanos);
            out.push_str(&format!("{}.{}S", seconds, fraction.trim_end_matches('0')));
        } else if seconds > 0 || (hours == 0 && minutes == 0) {
            out.push_str(&format!("{}S", seconds));
        }
    }
    out
}

/// The field a condition applies to; `key` addresses an entry of a map field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FieldRef {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl FieldRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: None,
        }
    }

    pub fn keyed(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: Some(key.into()),
        }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            None => write!(f, "{}", self.name),
            Some(key) if !key.is_empty() && key.chars().all(is_bare_key_char) => {
                write!(f, "{}.{}", self.name, key)
            }
            Some(key) => write!(f, "{}[{}]", self.name, quote(key)),
        }
    }
}

/// Characters allowed in an unbracketed map key (`options.key`).
pub(crate) fn is_bare_key_char(c: char) -> bool {
    !is_bare_delimiter(c) && !matches!(c, '=' | '!' | '<' | '>' | '[' | ']')
}

/// A single field comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Condition {
    pub field: FieldRef,
    pub kind: FType,
    #[serde(rename = "operator")]
    pub op: CompareOp,
    pub value: Value,
}

impl Condition {
    /// The complementary condition, when the operator has a wire inverse.
    pub fn negate(&self) -> Result<Condition> {
        let op = self
            .op
            .negated()
            .ok_or_else(|| Error::NotNegatable(self.to_string()))?;
        Ok(Condition {
            op,
            ..self.clone()
        })
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.op, self.value)
    }
}

/// A boolean filter over one resource's fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Condition(Condition),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    /// Conjunction; nested conjunctions on either side are flattened.
    pub fn and(self, rhs: Predicate) -> Predicate {
        let mut children = match self {
            Predicate::And(children) => children,
            other => vec![other],
        };
        match rhs {
            Predicate::And(rest) => children.extend(rest),
            other => children.push(other),
        }
        Predicate::And(children)
    }

    /// Disjunction; nested disjunctions on either side are flattened.
    pub fn or(self, rhs: Predicate) -> Predicate {
        let mut children = match self {
            Predicate::Or(children) => children,
            other => vec![other],
        };
        match rhs {
            Predicate::Or(rest) => children.extend(rest),
            other => children.push(other),
        }
        Predicate::Or(children)
    }

    /// Logical complement via operator inversion and De Morgan's laws.
    ///
    /// Fails with [`Error::NotNegatable`] when a leaf uses an operator with
    /// no inverse on the wire (`startswith`, `endswith`).
    pub fn negate(&self) -> Result<Predicate> {
        match self {
            Predicate::Condition(c) => Ok(Predicate::Condition(c.negate()?)),
            Predicate::And(children) => fold(children, Predicate::negate, Predicate::or),
            Predicate::Or(children) => fold(children, Predicate::negate, Predicate::and),
        }
    }

    /// Number of leaf conditions in the tree.
    pub fn len(&self) -> usize {
        match self {
            Predicate::Condition(_) => 1,
            Predicate::And(children) | Predicate::Or(children) => {
                children.iter().map(Predicate::len).sum()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of AND-clauses in the disjunctive form, or `None` on overflow.
    pub fn clause_count(&self) -> Option<usize> {
        match self {
            Predicate::Condition(_) => Some(1),
            Predicate::Or(children) => children
                .iter()
                .try_fold(0usize, |acc, child| acc.checked_add(child.clause_count()?)),
            Predicate::And(children) => children
                .iter()
                .try_fold(1usize, |acc, child| acc.checked_mul(child.clause_count()?)),
        }
    }

    /// Expand into disjunctive normal form: an OR of AND-clauses.
    ///
    /// Fails with [`Error::TooManyClauses`] when the expansion would exceed
    /// [`MAX_CLAUSES`]; the count is checked before anything is built.
    pub fn to_disjunctive(&self) -> Result<Vec<Vec<Condition>>> {
        match self.clause_count() {
            Some(count) if count <= MAX_CLAUSES => Ok(self.expand()),
            _ => Err(Error::TooManyClauses { limit: MAX_CLAUSES }),
        }
    }

    fn expand(&self) -> Vec<Vec<Condition>> {
        match self {
            Predicate::Condition(c) => vec![vec![c.clone()]],
            Predicate::Or(children) => children.iter().flat_map(Predicate::expand).collect(),
            Predicate::And(children) => {
                children
                    .iter()
                    .map(Predicate::expand)
                    .fold(vec![Vec::new()], |clauses, child| {
                        clauses
                            .iter()
                            .flat_map(|clause| {
                                child.iter().map(move |other| {
                                    let mut merged = clause.clone();
                                    merged.extend(other.iter().cloned());
                                    merged
                                })
                            })
                            .collect()
                    })
            }
        }
    }

    /// The wire message carrying this predicate.
    pub fn wire(&self) -> Result<WireFilter> {
        Ok(WireFilter {
            or: self
                .to_disjunctive()?
                .into_iter()
                .map(|and| WireConjunction { and })
                .collect(),
        })
    }

    /// Serialized wire message (JSON).
    pub fn to_wire(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.wire()?)?)
    }
}

fn fold(
    children: &[Predicate],
    lower: impl Fn(&Predicate) -> Result<Predicate>,
    combine: fn(Predicate, Predicate) -> Predicate,
) -> Result<Predicate> {
    let mut lowered = children.iter().map(lower);
    let first = match lowered.next() {
        Some(first) => first?,
        None => return Ok(Predicate::Or(Vec::new())),
    };
    lowered.try_fold(first, |acc, next| Ok(combine(acc, next?)))
}

impl From<Condition> for Predicate {
    fn from(condition: Condition) -> Self {
        Predicate::Condition(condition)
    }
}

impl BitAnd for Predicate {
    type Output = Predicate;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.and(rhs)
    }
}

impl BitOr for Predicate {
    type Output = Predicate;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.or(rhs)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Condition(c) => write!(f, "{}", c),
            Predicate::And(children) => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " and ")?;
                    }
                    match child {
                        Predicate::Or(_) => write!(f, "({})", child)?,
                        _ => write!(f, "{}", child)?,
                    }
                }
                Ok(())
            }
            Predicate::Or(children) => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " or ")?;
                    }
                    write!(f, "{}", child)?;
                }
                Ok(())
            }
        }
    }
}

/// Filter message: any clause may match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireFilter {
    pub or: Vec<WireConjunction>,
}

/// All conditions of a clause must match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireConjunction {
    pub and: Vec<Condition>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn session_id(op: CompareOp, value: &str) -> Predicate {
        Predicate::Condition(Condition {
            field: FieldRef::new("session_id"),
            kind: FType::String,
            op,
            value: value.into(),
        })
    }

    fn size(op: CompareOp, value: i64) -> Predicate {
        Predicate::Condition(Condition {
            field: FieldRef::new("size"),
            kind: FType::Number,
            op,
            value: value.into(),
        })
    }

    #[test]
    fn test_and_or_flatten() {
        let a = session_id(CompareOp::Eq, "a");
        let b = session_id(CompareOp::Eq, "b");
        let c = session_id(CompareOp::Eq, "c");

        let and = a.clone().and(b.clone()).and(c.clone());
        assert_eq!(and, Predicate::And(vec![a.clone(), b.clone(), c.clone()]));

        let or = a.clone() | (b.clone() | c.clone());
        assert_eq!(or, Predicate::Or(vec![a.clone(), b.clone(), c.clone()]));

        let mixed = (a.clone() & b.clone()) | c.clone();
        assert_eq!(
            mixed,
            Predicate::Or(vec![Predicate::And(vec![a, b]), c])
        );
    }

    #[test]
    fn test_negate_condition() {
        let contains = session_id(CompareOp::Contains, "x");
        assert_eq!(contains.negate().unwrap(), session_id(CompareOp::NotContains, "x"));
        assert_eq!(size(CompareOp::Lt, 3).negate().unwrap(), size(CompareOp::Gte, 3));
        assert_eq!(size(CompareOp::Gt, 3).negate().unwrap(), size(CompareOp::Lte, 3));
    }

    #[test]
    fn test_negate_de_morgan() {
        let a = session_id(CompareOp::Eq, "a");
        let b = size(CompareOp::Lte, 10);
        let negated = (a & b).negate().unwrap();
        assert_eq!(
            negated,
            Predicate::Or(vec![session_id(CompareOp::NotEq, "a"), size(CompareOp::Gt, 10)])
        );
    }

    #[test]
    fn test_negate_startswith_fails() {
        let err = session_id(CompareOp::StartsWith, "ok").negate().unwrap_err();
        assert!(matches!(err, Error::NotNegatable(text) if text == "session_id startswith ok"));
    }

    #[test]
    fn test_double_negation() {
        let p = (session_id(CompareOp::Eq, "a") | size(CompareOp::Lt, 1)) & size(CompareOp::Gte, 0);
        assert_eq!(p.negate().unwrap().negate().unwrap(), p);
    }

    #[test]
    fn test_disjunctive_distributes_and_over_or() {
        let a = session_id(CompareOp::Eq, "a");
        let b = session_id(CompareOp::Eq, "b");
        let c = size(CompareOp::Gt, 1);
        let p = (a.clone() | b.clone()) & c.clone();
        let dnf = p.to_disjunctive().unwrap();
        let leaf = |p: &Predicate| match p {
            Predicate::Condition(c) => c.clone(),
            _ => unreachable!(),
        };
        assert_eq!(
            dnf,
            vec![vec![leaf(&a), leaf(&c)], vec![leaf(&b), leaf(&c)]]
        );
        assert_eq!(p.len(), 3);
    }

    #[test]
    fn test_disjunctive_clause_limit() {
        let group = || size(CompareOp::Eq, 1) | size(CompareOp::Eq, 2);
        let over = (0..10).fold(group(), |acc, _| acc & group());
        assert_eq!(over.clause_count(), Some(2048));

        let nine = (0..9).fold(group(), |acc, _| acc & group());
        assert_eq!(nine.clause_count(), Some(MAX_CLAUSES));
        assert_eq!(nine.to_disjunctive().unwrap().len(), MAX_CLAUSES);

        assert!(matches!(
            over.to_disjunctive(),
            Err(Error::TooManyClauses { limit: MAX_CLAUSES })
        ));
        assert!(matches!(over.to_wire(), Err(Error::TooManyClauses { .. })));
    }

    #[test]
    fn test_clause_count_overflow() {
        let group = || size(CompareOp::Eq, 1) | size(CompareOp::Eq, 2);
        let huge = (0..70).fold(group(), |acc, _| acc & group());
        assert_eq!(huge.clause_count(), None);
        assert!(huge.to_wire().is_err());
    }

    #[test]
    fn test_wire_json() {
        let p = session_id(CompareOp::Eq, "id") & size(CompareOp::Gte, 5);
        let json: serde_json::Value = serde_json::from_slice(&p.to_wire().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "or": [{
                    "and": [
                        {"field": {"name": "session_id"}, "kind": "string", "operator": "equal", "value": "id"},
                        {"field": {"name": "size"}, "kind": "number", "operator": "greater_than_or_equal", "value": 5}
                    ]
                }]
            })
        );
    }

    #[test]
    fn test_wire_typed_values() {
        let date = Utc.with_ymd_and_hms(2024, 12, 28, 14, 0, 0).unwrap();
        let condition = Condition {
            field: FieldRef::new("created_at"),
            kind: FType::Date,
            op: CompareOp::Gt,
            value: date.into(),
        };
        let json = serde_json::to_value(&condition).unwrap();
        assert_eq!(json["value"], "2024-12-28T14:00:00Z");

        let condition = Condition {
            field: FieldRef::new("duration"),
            kind: FType::Duration,
            op: CompareOp::Lt,
            value: (-TimeDelta::milliseconds(1_500)).into(),
        };
        let json = serde_json::to_value(&condition).unwrap();
        assert_eq!(json["value"], serde_json::json!({"seconds": -1, "nanos": -500_000_000}));

        let condition = Condition {
            field: FieldRef::keyed("options", "tier"),
            kind: FType::String,
            op: CompareOp::Eq,
            value: "gold".into(),
        };
        let json = serde_json::to_value(&condition).unwrap();
        assert_eq!(json["field"], serde_json::json!({"name": "options", "key": "tier"}));
    }

    #[test]
    fn test_display() {
        let p = (session_id(CompareOp::Eq, "id") | session_id(CompareOp::Eq, "with space"))
            & size(CompareOp::Lt, -2);
        assert_eq!(
            p.to_string(),
            "(session_id = id or session_id = 'with space') and size < -2"
        );
    }

    #[test]
    fn test_display_values() {
        assert_eq!(Value::from("").to_string(), "''");
        assert_eq!(Value::from("it's").to_string(), "'it\\'s'");
        assert_eq!(Value::from(TimeDelta::zero()).to_string(), "PT0S");
        assert_eq!(Value::from(TimeDelta::days(2)).to_string(), "P2D");
        assert_eq!(
            Value::from(TimeDelta::seconds(90_061) + TimeDelta::milliseconds(500)).to_string(),
            "P1DT1H1M1.5S"
        );
        assert_eq!(Value::from(-TimeDelta::minutes(5)).to_string(), "-PT5M");
        assert_eq!(FieldRef::keyed("options", "a b").to_string(), "options['a b']");
        assert_eq!(FieldRef::keyed("options", "tier").to_string(), "options.tier");
    }
}
