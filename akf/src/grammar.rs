//! Grammar generation from resource schemas.
//!
//! A resource's filter grammar is a fixed boolean skeleton plus one `factor`
//! alternative per filterable field:
//!
//! ```text
//! start  := expr
//! expr   := term ( "or" term )*
//! term   := factor ( "and" factor )*
//! factor := "(" expr ")" | <field> <comparator> <value> | ...
//! ```
//!
//! [`GrammarSpec`] holds the generated productions as data; [`GrammarSpec::render`]
//! prints them as grammar text. Both are pure functions of the field list.

use crate::predicate::CompareOp;
use crate::schema::{FType, FieldDescriptor, ResourceType, StatusValue};
use crate::{Error, Result};

/// Comparator family available to a field kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparators {
    /// `=, !=, contains, notcontains, startswith, endswith`
    String,
    /// `=, !=`
    Equality,
    /// `=, !=, <, <=, >, >=`
    Ordered,
}

impl Comparators {
    pub fn ops(self) -> &'static [CompareOp] {
        match self {
            Comparators::String => &[
                CompareOp::Eq,
                CompareOp::NotEq,
                CompareOp::Contains,
                CompareOp::NotContains,
                CompareOp::StartsWith,
                CompareOp::EndsWith,
            ],
            Comparators::Equality => &[CompareOp::Eq, CompareOp::NotEq],
            Comparators::Ordered => &[
                CompareOp::Eq,
                CompareOp::NotEq,
                CompareOp::Lt,
                CompareOp::Lte,
                CompareOp::Gt,
                CompareOp::Gte,
            ],
        }
    }

    pub fn allows(self, op: CompareOp) -> bool {
        self.ops().contains(&op)
    }

    /// Name of the grammar rule listing these comparators.
    pub fn rule(self) -> &'static str {
        match self {
            Comparators::String => "string_comp",
            Comparators::Equality => "eq_comp",
            Comparators::Ordered => "generic_comp",
        }
    }
}

/// Lexical class of the literal on the right-hand side of a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueToken {
    String,
    Bool,
    SignedInt,
    DateTime,
    Duration,
    Status,
}

impl ValueToken {
    /// Terminal name used in rendered grammars.
    pub fn terminal(self) -> &'static str {
        match self {
            ValueToken::String => "STRING",
            ValueToken::Bool => "BOOL",
            ValueToken::SignedInt => "SIGNED_INT",
            ValueToken::DateTime => "DATETIME",
            ValueToken::Duration => "DURATION",
            ValueToken::Status => "STATUS",
        }
    }

    /// Human description used in syntax error messages.
    pub fn describe(self) -> &'static str {
        match self {
            ValueToken::String => "string",
            ValueToken::Bool => "true or false",
            ValueToken::SignedInt => "signed integer",
            ValueToken::DateTime => "ISO-8601 datetime",
            ValueToken::Duration => "ISO-8601 duration",
            ValueToken::Status => "status name",
        }
    }
}

/// One `factor` alternative: `<field> <comparator> <value>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    pub field: &'static str,
    pub kind: FType,
    /// Map field addressed as `field.key` or `field['key']`.
    pub keyed: bool,
    pub comparators: Comparators,
    pub token: ValueToken,
}

/// Generated grammar for one resource type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarSpec {
    resource: String,
    productions: Vec<Production>,
    statuses: Vec<&'static str>,
}

impl GrammarSpec {
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Productions in field declaration order.
    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    pub fn production(&self, field: &str) -> Option<&Production> {
        self.productions.iter().find(|p| p.field == field)
    }

    /// Status literals accepted by STATUS productions, upper-case.
    pub fn statuses(&self) -> &[&'static str] {
        &self.statuses
    }

    /// Render the grammar as text. Equal specs render byte-identical text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("?start: expr\n\n");
        out.push_str("expr: term (\"or\"i term)*\n\n");
        out.push_str("term: factor (\"and\"i factor)*\n\n");
        out.push_str("factor: \"(\" expr \")\"");
        for p in &self.productions {
            let target = if p.keyed {
                format!("\"{}\" (\".\" KEY | \"[\" QUOTED \"]\")", p.field)
            } else {
                format!("\"{}\"", p.field)
            };
            out.push_str(&format!(
                "\n      | {} {} {} -> {}",
                target,
                p.comparators.rule(),
                p.token.terminal(),
                p.field
            ));
        }
        out.push_str("\n\n");

        for comparators in [Comparators::String, Comparators::Equality, Comparators::Ordered] {
            if !self.productions.iter().any(|p| p.comparators == comparators) {
                continue;
            }
            let names: Vec<&str> = comparators.ops().iter().map(|op| op_terminal(*op)).collect();
            out.push_str(&format!("{}: {}\n", comparators.rule(), names.join(" | ")));
        }
        out.push('\n');

        for op in Comparators::String.ops().iter().chain(&Comparators::Ordered.ops()[2..]) {
            let literal = match op.symbol() {
                s if s.chars().all(|c| c.is_ascii_alphabetic()) => format!("\"{}\"i", s),
                s => format!("\"{}\"", s),
            };
            out.push_str(&format!("{}: {}\n", op_terminal(*op), literal));
        }
        out.push('\n');

        out.push_str("QUOTED: /'(\\\\.|[^'\\\\])*'/ | /\"(\\\\.|[^\"\\\\])*\"/\n");
        out.push_str("KEY: /[^\\s()'\"=!<>\\[\\]]+/\n");
        out.push_str("STRING: QUOTED | /[^\\s()'\"]+/\n");
        out.push_str("BOOL: \"true\"i | \"false\"i\n");
        out.push_str("SIGNED_INT: /[+-]?\\d+/\n");
        out.push_str("DATETIME: /[^\\s()'\"]+/  // ISO 8601 (e.g., 2024-12-28T14:00:00Z)\n");
        out.push_str("DURATION: /[^\\s()'\"]+/  // ISO 8601 (e.g., P1Y2M3DT4H5M6S)\n");
        if !self.statuses.is_empty() {
            let names: Vec<String> = self
                .statuses
                .iter()
                .map(|s| format!("\"{}\"i", s.to_ascii_lowercase()))
                .collect();
            out.push_str(&format!("STATUS: {}\n", names.join(" | ")));
        }
        out.push_str("\n%ignore WS\n");
        out
    }
}

fn op_terminal(op: CompareOp) -> &'static str {
    match op {
        CompareOp::Eq => "EQ",
        CompareOp::NotEq => "NEQ",
        CompareOp::Lt => "LT",
        CompareOp::Lte => "LTE",
        CompareOp::Gt => "GT",
        CompareOp::Gte => "GTE",
        CompareOp::Contains => "CONTAINS",
        CompareOp::NotContains => "NOTCONTAINS",
        CompareOp::StartsWith => "STARTSWITH",
        CompareOp::EndsWith => "ENDSWITH",
    }
}

/// Build the grammar of a resource from its schema.
pub fn for_resource(resource: ResourceType) -> Result<GrammarSpec> {
    let schema = resource.schema();
    generate(resource.name(), schema.fields(), schema.statuses())
}

/// Build a grammar from an ordered field list and optional status vocabulary.
///
/// ARRAY, NOT_APPLICABLE and UNKNOWN fields produce no alternative. A STATUS
/// field without a vocabulary, or a keyed field whose entries are not
/// STRING, cannot be expressed and aborts generation.
pub fn generate(
    resource: &str,
    fields: &[FieldDescriptor],
    statuses: Option<&[StatusValue]>,
) -> Result<GrammarSpec> {
    let mut productions = Vec::with_capacity(fields.len());
    for field in fields {
        let unsupported = || Error::UnsupportedFieldKind {
            resource: resource.to_string(),
            field: field.name.to_string(),
            kind: field.kind,
        };
        if field.keyed && field.kind != FType::String {
            return Err(unsupported());
        }
        let (comparators, token) = match field.kind {
            FType::String => (Comparators::String, ValueToken::String),
            FType::Boolean => (Comparators::Equality, ValueToken::Bool),
            FType::Number => (Comparators::Ordered, ValueToken::SignedInt),
            FType::Date => (Comparators::Ordered, ValueToken::DateTime),
            FType::Duration => (Comparators::Ordered, ValueToken::Duration),
            FType::Status if statuses.is_some_and(|s| !s.is_empty()) => {
                (Comparators::Equality, ValueToken::Status)
            }
            FType::Status => return Err(unsupported()),
            FType::Array | FType::NotApplicable | FType::Unknown => continue,
        };
        productions.push(Production {
            field: field.name,
            kind: field.kind,
            keyed: field.keyed,
            comparators,
            token,
        });
    }

    let statuses = if productions.iter().any(|p| p.token == ValueToken::Status) {
        statuses.unwrap_or_default().iter().map(|s| s.name).collect()
    } else {
        Vec::new()
    };

    Ok(GrammarSpec {
        resource: resource.to_string(),
        productions,
        statuses,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_is_deterministic() {
        for resource in ResourceType::ALL {
            let first = for_resource(resource).unwrap();
            let second = for_resource(resource).unwrap();
            assert_eq!(first, second);
            assert_eq!(first.render(), second.render());
        }
    }

    #[test]
    fn test_same_fields_same_text() {
        let fields = [
            FieldDescriptor::new("name", FType::String),
            FieldDescriptor::new("size", FType::Number),
        ];
        let a = generate("Thing", &fields, None).unwrap();
        let b = generate("Thing", &fields.to_vec(), None).unwrap();
        assert_eq!(a.render().as_bytes(), b.render().as_bytes());
    }

    #[test]
    fn test_unfilterable_kinds_excluded() {
        let grammar = for_resource(ResourceType::Session).unwrap();
        assert!(grammar.production("partition_ids").is_none());
        assert!(grammar.production("options_raw").is_none());
        let grammar = for_resource(ResourceType::Partition).unwrap();
        assert!(grammar.production("pod_configuration").is_none());
        assert!(grammar.production("parent_partition_ids").is_none());
        assert!(!grammar.render().contains("pod_configuration"));
    }

    #[test]
    fn test_production_per_kind() {
        let grammar = for_resource(ResourceType::Session).unwrap();
        let p = grammar.production("session_id").unwrap();
        assert_eq!((p.comparators, p.token), (Comparators::String, ValueToken::String));
        let p = grammar.production("status").unwrap();
        assert_eq!((p.comparators, p.token), (Comparators::Equality, ValueToken::Status));
        let p = grammar.production("client_submission").unwrap();
        assert_eq!((p.comparators, p.token), (Comparators::Equality, ValueToken::Bool));
        let p = grammar.production("created_at").unwrap();
        assert_eq!((p.comparators, p.token), (Comparators::Ordered, ValueToken::DateTime));
        let p = grammar.production("duration").unwrap();
        assert_eq!((p.comparators, p.token), (Comparators::Ordered, ValueToken::Duration));
        let p = grammar.production("options").unwrap();
        assert!(p.keyed);
        assert_eq!(p.token, ValueToken::String);
    }

    #[test]
    fn test_productions_keep_field_order() {
        let grammar = for_resource(ResourceType::Result).unwrap();
        let names: Vec<&str> = grammar.productions().iter().map(|p| p.field).collect();
        assert_eq!(
            names,
            vec![
                "result_id",
                "session_id",
                "name",
                "owner_task_id",
                "created_by",
                "status",
                "created_at",
                "completed_at",
                "size",
                "manual_deletion"
            ]
        );
    }

    #[test]
    fn test_status_without_vocabulary_is_fatal() {
        let fields = [FieldDescriptor::new("status", FType::Status)];
        let err = generate("Partition", &fields, None).unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedFieldKind { kind: FType::Status, ref field, .. } if field == "status"
        ));
    }

    #[test]
    fn test_keyed_non_string_is_fatal() {
        let fields = [
            FieldDescriptor::new("name", FType::String),
            FieldDescriptor::keyed("limits", FType::Number),
        ];
        assert!(matches!(
            generate("Thing", &fields, None),
            Err(Error::UnsupportedFieldKind { .. })
        ));
    }

    #[test]
    fn test_render_session() {
        let text = for_resource(ResourceType::Session).unwrap().render();
        assert!(text.starts_with("?start: expr\n\nexpr: term (\"or\"i term)*\n\nterm: factor (\"and\"i factor)*\n\nfactor: \"(\" expr \")\""));
        assert!(text.contains("\n      | \"session_id\" string_comp STRING -> session_id"));
        assert!(text.contains("\n      | \"status\" eq_comp STATUS -> status"));
        assert!(text.contains("\n      | \"created_at\" generic_comp DATETIME -> created_at"));
        assert!(text.contains(
            "\n      | \"options\" (\".\" KEY | \"[\" QUOTED \"]\") string_comp STRING -> options"
        ));
        assert!(text.contains("string_comp: EQ | NEQ | CONTAINS | NOTCONTAINS | STARTSWITH | ENDSWITH\n"));
        assert!(text.contains("STATUS: \"unspecified\"i | \"running\"i | \"cancelled\"i"));
        assert!(text.contains("NOTCONTAINS: \"notcontains\"i\n"));
        assert!(text.contains("LTE: \"<=\"\n"));
    }

    #[test]
    fn test_render_line_layout() {
        let text = for_resource(ResourceType::Task).unwrap().render();
        assert!(text.ends_with("\n\n%ignore WS\n"));
        let lines: Vec<&str> = text.lines().collect();
        let rules = lines.iter().position(|l| l.starts_with("string_comp:")).unwrap();
        assert_eq!(lines[rules - 1], "");
        assert!(lines[rules + 1].starts_with("eq_comp:"));
        assert!(lines[rules + 2].starts_with("generic_comp:"));
        assert_eq!(lines[rules + 3], "");
        assert!(lines.iter().any(|l| l.starts_with("STATUS: \"unspecified\"i")));
        assert!(lines.iter().all(|l| !l.contains("STATUS: ") || l.ends_with('i')));
    }

    #[test]
    fn test_render_partition_has_no_status_terminal() {
        let text = for_resource(ResourceType::Partition).unwrap().render();
        assert!(!text.contains("STATUS:"));
        assert!(!text.contains("eq_comp:"));
        assert!(text.contains("\"pod_max\" generic_comp SIGNED_INT -> pod_max"));
    }
}
