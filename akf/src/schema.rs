//! Filterable field catalogue for ArmoniK resources.
//!
//! Each resource type owns a static, ordered list of field descriptors and,
//! when the resource has a lifecycle, its status vocabulary. Nothing here is
//! mutated at runtime.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::{Error, Result};

/// Kind of a resource field, deciding which comparators and literals apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FType {
    String,
    Boolean,
    Number,
    Date,
    Duration,
    Status,
    Array,
    /// Present on the resource but not filterable.
    NotApplicable,
    /// Present on the resource with a kind the API does not expose.
    Unknown,
}

impl FType {
    /// Whether a field of this kind can appear in a filter expression.
    pub fn is_filterable(self) -> bool {
        !matches!(self, FType::Array | FType::NotApplicable | FType::Unknown)
    }
}

impl fmt::Display for FType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FType::String => "STRING",
            FType::Boolean => "BOOLEAN",
            FType::Number => "NUMBER",
            FType::Date => "DATE",
            FType::Duration => "DURATION",
            FType::Status => "STATUS",
            FType::Array => "ARRAY",
            FType::NotApplicable => "NOT_APPLICABLE",
            FType::Unknown => "UNKNOWN",
        };
        write!(f, "{}", name)
    }
}

/// A named attribute of a resource and its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FType,
    /// Map-valued field addressed as `name.key` or `name['key']`.
    pub keyed: bool,
}

impl FieldDescriptor {
    pub const fn new(name: &'static str, kind: FType) -> Self {
        Self {
            name,
            kind,
            keyed: false,
        }
    }

    pub const fn keyed(name: &'static str, kind: FType) -> Self {
        Self {
            name,
            kind,
            keyed: true,
        }
    }
}

/// One member of a resource's status enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct StatusValue {
    /// Upper-case enumerator name (e.g. `RUNNING`).
    pub name: &'static str,
    /// Numeric value sent on the wire.
    pub code: i32,
}

impl fmt::Display for StatusValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name.to_ascii_lowercase())
    }
}

/// Filterable ArmoniK resource types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceType {
    Session,
    Task,
    Result,
    Partition,
}

impl ResourceType {
    pub const ALL: [ResourceType; 4] = [
        ResourceType::Session,
        ResourceType::Task,
        ResourceType::Result,
        ResourceType::Partition,
    ];

    /// Resolve a resource selector, case-insensitively, singular or plural.
    pub fn from_name(name: &str) -> Result<Self> {
        let normalized = name.trim().to_ascii_lowercase();
        let singular = normalized.strip_suffix('s').unwrap_or(&normalized);
        match singular {
            "session" => Ok(ResourceType::Session),
            "task" => Ok(ResourceType::Task),
            "result" => Ok(ResourceType::Result),
            "partition" => Ok(ResourceType::Partition),
            _ => Err(Error::UnknownResourceType(name.to_string())),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ResourceType::Session => "Session",
            ResourceType::Task => "Task",
            ResourceType::Result => "Result",
            ResourceType::Partition => "Partition",
        }
    }

    pub fn schema(self) -> &'static Schema {
        match self {
            ResourceType::Session => &SESSION,
            ResourceType::Task => &TASK,
            ResourceType::Result => &RESULT,
            ResourceType::Partition => &PARTITION,
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ResourceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

/// Field catalogue of one resource type.
#[derive(Debug)]
pub struct Schema {
    resource: ResourceType,
    fields: &'static [FieldDescriptor],
    statuses: Option<&'static [StatusValue]>,
}

impl Schema {
    pub fn resource(&self) -> ResourceType {
        self.resource
    }

    /// All fields in declaration order, filterable or not.
    pub fn fields(&self) -> &'static [FieldDescriptor] {
        self.fields
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn statuses(&self) -> Option<&'static [StatusValue]> {
        self.statuses
    }

    /// Look up a status by name, ignoring case.
    pub fn status(&self, name: &str) -> Option<StatusValue> {
        self.statuses?
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .copied()
    }
}

use FType::{Array, Boolean, Date, Duration, NotApplicable, Number, Status, Unknown};

static SESSION_FIELDS: [FieldDescriptor; 13] = [
    FieldDescriptor::new("session_id", FType::String),
    FieldDescriptor::new("status", Status),
    FieldDescriptor::new("client_submission", Boolean),
    FieldDescriptor::new("worker_submission", Boolean),
    FieldDescriptor::new("partition_ids", Array),
    FieldDescriptor::keyed("options", FType::String),
    FieldDescriptor::new("created_at", Date),
    FieldDescriptor::new("cancelled_at", Date),
    FieldDescriptor::new("closed_at", Date),
    FieldDescriptor::new("purged_at", Date),
    FieldDescriptor::new("deleted_at", Date),
    FieldDescriptor::new("duration", Duration),
    FieldDescriptor::new("options_raw", NotApplicable),
];

static TASK_FIELDS: [FieldDescriptor; 31] = [
    FieldDescriptor::new("id", FType::String),
    FieldDescriptor::new("session_id", FType::String),
    FieldDescriptor::new("owner_pod_id", FType::String),
    FieldDescriptor::new("initial_task_id", FType::String),
    FieldDescriptor::new("payload_id", FType::String),
    FieldDescriptor::new("created_by", FType::String),
    FieldDescriptor::new("pod_hostname", FType::String),
    FieldDescriptor::new("status", Status),
    FieldDescriptor::new("created_at", Date),
    FieldDescriptor::new("submitted_at", Date),
    FieldDescriptor::new("received_at", Date),
    FieldDescriptor::new("acquired_at", Date),
    FieldDescriptor::new("fetched_at", Date),
    FieldDescriptor::new("started_at", Date),
    FieldDescriptor::new("processed_at", Date),
    FieldDescriptor::new("ended_at", Date),
    FieldDescriptor::new("pod_ttl", Date),
    FieldDescriptor::new("creation_to_end_duration", Duration),
    FieldDescriptor::new("processing_to_end_duration", Duration),
    FieldDescriptor::new("received_to_end_duration", Duration),
    FieldDescriptor::new("parent_task_ids", Array),
    FieldDescriptor::new("data_dependencies", Array),
    FieldDescriptor::new("expected_output_ids", Array),
    FieldDescriptor::new("retry_of_ids", Array),
    FieldDescriptor::new("count_data_dependencies", Number),
    FieldDescriptor::new("count_expected_output_ids", Number),
    FieldDescriptor::new("count_parent_task_ids", Number),
    FieldDescriptor::new("count_retry_of_ids", Number),
    FieldDescriptor::keyed("options", FType::String),
    FieldDescriptor::new("output", NotApplicable),
    FieldDescriptor::new("status_message", Unknown),
];

static RESULT_FIELDS: [FieldDescriptor; 11] = [
    FieldDescriptor::new("result_id", FType::String),
    FieldDescriptor::new("session_id", FType::String),
    FieldDescriptor::new("name", FType::String),
    FieldDescriptor::new("owner_task_id", FType::String),
    FieldDescriptor::new("created_by", FType::String),
    FieldDescriptor::new("status", Status),
    FieldDescriptor::new("created_at", Date),
    FieldDescriptor::new("completed_at", Date),
    FieldDescriptor::new("size", Number),
    FieldDescriptor::new("manual_deletion", Boolean),
    FieldDescriptor::new("opaque_id", NotApplicable),
];

static PARTITION_FIELDS: [FieldDescriptor; 7] = [
    FieldDescriptor::new("id", FType::String),
    FieldDescriptor::new("parent_partition_ids", Array),
    FieldDescriptor::new("pod_reserved", Number),
    FieldDescriptor::new("pod_max", Number),
    FieldDescriptor::new("preemption_percentage", Number),
    FieldDescriptor::new("priority", Number),
    FieldDescriptor::new("pod_configuration", Unknown),
];

static SESSION_STATUSES: [StatusValue; 7] = [
    StatusValue { name: "UNSPECIFIED", code: 0 },
    StatusValue { name: "RUNNING", code: 1 },
    StatusValue { name: "CANCELLED", code: 2 },
    StatusValue { name: "PAUSED", code: 3 },
    StatusValue { name: "CLOSED", code: 4 },
    StatusValue { name: "PURGED", code: 5 },
    StatusValue { name: "DELETED", code: 6 },
];

static TASK_STATUSES: [StatusValue; 14] = [
    StatusValue { name: "UNSPECIFIED", code: 0 },
    StatusValue { name: "CREATING", code: 1 },
    StatusValue { name: "SUBMITTED", code: 2 },
    StatusValue { name: "DISPATCHED", code: 3 },
    StatusValue { name: "COMPLETED", code: 4 },
    StatusValue { name: "ERROR", code: 5 },
    StatusValue { name: "TIMEOUT", code: 6 },
    StatusValue { name: "CANCELLING", code: 7 },
    StatusValue { name: "CANCELLED", code: 8 },
    StatusValue { name: "PROCESSING", code: 9 },
    StatusValue { name: "PROCESSED", code: 10 },
    StatusValue { name: "RETRIED", code: 11 },
    StatusValue { name: "PENDING", code: 12 },
    StatusValue { name: "PAUSED", code: 13 },
];

static RESULT_STATUSES: [StatusValue; 6] = [
    StatusValue { name: "UNSPECIFIED", code: 0 },
    StatusValue { name: "CREATED", code: 1 },
    StatusValue { name: "COMPLETED", code: 2 },
    StatusValue { name: "ABORTED", code: 3 },
    StatusValue { name: "DELETED", code: 4 },
    StatusValue { name: "NOTFOUND", code: 127 },
];

static SESSION: Schema = Schema {
    resource: ResourceType::Session,
    fields: &SESSION_FIELDS,
    statuses: Some(&SESSION_STATUSES),
};

static TASK: Schema = Schema {
    resource: ResourceType::Task,
    fields: &TASK_FIELDS,
    statuses: Some(&TASK_STATUSES),
};

static RESULT: Schema = Schema {
    resource: ResourceType::Result,
    fields: &RESULT_FIELDS,
    statuses: Some(&RESULT_STATUSES),
};

static PARTITION: Schema = Schema {
    resource: ResourceType::Partition,
    fields: &PARTITION_FIELDS,
    statuses: None,
};
