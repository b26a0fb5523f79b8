use serde::{Deserialize, Serialize};

use crate::ValidTime;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ValueType {
    Str = 1,
    I64 = 2,
    F64 = 3,
    Bool = 4,
    Time = 5,
}

impl ValueType {
    pub fn as_i16(self) -> i16 {
        self as i16
    }

    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            1 => Some(ValueType::Str),
            2 => Some(ValueType::I64),
            3 => Some(ValueType::F64),
            4 => Some(ValueType::Bool),
            5 => Some(ValueType::Time),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Str(String),
    I64(i64),
    F64(f64),
    Bool(bool),
    Time(ValidTime),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Str(_) => ValueType::Str,
            Value::I64(_) => ValueType::I64,
            Value::F64(_) => ValueType::F64,
            Value::Bool(_) => ValueType::Bool,
            Value::Time(_) => ValueType::Time,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }
}

/// Reference kinds whose diff values may arrive as human-readable names and
/// need a name→id lookup.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefKind {
    Kind,
    Status,
    Priority,
    Category,
    Milestone,
    User,
}

/// The state-model whitelist. Diff keys outside this enum are
/// unrepresentable, so "unknown key" is a parse-time case, not a runtime one.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKey {
    Subject,
    Description,
    ContainerId,
    KindId,
    StatusId,
    PriorityId,
    AuthorId,
    AssigneeId,
    CategoryId,
    MilestoneId,
    StartDate,
    DueDate,
    EstimatedHours,
    DoneRatio,
    IsPrivate,
    ManualScheduling,
}

impl AttributeKey {
    pub const ALL: [AttributeKey; 16] = [
        AttributeKey::Subject,
        AttributeKey::Description,
        AttributeKey::ContainerId,
        AttributeKey::KindId,
        AttributeKey::StatusId,
        AttributeKey::PriorityId,
        AttributeKey::AuthorId,
        AttributeKey::AssigneeId,
        AttributeKey::CategoryId,
        AttributeKey::MilestoneId,
        AttributeKey::StartDate,
        AttributeKey::DueDate,
        AttributeKey::EstimatedHours,
        AttributeKey::DoneRatio,
        AttributeKey::IsPrivate,
        AttributeKey::ManualScheduling,
    ];

    /// Keys the storage layer rejects as NULL; absent values are backfilled
    /// from the entity baseline.
    pub const REQUIRED: [AttributeKey; 6] = [
        AttributeKey::ContainerId,
        AttributeKey::KindId,
        AttributeKey::StatusId,
        AttributeKey::AuthorId,
        AttributeKey::IsPrivate,
        AttributeKey::ManualScheduling,
    ];

    pub fn value_type(self) -> ValueType {
        match self {
            AttributeKey::Subject | AttributeKey::Description => ValueType::Str,
            AttributeKey::ContainerId
            | AttributeKey::KindId
            | AttributeKey::StatusId
            | AttributeKey::PriorityId
            | AttributeKey::AuthorId
            | AttributeKey::AssigneeId
            | AttributeKey::CategoryId
            | AttributeKey::MilestoneId
            | AttributeKey::DoneRatio => ValueType::I64,
            AttributeKey::StartDate | AttributeKey::DueDate => ValueType::Time,
            AttributeKey::EstimatedHours => ValueType::F64,
            AttributeKey::IsPrivate | AttributeKey::ManualScheduling => ValueType::Bool,
        }
    }

    pub fn reference(self) -> Option<RefKind> {
        match self {
            AttributeKey::KindId => Some(RefKind::Kind),
            AttributeKey::StatusId => Some(RefKind::Status),
            AttributeKey::PriorityId => Some(RefKind::Priority),
            AttributeKey::AssigneeId => Some(RefKind::User),
            AttributeKey::CategoryId => Some(RefKind::Category),
            AttributeKey::MilestoneId => Some(RefKind::Milestone),
            _ => None,
        }
    }

    pub fn is_required(self) -> bool {
        Self::REQUIRED.contains(&self)
    }
}

/// Attributes whose changes (not full state) are recorded separately.
/// Disjoint from [`AttributeKey`].
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TrackedKey {
    Workflow,
    Resolution,
}

impl TrackedKey {
    pub const ALL: [TrackedKey; 2] = [TrackedKey::Workflow, TrackedKey::Resolution];

    pub fn as_i16(self) -> i16 {
        match self {
            TrackedKey::Workflow => 1,
            TrackedKey::Resolution => 2,
        }
    }

    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            1 => Some(TrackedKey::Workflow),
            2 => Some(TrackedKey::Resolution),
            _ => None,
        }
    }
}
