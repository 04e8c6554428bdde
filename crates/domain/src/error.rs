//! Common error types used across the workspace.
//!
//! Each failure has its own typed error; [`AlarmHubError`] gathers them with
//! `#[from]` conversions so every layer can use `?`.

use crate::record::RecordKind;

/// Top-level error for every fallible operation in alarmhub.
#[derive(Debug, thiserror::Error)]
pub enum AlarmHubError {
    /// A record failed its invariants.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// No record with the requested name exists.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// A record with the same name already exists.
    #[error(transparent)]
    Conflict(#[from] ConflictError),

    /// A name reference points at a record that does not exist.
    #[error(transparent)]
    UnresolvedReference(#[from] UnresolvedReferenceError),

    /// Name references loop back onto themselves.
    #[error(transparent)]
    CyclicReference(#[from] CyclicReferenceError),

    /// A stored type tag is outside the known variant set.
    #[error(transparent)]
    InvalidSelector(#[from] InvalidSelectorError),

    /// A record cannot be deleted while other records reference it.
    #[error(transparent)]
    InUse(#[from] InUseError),

    /// The persistence layer failed.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Field-level invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("month {month} is out of range (expected 0..=11)")]
    MonthOutOfRange { month: u32 },
    #[error("day {day} is out of range (expected 0..=30)")]
    DayOutOfRange { day: u32 },
    #[error("day of week {day_of_week} is out of range (expected 0..=6)")]
    DayOfWeekOutOfRange { day_of_week: u32 },
    #[error("hour {hour} is out of range (expected 0..=12)")]
    HourOutOfRange { hour: u32 },
    #[error("minute {minute} is out of range (expected 0..=59)")]
    MinuteOutOfRange { minute: u32 },
    #[error("composite action has no sub-actions")]
    NoSubActions,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} not found: {name}")]
pub struct NotFoundError {
    pub kind: RecordKind,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} already exists: {name}")]
pub struct ConflictError {
    pub kind: RecordKind,
    pub name: String,
}

/// Raised while linking when `record` names a `target_kind` that is missing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} '{record}' references unknown {target_kind} '{reference}'")]
pub struct UnresolvedReferenceError {
    pub kind: RecordKind,
    pub record: String,
    pub target_kind: RecordKind,
    pub reference: String,
}

/// `chain` lists the names visited, ending with the name that closed the loop.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cyclic {kind} references: {}", .chain.join(" -> "))]
pub struct CyclicReferenceError {
    pub kind: RecordKind,
    pub chain: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} type '{tag}'")]
pub struct InvalidSelectorError {
    pub kind: RecordKind,
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} '{name}' is still referenced by {referrer_kind} '{referrer}'")]
pub struct InUseError {
    pub kind: RecordKind,
    pub name: String,
    pub referrer_kind: RecordKind,
    pub referrer: String,
}
