//! Record kinds and the behaviour shared by every named record.

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{AlarmHubError, InvalidSelectorError};

/// The four named collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordKind {
    Action,
    DaySelector,
    DayGroup,
    Alarm,
}

impl RecordKind {
    /// Every kind, in linking order (a kind only references kinds before it,
    /// or itself).
    pub const ALL: [Self; 4] = [Self::DaySelector, Self::DayGroup, Self::Action, Self::Alarm];

    /// Stable identifier used as a storage key.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Action => "action",
            Self::DaySelector => "day-selector",
            Self::DayGroup => "day-group",
            Self::Alarm => "alarm",
        }
    }

    /// Kinds that must be re-linked after a collection of this kind changes,
    /// starting with the kind itself.
    ///
    /// Alarms embed day groups which embed day selectors, so alarms appear in
    /// every list.
    #[must_use]
    pub fn dependents(self) -> &'static [Self] {
        match self {
            Self::DaySelector => &[Self::DaySelector, Self::DayGroup, Self::Alarm],
            Self::DayGroup => &[Self::DayGroup, Self::Alarm],
            Self::Action => &[Self::Action, Self::Alarm],
            Self::Alarm => &[Self::Alarm],
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Action => "action",
            Self::DaySelector => "day selector",
            Self::DayGroup => "day group",
            Self::Alarm => "alarm",
        })
    }
}

/// A named, storable record.
pub trait Record: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Which collection the record belongs to.
    const KIND: RecordKind;

    /// Known values of the JSON `type` tag; empty for untagged records.
    const TAGS: &'static [&'static str];

    /// The unique key of the record within its collection.
    fn name(&self) -> &str;

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`AlarmHubError::Validation`] when a field is out of range.
    fn validate(&self) -> Result<(), AlarmHubError>;

    /// Copy of the record with every resolved reference replaced by a bare
    /// name stub.
    #[must_use]
    fn normalized(&self) -> Self;

    /// Outgoing references as `(kind, name)` pairs, resolved or not.
    fn references(&self) -> Vec<(RecordKind, &str)>;

    /// Reject a raw JSON body whose `type` tag is not one of [`Self::TAGS`].
    ///
    /// A missing tag is left for the deserializer to report.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidSelectorError`] naming the unknown tag.
    fn check_tags(value: &serde_json::Value) -> Result<(), InvalidSelectorError> {
        check_tag(Self::KIND, Self::TAGS, value)
    }
}

pub(crate) fn check_tag(
    kind: RecordKind,
    tags: &[&str],
    value: &serde_json::Value,
) -> Result<(), InvalidSelectorError> {
    if tags.is_empty() {
        return Ok(());
    }
    match value.get("type").and_then(serde_json::Value::as_str) {
        Some(tag) if !tags.contains(&tag) => Err(InvalidSelectorError {
            kind,
            tag: tag.to_string(),
        }),
        _ => Ok(()),
    }
}

pub(crate) fn validate_name(name: &str) -> Result<(), AlarmHubError> {
    if name.is_empty() {
        return Err(crate::error::ValidationError::EmptyName.into());
    }
    Ok(())
}
