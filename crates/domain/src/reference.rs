//! References between records.
//!
//! A [`Ref`] is either a bare name stub, as stored, or a shared handle to the
//! record it names, as handed to consumers after linking. In JSON a stub is
//! `{"name": "..."}` and a resolved reference is the full record.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{AlarmHubError, UnresolvedReferenceError};
use crate::record::{Record, RecordKind};

/// Name → linked record lookup for one collection.
pub type Index<T> = HashMap<String, Arc<T>>;

/// Build an [`Index`] over linked records. The first record wins on duplicate names.
#[must_use]
pub fn index<T: Record>(records: &[Arc<T>]) -> Index<T> {
    let mut index = Index::with_capacity(records.len());
    for record in records {
        index
            .entry(record.name().to_string())
            .or_insert_with(|| Arc::clone(record));
    }
    index
}

/// A reference to another record by name.
#[derive(Debug, Clone, PartialEq)]
pub enum Ref<T> {
    /// Bare name, not yet linked.
    Name(String),
    /// Linked record shared with the owning collection.
    Resolved(Arc<T>),
}

impl<T> Ref<T> {
    /// Build a bare name stub.
    #[must_use]
    pub fn stub(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// The linked record, if any.
    #[must_use]
    pub fn resolved(&self) -> Option<&Arc<T>> {
        match self {
            Self::Name(_) => None,
            Self::Resolved(record) => Some(record),
        }
    }

    /// Whether this reference holds a linked record.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

impl<T: Record> Ref<T> {
    /// Name of the referenced record.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Resolved(record) => record.name(),
        }
    }

    /// Bare stub naming the same record.
    #[must_use]
    pub fn to_stub(&self) -> Self {
        Self::Name(self.name().to_string())
    }

    /// Re-point this reference at the record of the same name in `index`.
    ///
    /// Already-resolved references are looked up again so that they follow
    /// the latest version of the target.
    ///
    /// # Errors
    ///
    /// Returns [`AlarmHubError::UnresolvedReference`] naming `owner` when the
    /// target is not in `index`.
    pub fn link(&self, index: &Index<T>, owner: (RecordKind, &str)) -> Result<Self, AlarmHubError> {
        let name = self.name();
        index
            .get(name)
            .map(|record| Self::Resolved(Arc::clone(record)))
            .ok_or_else(|| {
                UnresolvedReferenceError {
                    kind: owner.0,
                    record: owner.1.to_string(),
                    target_kind: T::KIND,
                    reference: name.to_string(),
                }
                .into()
            })
    }

    /// The linked record, or an error naming `owner` when this is a stub.
    ///
    /// # Errors
    ///
    /// Returns [`AlarmHubError::UnresolvedReference`] for a bare stub.
    pub fn require(&self, owner: (RecordKind, &str)) -> Result<&Arc<T>, AlarmHubError> {
        match self {
            Self::Resolved(record) => Ok(record),
            Self::Name(name) => Err(UnresolvedReferenceError {
                kind: owner.0,
                record: owner.1.to_string(),
                target_kind: T::KIND,
                reference: name.clone(),
            }
            .into()),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Repr<T> {
    Resolved(T),
    Stub { name: String },
}

#[derive(Serialize)]
struct StubRef<'a> {
    name: &'a str,
}

impl<T: Serialize> Serialize for Ref<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Name(name) => StubRef { name }.serialize(serializer),
            Self::Resolved(record) => record.as_ref().serialize(serializer),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Ref<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Repr::deserialize(deserializer)? {
            Repr::Resolved(record) => Self::Resolved(Arc::new(record)),
            Repr::Stub { name } => Self::Name(name),
        })
    }
}
