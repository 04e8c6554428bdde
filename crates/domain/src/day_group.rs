//! Day group: a named set of day selectors, e.g. "NYSE holidays".

use serde::{Deserialize, Serialize};

use crate::day_selector::DaySelector;
use crate::error::AlarmHubError;
use crate::record::{Record, RecordKind, validate_name};
use crate::reference::{Index, Ref};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayGroup {
    pub name: String,
    pub days: Vec<Ref<DaySelector>>,
}

impl DayGroup {
    #[must_use]
    pub fn new(name: impl Into<String>, days: Vec<Ref<DaySelector>>) -> Self {
        Self {
            name: name.into(),
            days,
        }
    }

    /// Copy with every member pointed at `selectors`.
    ///
    /// # Errors
    ///
    /// Returns [`AlarmHubError::UnresolvedReference`] for a member missing
    /// from `selectors`.
    pub fn denormalized(&self, selectors: &Index<DaySelector>) -> Result<Self, AlarmHubError> {
        let days = self
            .days
            .iter()
            .map(|day| day.link(selectors, (Self::KIND, &self.name)))
            .collect::<Result<_, _>>()?;
        Ok(Self::new(self.name.clone(), days))
    }
}

impl Record for DayGroup {
    const KIND: RecordKind = RecordKind::DayGroup;
    const TAGS: &'static [&'static str] = &[];

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), AlarmHubError> {
        validate_name(&self.name)
    }

    fn normalized(&self) -> Self {
        Self::new(
            self.name.clone(),
            self.days.iter().map(Ref::to_stub).collect(),
        )
    }

    fn references(&self) -> Vec<(RecordKind, &str)> {
        self.days
            .iter()
            .map(|day| (RecordKind::DaySelector, day.name()))
            .collect()
    }
}
