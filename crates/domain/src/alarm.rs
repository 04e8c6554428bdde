//! Alarm: a time of day, a set of days and the action fired then.

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::day_group::DayGroup;
use crate::error::{AlarmHubError, InvalidSelectorError, ValidationError};
use crate::record::{Record, RecordKind, check_tag, validate_name};
use crate::reference::{Index, Ref};

/// Days scanned by a weekday-mask alarm; one full week plus today.
const MASK_SCAN_DAYS: u64 = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alarm {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: AlarmKind,
    pub action: Ref<Action>,
    /// Lower values win when two alarms fire at the same instant.
    #[serde(default)]
    pub priority: i32,
    /// Run the opposite of the action (e.g. skip it on the selected days).
    #[serde(rename = "negateAction", default)]
    pub negate_action: bool,
    pub days: DayGroupSelector,
    /// 12-hour clock, with `12` meaning midnight or noon.
    pub hour: u32,
    pub minute: u32,
    #[serde(rename = "isPM")]
    pub is_pm: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlarmKind {
    #[default]
    #[serde(rename = "basic")]
    Basic,
}

/// Which days an [`Alarm`] fires on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DayGroupSelector {
    /// One flag per weekday, Sunday first.
    #[serde(rename = "dow")]
    DaysOfWeek {
        #[serde(rename = "daysOfWeek")]
        days_of_week: [bool; 7],
    },
    /// Every day of a named day group.
    #[serde(rename = "day-group")]
    DayGroup { group: Ref<DayGroup> },
}

const DAYS_TAGS: &[&str] = &["dow", "day-group"];

impl DayGroupSelector {
    /// Monday to Friday.
    #[must_use]
    pub fn weekdays() -> Self {
        Self::DaysOfWeek {
            days_of_week: [false, true, true, true, true, true, false],
        }
    }
}

impl Alarm {
    /// Copy with the action and day group pointed at the given indexes.
    ///
    /// # Errors
    ///
    /// Returns [`AlarmHubError::UnresolvedReference`] when the action or day
    /// group does not exist.
    pub fn denormalized(
        &self,
        actions: &Index<Action>,
        groups: &Index<DayGroup>,
    ) -> Result<Self, AlarmHubError> {
        let owner = (Self::KIND, self.name.as_str());
        let days = match &self.days {
            DayGroupSelector::DayGroup { group } => DayGroupSelector::DayGroup {
                group: group.link(groups, owner)?,
            },
            other @ DayGroupSelector::DaysOfWeek { .. } => other.clone(),
        };
        Ok(Self {
            action: self.action.link(actions, owner)?,
            days,
            ..self.clone()
        })
    }

    /// Wall-clock time the alarm fires at. `None` when the minute is out of
    /// range.
    #[must_use]
    pub fn time_of_day(&self) -> Option<NaiveTime> {
        let hour = self.hour % 12 + if self.is_pm { 12 } else { 0 };
        NaiveTime::from_hms_opt(hour, self.minute, 0)
    }

    /// Whether the alarm fires on `date`.
    ///
    /// # Errors
    ///
    /// Returns [`AlarmHubError::UnresolvedReference`] when the day group, or
    /// one of its selectors, is not linked.
    pub fn is_scheduled_on(&self, date: NaiveDate) -> Result<bool, AlarmHubError> {
        match &self.days {
            DayGroupSelector::DaysOfWeek { days_of_week } => {
                Ok(days_of_week[date.weekday().num_days_from_sunday() as usize])
            }
            DayGroupSelector::DayGroup { group } => {
                let group = group.require((Self::KIND, &self.name))?;
                for day in &group.days {
                    let selector = day.require((RecordKind::DayGroup, &group.name))?;
                    if selector.resolve(date.year())? == Some(date) {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    /// The first instant at or after `now` the alarm fires, or `None` when it
    /// never does (an empty mask or group).
    ///
    /// # Errors
    ///
    /// Returns [`AlarmHubError::UnresolvedReference`] when the day group, or
    /// one of its selectors, is not linked.
    pub fn next_trigger(&self, now: NaiveDateTime) -> Result<Option<NaiveDateTime>, AlarmHubError> {
        let Some(time) = self.time_of_day() else {
            return Ok(None);
        };
        match &self.days {
            DayGroupSelector::DaysOfWeek { days_of_week } => Ok((0..MASK_SCAN_DAYS)
                .filter_map(|offset| now.date().checked_add_days(Days::new(offset)))
                .filter(|date| days_of_week[date.weekday().num_days_from_sunday() as usize])
                .map(|date| date.and_time(time))
                .find(|at| *at >= now)),
            DayGroupSelector::DayGroup { group } => {
                let group = group.require((Self::KIND, &self.name))?;
                let mut earliest: Option<NaiveDateTime> = None;
                for day in &group.days {
                    let selector = day.require((RecordKind::DayGroup, &group.name))?;
                    for year in [now.year(), now.year() + 1] {
                        if let Some(date) = selector.resolve(year)?
                            && date.and_time(time) >= now
                        {
                            let at = date.and_time(time);
                            earliest = Some(earliest.map_or(at, |e| e.min(at)));
                            break;
                        }
                    }
                }
                Ok(earliest)
            }
        }
    }
}

impl Record for Alarm {
    const KIND: RecordKind = RecordKind::Alarm;
    const TAGS: &'static [&'static str] = &["basic"];

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), AlarmHubError> {
        validate_name(&self.name)?;
        if self.hour > 12 {
            return Err(ValidationError::HourOutOfRange { hour: self.hour }.into());
        }
        if self.minute > 59 {
            return Err(ValidationError::MinuteOutOfRange {
                minute: self.minute,
            }
            .into());
        }
        Ok(())
    }

    fn normalized(&self) -> Self {
        let days = match &self.days {
            DayGroupSelector::DayGroup { group } => DayGroupSelector::DayGroup {
                group: group.to_stub(),
            },
            other @ DayGroupSelector::DaysOfWeek { .. } => other.clone(),
        };
        Self {
            action: self.action.to_stub(),
            days,
            ..self.clone()
        }
    }

    fn references(&self) -> Vec<(RecordKind, &str)> {
        let mut refs = vec![(RecordKind::Action, self.action.name())];
        if let DayGroupSelector::DayGroup { group } = &self.days {
            refs.push((RecordKind::DayGroup, group.name()));
        }
        refs
    }

    fn check_tags(value: &serde_json::Value) -> Result<(), InvalidSelectorError> {
        check_tag(Self::KIND, Self::TAGS, value)?;
        match value.get("days") {
            Some(days) => check_tag(Self::KIND, DAYS_TAGS, days),
            None => Ok(()),
        }
    }
}
