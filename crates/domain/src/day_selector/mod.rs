//! Day selector: a named rule that picks one calendar day per year.
//!
//! Months are 0-based (`0` is January), `day` fields are 0-based (`0` is the
//! 1st of the month) and days of the week run from `0` (Sunday) to `6`
//! (Saturday). The JSON shape keeps these conventions so stored bodies stay
//! compatible with existing data.

mod resolve;

use serde::{Deserialize, Serialize};

use crate::error::{AlarmHubError, ValidationError};
use crate::record::{Record, RecordKind, validate_name};
use crate::reference::{Index, Ref};

/// A named recurring day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySelector {
    pub name: String,
    #[serde(flatten)]
    pub rule: DayRule,
}

/// How a [`DaySelector`] picks its day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DayRule {
    /// A fixed month and day, e.g. Christmas.
    #[serde(rename = "exact-date")]
    ExactDate { month: u32, day: u32 },

    /// `day_of_week` within the `n`-th complete (Sunday to Saturday) week of
    /// the month. Negative `n` counts from the last complete week (`-1`).
    #[serde(rename = "donwom")]
    DayOfNthWeekOfMonth {
        month: u32,
        #[serde(rename = "dayOfWeek")]
        day_of_week: u32,
        n: i32,
    },

    /// The `n`-th `day_of_week` of the month (0-based), e.g. the 4th
    /// Thursday of November is `n = 3`. Negative `n` counts from the end
    /// (`-1` is the last one).
    #[serde(rename = "ndowom")]
    NthDayOfWeekOfMonth {
        month: u32,
        #[serde(rename = "dayOfWeek")]
        day_of_week: u32,
        n: i32,
    },

    /// A fixed date observed on the nearest weekday: Saturday moves back to
    /// Friday, Sunday moves forward to Monday.
    #[serde(rename = "dmboowd")]
    ObservedOnWeekday { month: u32, day: u32 },

    /// The first `day_of_week` after the first full moon on or after the
    /// start date, e.g. Easter Sunday.
    #[serde(rename = "dowafmadom")]
    AfterFullMoon {
        #[serde(rename = "startMonth")]
        start_month: u32,
        #[serde(rename = "startDay")]
        start_day: u32,
        #[serde(rename = "dayOfWeekAfterFullMoon")]
        day_of_week: u32,
    },

    /// Another day shifted by `days_relative` days (negative is before).
    #[serde(rename = "drtod")]
    RelativeToDay {
        #[serde(rename = "relativeDay")]
        relative_day: Ref<DaySelector>,
        #[serde(rename = "daysRelative")]
        days_relative: i32,
    },
}

impl DaySelector {
    #[must_use]
    pub fn new(name: impl Into<String>, rule: DayRule) -> Self {
        Self {
            name: name.into(),
            rule,
        }
    }

    /// Copy with the relative-day reference pointed at `selectors`.
    ///
    /// # Errors
    ///
    /// Returns [`AlarmHubError::UnresolvedReference`] when the referenced
    /// day selector is not in `selectors`.
    pub fn denormalized(&self, selectors: &Index<DaySelector>) -> Result<Self, AlarmHubError> {
        let rule = match &self.rule {
            DayRule::RelativeToDay {
                relative_day,
                days_relative,
            } => DayRule::RelativeToDay {
                relative_day: relative_day.link(selectors, (Self::KIND, &self.name))?,
                days_relative: *days_relative,
            },
            other => other.clone(),
        };
        Ok(Self::new(self.name.clone(), rule))
    }
}

fn check_month(month: u32) -> Result<(), ValidationError> {
    if month > 11 {
        return Err(ValidationError::MonthOutOfRange { month });
    }
    Ok(())
}

fn check_day(day: u32) -> Result<(), ValidationError> {
    if day > 30 {
        return Err(ValidationError::DayOutOfRange { day });
    }
    Ok(())
}

pub(crate) fn check_day_of_week(day_of_week: u32) -> Result<(), ValidationError> {
    if day_of_week > 6 {
        return Err(ValidationError::DayOfWeekOutOfRange { day_of_week });
    }
    Ok(())
}

impl Record for DaySelector {
    const KIND: RecordKind = RecordKind::DaySelector;
    const TAGS: &'static [&'static str] = &[
        "exact-date",
        "donwom",
        "ndowom",
        "dmboowd",
        "dowafmadom",
        "drtod",
    ];

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), AlarmHubError> {
        validate_name(&self.name)?;
        match &self.rule {
            DayRule::ExactDate { month, day } | DayRule::ObservedOnWeekday { month, day } => {
                check_month(*month)?;
                check_day(*day)?;
            }
            DayRule::DayOfNthWeekOfMonth {
                month, day_of_week, ..
            }
            | DayRule::NthDayOfWeekOfMonth {
                month, day_of_week, ..
            } => {
                check_month(*month)?;
                check_day_of_week(*day_of_week)?;
            }
            DayRule::AfterFullMoon {
                start_month,
                start_day,
                day_of_week,
            } => {
                check_month(*start_month)?;
                check_day(*start_day)?;
                check_day_of_week(*day_of_week)?;
            }
            DayRule::RelativeToDay { .. } => {}
        }
        Ok(())
    }

    fn normalized(&self) -> Self {
        let rule = match &self.rule {
            DayRule::RelativeToDay {
                relative_day,
                days_relative,
            } => DayRule::RelativeToDay {
                relative_day: relative_day.to_stub(),
                days_relative: *days_relative,
            },
            other => other.clone(),
        };
        Self::new(self.name.clone(), rule)
    }

    fn references(&self) -> Vec<(RecordKind, &str)> {
        match &self.rule {
            DayRule::RelativeToDay { relative_day, .. } => {
                vec![(RecordKind::DaySelector, relative_day.name())]
            }
            DayRule::ExactDate { .. }
            | DayRule::DayOfNthWeekOfMonth { .. }
            | DayRule::NthDayOfWeekOfMonth { .. }
            | DayRule::ObservedOnWeekday { .. }
            | DayRule::AfterFullMoon { .. } => Vec::new(),
        }
    }
}
