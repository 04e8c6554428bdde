//! Resolution of day selectors to concrete dates.

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Weekday};

use super::{DayRule, DaySelector};
use crate::error::AlarmHubError;
use crate::lunar;
use crate::record::Record;

/// Upper bound on the days scanned for a full moon; two synodic months.
const FULL_MOON_SEARCH_DAYS: u32 = 60;

impl DaySelector {
    /// The day this selector picks in `year`, or `None` when the rule has no
    /// such day that year (e.g. a 5th Monday, or February 29th in a common
    /// year).
    ///
    /// # Errors
    ///
    /// Returns [`AlarmHubError::UnresolvedReference`] when a relative-day rule
    /// still holds a bare name instead of a linked selector.
    pub fn resolve(&self, year: i32) -> Result<Option<NaiveDate>, AlarmHubError> {
        let date = match &self.rule {
            DayRule::ExactDate { month, day } => nth_of_month(year, *month, *day),
            DayRule::DayOfNthWeekOfMonth {
                month,
                day_of_week,
                n,
            } => day_of_complete_week(year, *month, *day_of_week, *n),
            DayRule::NthDayOfWeekOfMonth {
                month,
                day_of_week,
                n,
            } => nth_weekday_of_month(year, *month, *day_of_week, *n),
            DayRule::ObservedOnWeekday { month, day } => {
                nth_of_month(year, *month, *day).and_then(observed_on_weekday)
            }
            DayRule::AfterFullMoon {
                start_month,
                start_day,
                day_of_week,
            } => nth_of_month(year, *start_month, *start_day)
                .and_then(|start| weekday_after_full_moon(start, *day_of_week)),
            DayRule::RelativeToDay {
                relative_day,
                days_relative,
            } => relative_day
                .require((Self::KIND, &self.name))?
                .resolve(year)?
                .and_then(|date| date.checked_add_signed(TimeDelta::days(i64::from(*days_relative)))),
        };
        Ok(date)
    }

    /// The next day this selector picks, as seen from `now`.
    ///
    /// This year's day is kept while its start has not passed `now`;
    /// otherwise (or when this year has no such day) the following year's
    /// day is returned. The date stands for the start of that day.
    ///
    /// # Errors
    ///
    /// Propagates resolution errors from [`DaySelector::resolve`].
    pub fn next_occurrence(&self, now: NaiveDateTime) -> Result<Option<NaiveDate>, AlarmHubError> {
        let year = now.year();
        if let Some(date) = self.resolve(year)?
            && date.and_time(NaiveTime::MIN) >= now
        {
            return Ok(Some(date));
        }
        self.resolve(year + 1)
    }
}

/// Sunday-first day-of-week index, matching the stored convention.
fn weekday_index(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_sunday()
}

fn in_month(date: NaiveDate, year: i32, month: u32) -> bool {
    date.year() == year && date.month0() == month
}

/// The `(day + 1)`-th of the 0-based `month`.
fn nth_of_month(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month.checked_add(1)?, day.checked_add(1)?)
}

fn first_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month.checked_add(1)?, 1)
}

fn last_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    if month > 11 {
        return None;
    }
    let (next_year, next_month) = if month == 11 {
        (year.checked_add(1)?, 1)
    } else {
        (year, month + 2)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

/// Days past Sunday, or `None` outside `0..=6`.
fn day_offset(day_of_week: u32) -> Option<Days> {
    (day_of_week <= 6).then(|| Days::new(u64::from(day_of_week)))
}

/// First `day_of_week` on or after `date`.
fn forward_to(date: NaiveDate, day_of_week: u32) -> Option<NaiveDate> {
    day_offset(day_of_week)?;
    let delta = (day_of_week + 7 - weekday_index(date)) % 7;
    date.checked_add_days(Days::new(u64::from(delta)))
}

/// Last `day_of_week` on or before `date`.
fn back_to(date: NaiveDate, day_of_week: u32) -> Option<NaiveDate> {
    day_offset(day_of_week)?;
    let delta = (weekday_index(date) + 7 - day_of_week) % 7;
    date.checked_sub_days(Days::new(u64::from(delta)))
}

fn weeks(n: u32) -> Days {
    Days::new(7 * u64::from(n))
}

fn day_of_complete_week(year: i32, month: u32, day_of_week: u32, n: i32) -> Option<NaiveDate> {
    let sunday = if n >= 0 {
        forward_to(first_of_month(year, month)?, 0)?.checked_add_days(weeks(n.unsigned_abs()))?
    } else {
        let last_saturday = back_to(last_of_month(year, month)?, 6)?;
        last_saturday
            .checked_sub_days(Days::new(6))?
            .checked_sub_days(weeks(n.unsigned_abs() - 1))?
    };
    let saturday = sunday.checked_add_days(Days::new(6))?;
    if !in_month(sunday, year, month) || !in_month(saturday, year, month) {
        return None;
    }
    sunday.checked_add_days(day_offset(day_of_week)?)
}

fn nth_weekday_of_month(year: i32, month: u32, day_of_week: u32, n: i32) -> Option<NaiveDate> {
    let date = if n >= 0 {
        forward_to(first_of_month(year, month)?, day_of_week)?
            .checked_add_days(weeks(n.unsigned_abs()))?
    } else {
        back_to(last_of_month(year, month)?, day_of_week)?
            .checked_sub_days(weeks(n.unsigned_abs() - 1))?
    };
    in_month(date, year, month).then_some(date)
}

fn observed_on_weekday(date: NaiveDate) -> Option<NaiveDate> {
    match date.weekday() {
        Weekday::Sun => date.succ_opt(),
        Weekday::Sat => date.pred_opt(),
        _ => Some(date),
    }
}

fn weekday_after_full_moon(start: NaiveDate, day_of_week: u32) -> Option<NaiveDate> {
    let full_moon = start
        .iter_days()
        .take(FULL_MOON_SEARCH_DAYS as usize)
        .find(|day| lunar::is_full_moon(*day))?;
    forward_to(full_moon.succ_opt()?, day_of_week)
}
