//! Schedule queries over a loaded [`Store`].

use std::sync::Arc;

use alarmhub_domain::alarm::Alarm;
use alarmhub_domain::day_selector::DaySelector;
use alarmhub_domain::error::AlarmHubError;
use chrono::{NaiveDate, NaiveDateTime};

use crate::store::Store;

/// The next date a day selector picks.
#[derive(Debug, Clone, PartialEq)]
pub struct UpcomingDay {
    pub selector: Arc<DaySelector>,
    pub date: NaiveDate,
}

/// The next time an alarm fires.
#[derive(Debug, Clone, PartialEq)]
pub struct UpcomingAlarm {
    pub alarm: Arc<Alarm>,
    pub at: NaiveDateTime,
}

impl<R> Store<R> {
    /// Next occurrence of every day selector, soonest first. Selectors with
    /// no date this year or next are left out.
    ///
    /// # Errors
    ///
    /// Propagates resolution errors; linked selectors never produce one.
    pub fn upcoming_days(&self, now: NaiveDateTime) -> Result<Vec<UpcomingDay>, AlarmHubError> {
        let mut days = Vec::with_capacity(self.day_selectors().len());
        for selector in self.day_selectors() {
            if let Some(date) = selector.next_occurrence(now)? {
                days.push(UpcomingDay {
                    selector: Arc::clone(selector),
                    date,
                });
            }
        }
        days.sort_by_key(|day| day.date);
        Ok(days)
    }

    /// Next firing time of every alarm, soonest first, ties broken by
    /// priority. Alarms that never fire are left out.
    ///
    /// # Errors
    ///
    /// Propagates resolution errors; linked alarms never produce one.
    pub fn upcoming_alarms(&self, now: NaiveDateTime) -> Result<Vec<UpcomingAlarm>, AlarmHubError> {
        let mut alarms = Vec::with_capacity(self.alarms().len());
        for alarm in self.alarms() {
            if let Some(at) = alarm.next_trigger(now)? {
                alarms.push(UpcomingAlarm {
                    alarm: Arc::clone(alarm),
                    at,
                });
            }
        }
        alarms.sort_by_key(|upcoming| (upcoming.at, upcoming.alarm.priority));
        Ok(alarms)
    }
}
