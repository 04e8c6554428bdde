//! Time helpers.
//!
//! Alarms and calendar days are wall-clock concepts, so everything works on
//! naive local date-times.

use chrono::{Local, NaiveDateTime};

/// Return the current local wall-clock time.
#[must_use]
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}
