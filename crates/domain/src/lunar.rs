//! Full-moon approximation from a mean synodic month.
//!
//! Good to within a day or so of the astronomical full moon, which is all
//! the moveable-feast rules need.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

/// Mean length of the synodic month, in days.
pub const SYNODIC_MONTH_DAYS: f64 = 29.530_588_853;

/// A known full moon, 2020-04-07 17:35, as milliseconds since the Unix epoch.
const REFERENCE_FULL_MOON_MS: i64 = 1_586_280_900_000;

const MS_PER_DAY: i64 = 86_400_000;

/// Sum of the start and end distances below which a day contains a full moon.
/// The sum is one day when the full moon falls inside the day.
const FULL_MOON_TOLERANCE: f64 = 1.01;

/// Signed distance in days from `instant` to the nearest approximated full
/// moon, in `(-SYNODIC_MONTH_DAYS / 2, SYNODIC_MONTH_DAYS / 2]`. Positive
/// means the full moon has passed.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn days_from_full_moon(instant: NaiveDateTime) -> f64 {
    let elapsed_ms = instant.and_utc().timestamp_millis() - REFERENCE_FULL_MOON_MS;
    let phase = (elapsed_ms as f64 / MS_PER_DAY as f64).rem_euclid(SYNODIC_MONTH_DAYS);
    if phase > SYNODIC_MONTH_DAYS / 2.0 {
        phase - SYNODIC_MONTH_DAYS
    } else {
        phase
    }
}

/// Whether the approximated full moon falls on `date`.
#[must_use]
pub fn is_full_moon(date: NaiveDate) -> bool {
    let start = date.and_time(NaiveTime::MIN);
    let end = start + TimeDelta::milliseconds(MS_PER_DAY - 1);
    days_from_full_moon(start).abs() + days_from_full_moon(end).abs() < FULL_MOON_TOLERANCE
}
