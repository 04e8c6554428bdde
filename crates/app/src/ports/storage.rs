//! Storage port: one backend holding every record kind.

use alarmhub_domain::action::Action;
use alarmhub_domain::alarm::Alarm;
use alarmhub_domain::day_group::DayGroup;
use alarmhub_domain::day_selector::DaySelector;

use super::Repository;

/// A backend that persists all four collections.
pub trait Storage:
    Repository<Action> + Repository<DaySelector> + Repository<DayGroup> + Repository<Alarm> + Send + Sync
{
}

impl<S> Storage for S where
    S: Repository<Action>
        + Repository<DaySelector>
        + Repository<DayGroup>
        + Repository<Alarm>
        + Send
        + Sync
{
}
