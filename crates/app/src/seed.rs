//! Default data: US market holidays and a few weekday alarms.
//!
//! Used to populate an empty repository on first start.

use alarmhub_domain::action::{Action, ActionKind, SubAction};
use alarmhub_domain::alarm::{Alarm, AlarmKind, DayGroupSelector};
use alarmhub_domain::day_group::DayGroup;
use alarmhub_domain::day_selector::{DayRule, DaySelector};
use alarmhub_domain::error::AlarmHubError;
use alarmhub_domain::reference::Ref;

use crate::ports::{Repository, Storage};

/// Positions in [`day_selectors`] of the days the exchange is closed.
const NYSE_HOLIDAYS: [usize; 9] = [0, 1, 2, 3, 5, 7, 8, 10, 13];

fn exact(name: &str, month: u32, day: u32) -> DaySelector {
    DaySelector::new(name, DayRule::ExactDate { month, day })
}

fn nth_weekday(name: &str, month: u32, day_of_week: u32, n: i32) -> DaySelector {
    DaySelector::new(
        name,
        DayRule::NthDayOfWeekOfMonth {
            month,
            day_of_week,
            n,
        },
    )
}

fn observed(name: &str, month: u32, day: u32) -> DaySelector {
    DaySelector::new(name, DayRule::ObservedOnWeekday { month, day })
}

fn relative(name: &str, to: &str, days_relative: i32) -> DaySelector {
    DaySelector::new(
        name,
        DayRule::RelativeToDay {
            relative_day: Ref::stub(to),
            days_relative,
        },
    )
}

/// US federal and market holidays.
#[must_use]
pub fn day_selectors() -> Vec<DaySelector> {
    vec![
        exact("New Years Day", 0, 0),
        nth_weekday("Martin Luther King Jr. Day", 0, 1, 2),
        nth_weekday("Washington's Birthday", 1, 1, 2),
        relative("Good Friday", "Easter Sunday", -2),
        DaySelector::new(
            "Easter Sunday",
            DayRule::AfterFullMoon {
                start_month: 2,
                start_day: 20,
                day_of_week: 0,
            },
        ),
        nth_weekday("Memorial Day", 4, 1, -1),
        exact("Independence Day", 6, 3),
        observed("Independence Day Observed", 6, 3),
        nth_weekday("Labor Day", 8, 1, 0),
        exact("Veterans Day", 10, 10),
        nth_weekday("Thanksgiving Day", 10, 4, 3),
        relative("Black Friday", "Thanksgiving Day", 1),
        exact("Christmas Eve", 11, 23),
        observed("Christmas Observed", 11, 24),
        exact("Christmas", 11, 24),
    ]
}

#[must_use]
pub fn day_groups() -> Vec<DayGroup> {
    let selectors = day_selectors();
    let days = NYSE_HOLIDAYS
        .iter()
        .filter_map(|i| selectors.get(*i))
        .map(|selector| Ref::stub(selector.name.clone()))
        .collect();
    vec![DayGroup::new("NYSE holidays", days)]
}

#[must_use]
pub fn actions() -> Vec<Action> {
    vec![
        Action::new(
            "alarm on",
            "turns alarm pin on",
            ActionKind::GpioSet { pin: 0, value: true },
        ),
        Action::new(
            "alarm off",
            "turns alarm pin off",
            ActionKind::GpioSet {
                pin: 0,
                value: false,
            },
        ),
        Action::new(
            "hello",
            "triggers alarm on then off",
            ActionKind::Composite {
                sub_actions: vec![
                    SubAction {
                        action: Ref::stub("alarm on"),
                        duration: 250,
                    },
                    SubAction {
                        action: Ref::stub("alarm off"),
                        duration: 250,
                    },
                ],
            },
        ),
    ]
}

fn weekday_alarm(name: &str, hour: u32, minute: u32) -> Alarm {
    Alarm {
        name: name.to_string(),
        kind: AlarmKind::Basic,
        action: Ref::stub("hello"),
        priority: 0,
        negate_action: false,
        days: DayGroupSelector::weekdays(),
        hour,
        minute,
        is_pm: false,
    }
}

#[must_use]
pub fn alarms() -> Vec<Alarm> {
    vec![
        weekday_alarm("first alarm", 8, 30),
        weekday_alarm("second alarm", 9, 30),
        weekday_alarm("standup alarm", 10, 0),
    ]
}

async fn create_all<T, R>(repo: &R, records: Vec<T>) -> Result<(), AlarmHubError>
where
    T: alarmhub_domain::record::Record,
    R: Repository<T>,
{
    for record in records {
        repo.create(record).await?;
    }
    Ok(())
}

/// Write the default records into `repo` when it holds no records at all.
///
/// Returns whether anything was written. Records are written straight to the
/// repository, so their order does not need to follow reference order; load a
/// [`Store`](crate::store::Store) afterwards to link them.
///
/// # Errors
///
/// Propagates repository errors.
pub async fn apply<R: Storage>(repo: &R) -> Result<bool, AlarmHubError> {
    let empty = Repository::<DaySelector>::list(repo).await?.is_empty()
        && Repository::<DayGroup>::list(repo).await?.is_empty()
        && Repository::<Action>::list(repo).await?.is_empty()
        && Repository::<Alarm>::list(repo).await?.is_empty();
    if !empty {
        tracing::info!("repository already populated, skipping seed");
        return Ok(false);
    }

    create_all(repo, day_selectors()).await?;
    create_all(repo, day_groups()).await?;
    create_all(repo, actions()).await?;
    create_all(repo, alarms()).await?;
    tracing::info!("seeded default holidays, actions and alarms");
    Ok(true)
}
