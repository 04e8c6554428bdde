//! Denormalization of whole collections.
//!
//! Stored records hold references by name. Linking replaces each name with a
//! shared pointer to the already-linked target, in dependency order: day
//! selectors, then day groups, then actions, then alarms. Kinds that can
//! reference themselves (day selectors, actions) are linked depth-first so
//! that a target is always linked before its referrer.

use std::collections::HashMap;
use std::sync::Arc;

use crate::action::Action;
use crate::alarm::Alarm;
use crate::day_group::DayGroup;
use crate::day_selector::DaySelector;
use crate::error::{AlarmHubError, CyclicReferenceError};
use crate::record::Record;
use crate::reference::Index;

/// Depth-first linker for a self-referencing collection.
struct Linker<'a, T, F> {
    pending: HashMap<&'a str, &'a T>,
    linked: Index<T>,
    chain: Vec<&'a str>,
    link_one: F,
}

impl<'a, T, F> Linker<'a, T, F>
where
    T: Record,
    F: Fn(&T, &Index<T>) -> Result<T, AlarmHubError>,
{
    fn new(raw: &'a [T], link_one: F) -> Self {
        let mut pending = HashMap::with_capacity(raw.len());
        for record in raw {
            pending.entry(record.name()).or_insert(record);
        }
        Self {
            pending,
            linked: Index::with_capacity(raw.len()),
            chain: Vec::new(),
            link_one,
        }
    }

    fn visit(&mut self, name: &'a str) -> Result<(), AlarmHubError> {
        if self.linked.contains_key(name) {
            return Ok(());
        }
        if let Some(start) = self.chain.iter().position(|n| *n == name) {
            let mut chain: Vec<String> = self.chain[start..].iter().map(ToString::to_string).collect();
            chain.push(name.to_string());
            return Err(CyclicReferenceError {
                kind: T::KIND,
                chain,
            }
            .into());
        }
        // Unknown names are reported by `link_one` as unresolved.
        let Some(record) = self.pending.get(name).copied() else {
            return Ok(());
        };

        self.chain.push(name);
        for (kind, target) in record.references() {
            if kind == T::KIND {
                self.visit(target)?;
            }
        }
        self.chain.pop();

        let linked = (self.link_one)(record, &self.linked)?;
        self.linked.insert(name.to_string(), Arc::new(linked));
        Ok(())
    }

    fn run(mut self, raw: &'a [T]) -> Result<Vec<Arc<T>>, AlarmHubError> {
        for record in raw {
            self.visit(record.name())?;
        }
        tracing::debug!(kind = %T::KIND, count = self.linked.len(), "linked collection");
        Ok(raw
            .iter()
            .filter_map(|record| self.linked.get(record.name()).map(Arc::clone))
            .collect())
    }
}

/// Link day selectors among themselves, in input order.
///
/// # Errors
///
/// Returns [`AlarmHubError::UnresolvedReference`] for a relative day naming
/// a missing selector, or [`AlarmHubError::CyclicReference`] when relative
/// days form a loop.
pub fn link_day_selectors(raw: &[DaySelector]) -> Result<Vec<Arc<DaySelector>>, AlarmHubError> {
    Linker::new(raw, DaySelector::denormalized).run(raw)
}

/// Link actions among themselves, in input order.
///
/// # Errors
///
/// Returns [`AlarmHubError::UnresolvedReference`] for a sub-action naming a
/// missing action, or [`AlarmHubError::CyclicReference`] when composites
/// contain themselves.
pub fn link_actions(raw: &[Action]) -> Result<Vec<Arc<Action>>, AlarmHubError> {
    Linker::new(raw, Action::denormalized).run(raw)
}

/// Link day groups against already-linked selectors.
///
/// # Errors
///
/// Returns [`AlarmHubError::UnresolvedReference`] for a missing member.
pub fn link_day_groups(
    raw: &[DayGroup],
    selectors: &Index<DaySelector>,
) -> Result<Vec<Arc<DayGroup>>, AlarmHubError> {
    raw.iter()
        .map(|group| group.denormalized(selectors).map(Arc::new))
        .collect()
}

/// Link alarms against already-linked actions and day groups.
///
/// # Errors
///
/// Returns [`AlarmHubError::UnresolvedReference`] for a missing action or
/// day group.
pub fn link_alarms(
    raw: &[Alarm],
    actions: &Index<Action>,
    groups: &Index<DayGroup>,
) -> Result<Vec<Arc<Alarm>>, AlarmHubError> {
    raw.iter()
        .map(|alarm| alarm.denormalized(actions, groups).map(Arc::new))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionKind, SubAction};
    use crate::day_selector::DayRule;
    use crate::reference::Ref;

    fn relative(name: &str, to: &str, days: i32) -> DaySelector {
        DaySelector::new(
            name,
            DayRule::RelativeToDay {
                relative_day: Ref::stub(to),
                days_relative: days,
            },
        )
    }

    fn composite(name: &str, steps: &[&str]) -> Action {
        Action::new(
            name,
            "",
            ActionKind::Composite {
                sub_actions: steps
                    .iter()
                    .map(|step| SubAction {
                        action: Ref::stub(*step),
                        duration: 10,
                    })
                    .collect(),
            },
        )
    }

    #[test]
    fn should_link_relative_day_declared_before_its_target() {
        let raw = vec![
            relative("Good Friday", "Easter Sunday", -2),
            DaySelector::new(
                "Easter Sunday",
                DayRule::AfterFullMoon {
                    start_month: 2,
                    start_day: 20,
                    day_of_week: 0,
                },
            ),
        ];
        let linked = link_day_selectors(&raw).unwrap();
        assert_eq!(linked.len(), 2);
        assert_eq!(linked[0].name, "Good Friday");
        let date = linked[0].resolve(2021).unwrap();
        assert_eq!(date, chrono::NaiveDate::from_ymd_opt(2021, 4, 2));
    }

    #[test]
    fn should_share_target_between_referrers() {
        let raw = vec![
            DaySelector::new("base", DayRule::ExactDate { month: 0, day: 0 }),
            relative("a", "base", 1),
            relative("b", "base", 2),
        ];
        let linked = link_day_selectors(&raw).unwrap();
        let target = |s: &DaySelector| match &s.rule {
            DayRule::RelativeToDay { relative_day, .. } => Arc::clone(relative_day.resolved().unwrap()),
            _ => panic!("not relative"),
        };
        assert!(Arc::ptr_eq(&target(&linked[1]), &target(&linked[2])));
        assert!(Arc::ptr_eq(&target(&linked[1]), &linked[0]));
    }

    #[test]
    fn should_report_cycle_with_its_chain() {
        let raw = vec![relative("a", "b", 1), relative("b", "c", 1), relative("c", "a", 1)];
        let err = link_day_selectors(&raw).unwrap_err();
        match err {
            AlarmHubError::CyclicReference(err) => {
                assert_eq!(err.chain, vec!["a", "b", "c", "a"]);
                assert_eq!(err.to_string(), "cyclic day selector references: a -> b -> c -> a");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn should_report_self_reference_as_cycle() {
        let raw = vec![composite("loop", &["loop"])];
        assert!(matches!(
            link_actions(&raw),
            Err(AlarmHubError::CyclicReference(err)) if err.chain == vec!["loop", "loop"]
        ));
    }

    #[test]
    fn should_report_missing_sub_action() {
        let raw = vec![composite("hello", &["nope"])];
        assert!(matches!(
            link_actions(&raw),
            Err(AlarmHubError::UnresolvedReference(err)) if err.reference == "nope"
        ));
    }

    #[test]
    fn should_link_nested_composites() {
        let raw = vec![
            composite("outer", &["inner", "inner"]),
            composite("inner", &["pin"]),
            Action::new("pin", "", ActionKind::GpioSet { pin: 3, value: true }),
        ];
        let linked = link_actions(&raw).unwrap();
        assert_eq!(linked[0].total_duration(), 40);
    }

    #[test]
    fn should_link_groups_against_selectors() {
        let selectors = crate::reference::index(&link_day_selectors(&[DaySelector::new(
            "New Years Day",
            DayRule::ExactDate { month: 0, day: 0 },
        )])
        .unwrap());
        let groups = vec![
            DayGroup::new("ok", vec![Ref::stub("New Years Day")]),
            DayGroup::new("broken", vec![Ref::stub("Festivus")]),
        ];
        assert!(link_day_groups(&groups[..1], &selectors).is_ok());
        assert!(matches!(
            link_day_groups(&groups, &selectors),
            Err(AlarmHubError::UnresolvedReference(err)) if err.record == "broken"
        ));
    }
}
