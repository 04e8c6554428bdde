//! # alarmhub-adapter-storage-memory
//!
//! In-memory implementation of the `Repository<T>` port, one `Vec` per record
//! kind. Nothing is persisted; used for demos, tests and `backend = "memory"`.
//!
//! ## Dependency rule
//! Depends on `alarmhub-app` (for port traits) and `alarmhub-domain` (for domain types).

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use alarmhub_app::ports::Repository;
use alarmhub_domain::action::Action;
use alarmhub_domain::alarm::Alarm;
use alarmhub_domain::day_group::DayGroup;
use alarmhub_domain::day_selector::DaySelector;
use alarmhub_domain::error::{AlarmHubError, ConflictError, NotFoundError};
use alarmhub_domain::record::Record;

/// One collection, in insertion order.
struct Table<T>(Mutex<Vec<T>>);

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self(Mutex::new(Vec::new()))
    }
}

impl<T: Record> Table<T> {
    fn lock(&self) -> MutexGuard<'_, Vec<T>> {
        // Every write below leaves the vector consistent, so a poisoned lock
        // still holds valid data.
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn list(&self) -> Vec<T> {
        self.lock().clone()
    }

    fn create(&self, record: T) -> Result<T, AlarmHubError> {
        let mut rows = self.lock();
        if rows.iter().any(|r| r.name() == record.name()) {
            return Err(ConflictError {
                kind: T::KIND,
                name: record.name().to_string(),
            }
            .into());
        }
        rows.push(record.clone());
        Ok(record)
    }

    fn update(&self, record: T) -> Result<T, AlarmHubError> {
        let mut rows = self.lock();
        let Some(slot) = rows.iter_mut().find(|r| r.name() == record.name()) else {
            return Err(not_found::<T>(record.name()));
        };
        *slot = record.clone();
        Ok(record)
    }

    fn delete(&self, name: &str) -> Result<(), AlarmHubError> {
        let mut rows = self.lock();
        let Some(position) = rows.iter().position(|r| r.name() == name) else {
            return Err(not_found::<T>(name));
        };
        rows.remove(position);
        Ok(())
    }
}

fn not_found<T: Record>(name: &str) -> AlarmHubError {
    NotFoundError {
        kind: T::KIND,
        name: name.to_string(),
    }
    .into()
}

/// Repository keeping every record kind in memory.
#[derive(Default)]
pub struct InMemoryRepository {
    actions: Table<Action>,
    day_selectors: Table<DaySelector>,
    day_groups: Table<DayGroup>,
    alarms: Table<Alarm>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

macro_rules! repository {
    ($ty:ty, $field:ident) => {
        impl Repository<$ty> for InMemoryRepository {
            fn list(&self) -> impl Future<Output = Result<Vec<$ty>, AlarmHubError>> + Send {
                let result = self.$field.list();
                async { Ok(result) }
            }

            fn create(&self, record: $ty) -> impl Future<Output = Result<$ty, AlarmHubError>> + Send {
                let result = self.$field.create(record);
                async { result }
            }

            fn update(&self, record: $ty) -> impl Future<Output = Result<$ty, AlarmHubError>> + Send {
                let result = self.$field.update(record);
                async { result }
            }

            fn delete(&self, name: &str) -> impl Future<Output = Result<(), AlarmHubError>> + Send {
                let result = self.$field.delete(name);
                async { result }
            }
        }
    };
}

repository!(Action, actions);
repository!(DaySelector, day_selectors);
repository!(DayGroup, day_groups);
repository!(Alarm, alarms);
