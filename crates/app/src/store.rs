//! Store: the four record collections, kept linked.
//!
//! The store reads normalized records from a [`Storage`] backend, links name
//! references into shared handles and serves the linked records. Every
//! mutation is validated, normalized and dry-run linked before it reaches
//! the backend; afterwards only the changed collection is re-fetched and
//! only the kinds depending on it are re-linked.
//!
//! A new [`Snapshot`] is always built beside the current one and swapped in
//! once linking succeeds, so a failed pass leaves the previous state intact.

use std::sync::Arc;

use alarmhub_domain::action::Action;
use alarmhub_domain::alarm::Alarm;
use alarmhub_domain::day_group::DayGroup;
use alarmhub_domain::day_selector::DaySelector;
use alarmhub_domain::error::{AlarmHubError, ConflictError, InUseError, NotFoundError};
use alarmhub_domain::link::{link_actions, link_alarms, link_day_groups, link_day_selectors};
use alarmhub_domain::record::{Record, RecordKind};
use alarmhub_domain::reference::{Index, index};

use crate::ports::{Repository, Storage};

/// One collection: stored records, their linked form and a name index.
#[derive(Debug, Clone)]
pub struct Collection<T> {
    raw: Vec<T>,
    linked: Vec<Arc<T>>,
    index: Index<T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            raw: Vec::new(),
            linked: Vec::new(),
            index: Index::new(),
        }
    }
}

impl<T: Record> Collection<T> {
    fn set_linked(&mut self, linked: Vec<Arc<T>>) {
        self.index = index(&linked);
        self.linked = linked;
    }

    /// Linked records, in load order.
    #[must_use]
    pub fn records(&self) -> &[Arc<T>] {
        &self.linked
    }

    /// Linked record by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<T>> {
        self.index.get(name)
    }

    fn referrer(&self, kind: RecordKind, name: &str) -> Option<&str> {
        self.raw
            .iter()
            .find(|record| {
                record
                    .references()
                    .iter()
                    .any(|(k, target)| *k == kind && *target == name)
            })
            .map(Record::name)
    }
}

/// A consistent, fully linked state of all four collections.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub day_selectors: Collection<DaySelector>,
    pub day_groups: Collection<DayGroup>,
    pub actions: Collection<Action>,
    pub alarms: Collection<Alarm>,
}

impl Snapshot {
    fn link(&mut self, kind: RecordKind) -> Result<(), AlarmHubError> {
        match kind {
            RecordKind::DaySelector => {
                let linked = link_day_selectors(&self.day_selectors.raw)?;
                self.day_selectors.set_linked(linked);
            }
            RecordKind::DayGroup => {
                let linked = link_day_groups(&self.day_groups.raw, &self.day_selectors.index)?;
                self.day_groups.set_linked(linked);
            }
            RecordKind::Action => {
                let linked = link_actions(&self.actions.raw)?;
                self.actions.set_linked(linked);
            }
            RecordKind::Alarm => {
                let linked = link_alarms(
                    &self.alarms.raw,
                    &self.actions.index,
                    &self.day_groups.index,
                )?;
                self.alarms.set_linked(linked);
            }
        }
        Ok(())
    }

    /// Re-link `kind` and every kind that embeds it.
    fn link_from(&mut self, kind: RecordKind) -> Result<(), AlarmHubError> {
        for dependent in kind.dependents() {
            self.link(*dependent)?;
        }
        Ok(())
    }

    /// First record, of any kind, that references `(kind, name)`.
    fn referrer(&self, kind: RecordKind, name: &str) -> Option<(RecordKind, &str)> {
        self.day_selectors
            .referrer(kind, name)
            .map(|n| (RecordKind::DaySelector, n))
            .or_else(|| {
                self.day_groups
                    .referrer(kind, name)
                    .map(|n| (RecordKind::DayGroup, n))
            })
            .or_else(|| self.actions.referrer(kind, name).map(|n| (RecordKind::Action, n)))
            .or_else(|| self.alarms.referrer(kind, name).map(|n| (RecordKind::Alarm, n)))
    }
}

/// Maps a record type to its collection inside a [`Snapshot`].
pub trait Stored: Record {
    fn collection(snapshot: &Snapshot) -> &Collection<Self>;
    fn collection_mut(snapshot: &mut Snapshot) -> &mut Collection<Self>;
}

macro_rules! stored {
    ($ty:ty, $field:ident) => {
        impl Stored for $ty {
            fn collection(snapshot: &Snapshot) -> &Collection<Self> {
                &snapshot.$field
            }

            fn collection_mut(snapshot: &mut Snapshot) -> &mut Collection<Self> {
                &mut snapshot.$field
            }
        }
    };
}

stored!(DaySelector, day_selectors);
stored!(DayGroup, day_groups);
stored!(Action, actions);
stored!(Alarm, alarms);

/// The linked record graph over a storage backend.
pub struct Store<R> {
    repo: R,
    snapshot: Snapshot,
}

impl<R: Storage> Store<R> {
    /// Create an empty store over `repo`. Call [`Store::load`] to read it.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            snapshot: Snapshot::default(),
        }
    }

    /// Create a store and load every collection.
    ///
    /// # Errors
    ///
    /// See [`Store::load`].
    pub async fn open(repo: R) -> Result<Self, AlarmHubError> {
        let mut store = Self::new(repo);
        store.load().await?;
        Ok(store)
    }

    /// The backing repository.
    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Fetch all four collections and link them in dependency order.
    ///
    /// # Errors
    ///
    /// Propagates repository errors, and returns
    /// [`AlarmHubError::Validation`] when a stored record is out of range,
    /// [`AlarmHubError::UnresolvedReference`] or
    /// [`AlarmHubError::CyclicReference`] when stored records do not link.
    pub async fn load(&mut self) -> Result<(), AlarmHubError> {
        let mut candidate = Snapshot::default();
        for kind in RecordKind::ALL {
            self.fetch(&mut candidate, kind).await?;
            candidate.link(kind)?;
        }
        self.snapshot = candidate;
        tracing::info!(
            day_selectors = self.snapshot.day_selectors.linked.len(),
            day_groups = self.snapshot.day_groups.linked.len(),
            actions = self.snapshot.actions.linked.len(),
            alarms = self.snapshot.alarms.linked.len(),
            "store loaded"
        );
        Ok(())
    }

    /// Re-fetch one collection and re-link it along with its dependents.
    ///
    /// # Errors
    ///
    /// Same as [`Store::load`]; on error the current state is kept.
    pub async fn apply_collection_change(&mut self, kind: RecordKind) -> Result<(), AlarmHubError> {
        let mut candidate = self.snapshot.clone();
        self.fetch(&mut candidate, kind).await?;
        candidate.link_from(kind)?;
        self.snapshot = candidate;
        tracing::debug!(%kind, "collection re-linked");
        Ok(())
    }

    async fn fetch(&self, snapshot: &mut Snapshot, kind: RecordKind) -> Result<(), AlarmHubError> {
        match kind {
            RecordKind::DaySelector => self.fetch_one::<DaySelector>(snapshot).await,
            RecordKind::DayGroup => self.fetch_one::<DayGroup>(snapshot).await,
            RecordKind::Action => self.fetch_one::<Action>(snapshot).await,
            RecordKind::Alarm => self.fetch_one::<Alarm>(snapshot).await,
        }
    }

    async fn fetch_one<T: Stored>(&self, snapshot: &mut Snapshot) -> Result<(), AlarmHubError>
    where
        R: Repository<T>,
    {
        let raw = Repository::<T>::list(&self.repo).await?;
        for record in &raw {
            if let Err(err) = record.validate() {
                tracing::warn!(
                    kind = %T::KIND,
                    name = record.name(),
                    error = %err,
                    "stored record rejected"
                );
                return Err(err);
            }
        }
        T::collection_mut(snapshot).raw = raw;
        Ok(())
    }

    /// Link `snapshot` as if `edit` had been applied to the `T` collection.
    fn dry_run<T: Stored>(&self, edit: impl FnOnce(&mut Vec<T>)) -> Result<(), AlarmHubError> {
        let mut candidate = self.snapshot.clone();
        edit(&mut T::collection_mut(&mut candidate).raw);
        candidate.link_from(T::KIND)
    }

    fn linked<T: Stored>(&self, name: &str) -> Result<Arc<T>, AlarmHubError> {
        self.get::<T>(name).ok_or_else(|| {
            NotFoundError {
                kind: T::KIND,
                name: name.to_string(),
            }
            .into()
        })
    }

    /// Create a record and return its linked form.
    ///
    /// # Errors
    ///
    /// Returns [`AlarmHubError::Conflict`] when the name is taken,
    /// [`AlarmHubError::Validation`] when invariants fail,
    /// [`AlarmHubError::UnresolvedReference`] or
    /// [`AlarmHubError::CyclicReference`] when the record would not link, or a
    /// storage error.
    pub async fn create<T: Stored>(&mut self, record: T) -> Result<Arc<T>, AlarmHubError>
    where
        R: Repository<T>,
    {
        record.validate()?;
        if T::collection(&self.snapshot).get(record.name()).is_some() {
            return Err(ConflictError {
                kind: T::KIND,
                name: record.name().to_string(),
            }
            .into());
        }
        let record = record.normalized();
        self.dry_run::<T>(|raw| raw.push(record.clone()))?;

        let created = Repository::<T>::create(&self.repo, record).await?;
        self.apply_collection_change(T::KIND).await?;
        tracing::info!(kind = %T::KIND, name = created.name(), "record created");
        self.linked(created.name())
    }

    /// Replace the record with the same name and return its linked form.
    ///
    /// # Errors
    ///
    /// Same as [`Store::create`], with [`AlarmHubError::NotFound`] in place
    /// of a conflict.
    pub async fn update<T: Stored>(&mut self, record: T) -> Result<Arc<T>, AlarmHubError>
    where
        R: Repository<T>,
    {
        record.validate()?;
        let record = record.normalized();
        self.dry_run::<T>(|raw| {
            if let Some(slot) = raw.iter_mut().find(|r| r.name() == record.name()) {
                *slot = record.clone();
            }
        })?;

        let updated = Repository::<T>::update(&self.repo, record).await?;
        self.apply_collection_change(T::KIND).await?;
        tracing::info!(kind = %T::KIND, name = updated.name(), "record updated");
        self.linked(updated.name())
    }

    /// Delete the record named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`AlarmHubError::InUse`] while another record references it,
    /// [`AlarmHubError::NotFound`] when it does not exist, or a storage error.
    pub async fn delete<T: Stored>(&mut self, name: &str) -> Result<(), AlarmHubError>
    where
        R: Repository<T>,
    {
        if let Some((referrer_kind, referrer)) = self.snapshot.referrer(T::KIND, name) {
            tracing::warn!(kind = %T::KIND, name, %referrer_kind, referrer, "delete rejected");
            return Err(InUseError {
                kind: T::KIND,
                name: name.to_string(),
                referrer_kind,
                referrer: referrer.to_string(),
            }
            .into());
        }

        Repository::<T>::delete(&self.repo, name).await?;
        self.apply_collection_change(T::KIND).await?;
        tracing::info!(kind = %T::KIND, name, "record deleted");
        Ok(())
    }
}

impl<R> Store<R> {
    /// The current linked state.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Linked records of kind `T`, in load order.
    pub fn list<T: Stored>(&self) -> &[Arc<T>] {
        T::collection(&self.snapshot).records()
    }

    /// Linked record of kind `T` by name.
    pub fn get<T: Stored>(&self, name: &str) -> Option<Arc<T>> {
        T::collection(&self.snapshot).get(name).cloned()
    }

    /// Linked actions, in load order.
    pub fn actions(&self) -> &[Arc<Action>] {
        self.list()
    }

    /// Linked day selectors, in load order.
    pub fn day_selectors(&self) -> &[Arc<DaySelector>] {
        self.list()
    }

    /// Linked day groups, in load order.
    pub fn day_groups(&self) -> &[Arc<DayGroup>] {
        self.list()
    }

    /// Linked alarms, in load order.
    pub fn alarms(&self) -> &[Arc<Alarm>] {
        self.list()
    }
}
