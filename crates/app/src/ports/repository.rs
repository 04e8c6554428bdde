//! Repository port: keyed persistence for one record kind.

use std::future::Future;

use alarmhub_domain::error::AlarmHubError;
use alarmhub_domain::record::Record;

/// CRUD persistence for records of kind `T`, keyed by name.
///
/// Records handed to a repository are always normalized (references are
/// bare name stubs).
pub trait Repository<T: Record> {
    /// All records, in insertion order.
    fn list(&self) -> impl Future<Output = Result<Vec<T>, AlarmHubError>> + Send;

    /// Store a new record.
    ///
    /// Fails with [`AlarmHubError::Conflict`] when the name is taken.
    fn create(&self, record: T) -> impl Future<Output = Result<T, AlarmHubError>> + Send;

    /// Overwrite the record with the same name, keeping its position.
    ///
    /// Fails with [`AlarmHubError::NotFound`] when no such record exists.
    fn update(&self, record: T) -> impl Future<Output = Result<T, AlarmHubError>> + Send;

    /// Remove the record with `name`.
    ///
    /// Fails with [`AlarmHubError::NotFound`] when no such record exists.
    fn delete(&self, name: &str) -> impl Future<Output = Result<(), AlarmHubError>> + Send;
}
