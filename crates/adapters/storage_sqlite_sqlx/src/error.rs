//! Storage-specific error type wrapping sqlx errors.

use alarmhub_domain::error::AlarmHubError;

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// A stored body is not valid JSON for its record kind.
    #[error("JSON error")]
    Json(#[from] serde_json::Error),

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<StorageError> for AlarmHubError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}
