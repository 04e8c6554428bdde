//! Opening the record database.
//!
//! The file is created on first use and the `records` schema is migrated
//! before any repository sees the pool.

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;

use crate::error::StorageError;

/// Where the records live.
pub struct Config {
    /// e.g. `sqlite:alarmhub.db?mode=rwc`, or `sqlite::memory:` for tests.
    pub database_url: String,
}

impl Config {
    /// Open the database and bring its schema up to date.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the URL is malformed, the file cannot be
    /// opened, or a migration fails.
    pub async fn build(self) -> Result<Database, StorageError> {
        let options =
            SqliteConnectOptions::from_str(&self.database_url)?.create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::debug!(url = %self.database_url, "record database migrated");
        Ok(Database { pool })
    }
}

/// A migrated record database.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory() -> Database {
        Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn should_create_only_records_table() {
        let db = memory().await;
        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' AND name != '_sqlx_migrations' ORDER BY name",
        )
        .fetch_all(db.pool())
        .await
        .unwrap();

        let names: Vec<&str> = tables.iter().map(|row| row.0.as_str()).collect();
        assert_eq!(names, vec!["records"]);
    }

    #[tokio::test]
    async fn should_enforce_unique_name_per_kind() {
        let db = memory().await;
        let insert = "INSERT INTO records (kind, name, body) VALUES (?, ?, '{}')";
        sqlx::query(insert)
            .bind("action")
            .bind("x")
            .execute(db.pool())
            .await
            .unwrap();
        sqlx::query(insert)
            .bind("alarm")
            .bind("x")
            .execute(db.pool())
            .await
            .unwrap();

        let duplicate = sqlx::query(insert)
            .bind("action")
            .bind("x")
            .execute(db.pool())
            .await;
        assert!(matches!(
            duplicate,
            Err(sqlx::Error::Database(err)) if err.is_unique_violation()
        ));
    }
}
