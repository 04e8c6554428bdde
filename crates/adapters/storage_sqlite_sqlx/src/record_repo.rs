//! `SQLite` implementation of [`Repository`] for every record kind.
//!
//! Records are stored as JSON bodies in a single `records` table keyed by
//! `(kind, name)`. Bodies are checked against the kind's known type tags
//! before they are decoded, so an unknown tag surfaces as
//! [`AlarmHubError::InvalidSelector`] instead of a generic decode failure.

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use alarmhub_app::ports::Repository;
use alarmhub_domain::error::{AlarmHubError, ConflictError, NotFoundError};
use alarmhub_domain::record::Record;

use crate::error::StorageError;

/// Raw stored body of one record.
struct Body(String);

impl<'r> FromRow<'r, SqliteRow> for Body {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(row.try_get("body")?))
    }
}

impl Body {
    fn decode<T: Record>(&self) -> Result<T, AlarmHubError> {
        let value: serde_json::Value =
            serde_json::from_str(&self.0).map_err(StorageError::from)?;
        T::check_tags(&value)?;
        Ok(serde_json::from_value(value).map_err(StorageError::from)?)
    }
}

const INSERT: &str = "INSERT INTO records (kind, name, body) VALUES (?, ?, ?)";
const SELECT_BY_KIND: &str = "SELECT body FROM records WHERE kind = ? ORDER BY seq";
const UPDATE: &str = "UPDATE records SET body = ? WHERE kind = ? AND name = ?";
const DELETE_BY_NAME: &str = "DELETE FROM records WHERE kind = ? AND name = ?";

/// `SQLite`-backed repository for all record kinds.
#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn not_found<T: Record>(name: &str) -> AlarmHubError {
    NotFoundError {
        kind: T::KIND,
        name: name.to_string(),
    }
    .into()
}

impl<T: Record> Repository<T> for SqliteRepository {
    fn list(&self) -> impl Future<Output = Result<Vec<T>, AlarmHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Body> = sqlx::query_as(SELECT_BY_KIND)
                .bind(T::KIND.as_str())
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            rows.iter().map(Body::decode).collect()
        }
    }

    fn create(&self, record: T) -> impl Future<Output = Result<T, AlarmHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let body = serde_json::to_string(&record).map_err(StorageError::from)?;
            let result = sqlx::query(INSERT)
                .bind(T::KIND.as_str())
                .bind(record.name())
                .bind(body)
                .execute(&pool)
                .await;

            match result {
                Ok(_) => Ok(record),
                Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                    Err(ConflictError {
                        kind: T::KIND,
                        name: record.name().to_string(),
                    }
                    .into())
                }
                Err(err) => Err(StorageError::from(err).into()),
            }
        }
    }

    fn update(&self, record: T) -> impl Future<Output = Result<T, AlarmHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let body = serde_json::to_string(&record).map_err(StorageError::from)?;
            let result = sqlx::query(UPDATE)
                .bind(body)
                .bind(T::KIND.as_str())
                .bind(record.name())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            if result.rows_affected() == 0 {
                return Err(not_found::<T>(record.name()));
            }
            Ok(record)
        }
    }

    fn delete(&self, name: &str) -> impl Future<Output = Result<(), AlarmHubError>> + Send {
        let pool = self.pool.clone();
        let name = name.to_string();
        async move {
            let result = sqlx::query(DELETE_BY_NAME)
                .bind(T::KIND.as_str())
                .bind(&name)
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            if result.rows_affected() == 0 {
                return Err(not_found::<T>(&name));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Config;
    use alarmhub_domain::action::{Action, ActionKind, SubAction};
    use alarmhub_domain::day_group::DayGroup;
    use alarmhub_domain::day_selector::{DayRule, DaySelector};
    use alarmhub_domain::record::RecordKind;
    use alarmhub_domain::reference::Ref;

    async fn setup() -> SqliteRepository {
        let db = Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap();
        SqliteRepository::new(db.pool().clone())
    }

    fn pin(name: &str, value: bool) -> Action {
        Action::new(name, "", ActionKind::GpioSet { pin: 2, value })
    }

    fn exact(name: &str, month: u32, day: u32) -> DaySelector {
        DaySelector::new(name, DayRule::ExactDate { month, day })
    }

    #[tokio::test]
    async fn should_create_and_list_in_insertion_order() {
        let repo = setup().await;
        repo.create(pin("b", true)).await.unwrap();
        repo.create(pin("a", false)).await.unwrap();

        let all = Repository::<Action>::list(&repo).await.unwrap();
        let names: Vec<&str> = all.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn should_keep_kinds_apart() {
        let repo = setup().await;
        repo.create(pin("same", true)).await.unwrap();
        repo.create(exact("same", 0, 0)).await.unwrap();

        let actions = Repository::<Action>::list(&repo).await.unwrap();
        let selectors = Repository::<DaySelector>::list(&repo).await.unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(selectors.len(), 1);
    }

    #[tokio::test]
    async fn should_return_conflict_when_name_taken() {
        let repo = setup().await;
        repo.create(pin("x", true)).await.unwrap();
        let result = repo.create(pin("x", false)).await;
        assert!(matches!(
            result,
            Err(AlarmHubError::Conflict(err)) if err.kind == RecordKind::Action && err.name == "x"
        ));
    }

    #[tokio::test]
    async fn should_update_in_place_when_exists() {
        let repo = setup().await;
        repo.create(exact("first", 0, 0)).await.unwrap();
        repo.create(exact("second", 1, 1)).await.unwrap();

        repo.update(exact("first", 5, 5)).await.unwrap();

        let all = Repository::<DaySelector>::list(&repo).await.unwrap();
        assert_eq!(all[0], exact("first", 5, 5));
        assert_eq!(all[1].name, "second");
    }

    #[tokio::test]
    async fn should_return_not_found_when_updating_missing() {
        let repo = setup().await;
        let result = repo.update(pin("ghost", true)).await;
        assert!(matches!(result, Err(AlarmHubError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_delete_when_exists() {
        let repo = setup().await;
        repo.create(pin("x", true)).await.unwrap();
        Repository::<Action>::delete(&repo, "x").await.unwrap();

        let all = Repository::<Action>::list(&repo).await.unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn should_return_not_found_when_deleting_missing() {
        let repo = setup().await;
        let result = Repository::<Action>::delete(&repo, "y").await;
        assert!(matches!(
            result,
            Err(AlarmHubError::NotFound(err)) if err.name == "y"
        ));
    }

    #[tokio::test]
    async fn should_store_references_as_name_stubs() {
        let repo = setup().await;
        let group = DayGroup::new("holidays", vec![Ref::stub("New Years Day")]);
        repo.create(group.clone()).await.unwrap();

        let (body,): (String,) = sqlx::query_as("SELECT body FROM records WHERE kind = 'day-group'")
            .fetch_one(&repo.pool)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["days"], serde_json::json!([{"name": "New Years Day"}]));

        let all = Repository::<DayGroup>::list(&repo).await.unwrap();
        assert_eq!(all, vec![group]);
    }

    #[tokio::test]
    async fn should_round_trip_composite_and_hex_payloads() {
        let repo = setup().await;
        let spi = Action::new(
            "spi",
            "",
            ActionKind::SpiWrite {
                bus: 0,
                cs: 0,
                data: vec![1, 2, 0xff],
            },
        );
        let hello = Action::new(
            "hello",
            "",
            ActionKind::Composite {
                sub_actions: vec![SubAction {
                    action: Ref::stub("spi"),
                    duration: 250,
                }],
            },
        );
        repo.create(spi.clone()).await.unwrap();
        repo.create(hello.clone()).await.unwrap();

        let all = Repository::<Action>::list(&repo).await.unwrap();
        assert_eq!(all, vec![spi, hello]);
    }

    #[tokio::test]
    async fn should_return_invalid_selector_when_stored_tag_unknown() {
        let repo = setup().await;
        sqlx::query(INSERT)
            .bind("day-selector")
            .bind("odd")
            .bind(r#"{"name":"odd","type":"lunar-new-year"}"#)
            .execute(&repo.pool)
            .await
            .unwrap();

        let result = Repository::<DaySelector>::list(&repo).await;
        assert!(matches!(
            result,
            Err(AlarmHubError::InvalidSelector(err)) if err.tag == "lunar-new-year"
        ));
    }

    #[tokio::test]
    async fn should_return_storage_error_when_body_malformed() {
        let repo = setup().await;
        sqlx::query(INSERT)
            .bind("action")
            .bind("broken")
            .bind("not json")
            .execute(&repo.pool)
            .await
            .unwrap();

        let result = Repository::<Action>::list(&repo).await;
        assert!(matches!(result, Err(AlarmHubError::Storage(_))));
    }
}
