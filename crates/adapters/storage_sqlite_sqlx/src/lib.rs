//! # alarmhub-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the `Repository<T>` port defined in `alarmhub-app::ports`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Store records as JSON bodies keyed by `(kind, name)`
//!
//! ## Dependency rule
//! Depends on `alarmhub-app` (for port traits) and `alarmhub-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod error;
pub mod pool;
pub mod record_repo;

pub use pool::{Config, Database};
pub use record_repo::SqliteRepository;
