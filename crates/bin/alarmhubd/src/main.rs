//! # alarmhubd: alarmhub daemon
//!
//! Composition root that wires a storage adapter to the store.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Initialize logging
//! - Open the configured repository (`SQLite` with migrations, or in-memory)
//! - Seed the default holiday calendar into an empty repository
//! - Load and link the store, then log the upcoming days and alarms
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;
mod logging;

use alarmhub_adapter_storage_memory::InMemoryRepository;
use alarmhub_adapter_storage_sqlite_sqlx::SqliteRepository;
use alarmhub_app::ports::Storage;
use alarmhub_app::seed;
use alarmhub_app::store::Store;
use alarmhub_domain::time;
use anyhow::Context;

use crate::config::{Backend, Config};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    logging::init(&config.logging.filter);

    match config.database.backend {
        Backend::Sqlite => {
            let db = alarmhub_adapter_storage_sqlite_sqlx::Config {
                database_url: config.database.url.clone(),
            }
            .build()
            .await
            .with_context(|| format!("failed to open database {}", config.database.url))?;
            run(SqliteRepository::new(db.pool().clone()), &config).await
        }
        Backend::Memory => run(InMemoryRepository::new(), &config).await,
    }
}

async fn run<S: Storage>(repo: S, config: &Config) -> anyhow::Result<()> {
    if config.seed.enabled {
        seed::apply(&repo).await.context("failed to seed defaults")?;
    }

    let store = Store::open(repo).await.context("failed to load records")?;
    let now = time::now();

    for upcoming in store.upcoming_days(now)?.iter().take(config.report.limit) {
        tracing::info!(
            day = %upcoming.selector.name,
            date = %upcoming.date,
            "upcoming day"
        );
    }
    for upcoming in store.upcoming_alarms(now)?.iter().take(config.report.limit) {
        tracing::info!(
            alarm = %upcoming.alarm.name,
            at = %upcoming.at,
            priority = upcoming.alarm.priority,
            "upcoming alarm"
        );
    }
    Ok(())
}
