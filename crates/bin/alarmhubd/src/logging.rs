//! `tracing` subscriber setup.

use tracing_subscriber::EnvFilter;

/// Fallback when the configured filter does not parse.
const DEFAULT_FILTER: &str = "alarmhubd=info,alarmhub_app=info";

/// Install the global subscriber with `filter` (`RUST_LOG` syntax).
pub fn init(filter: &str) {
    let (env_filter, invalid) = match EnvFilter::try_new(filter) {
        Ok(env_filter) => (env_filter, false),
        Err(_) => (EnvFilter::new(DEFAULT_FILTER), true),
    };

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    if invalid {
        tracing::warn!(filter, "invalid log filter, using {DEFAULT_FILTER}");
    }
}
