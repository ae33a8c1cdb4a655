//! Scheduler entry point for the Ascend progression engine.
//!
//! Connects to `PostgreSQL`, applies migrations, seeds the default stat
//! catalog, then drives the daily sweep cycle at every UTC midnight:
//!
//! ```text
//! expire overdue -> reset stale streaks -> assign recurring -> decay stats
//! ```
//!
//! Quest completion and failure are served by `ascend-engine` from whatever
//! API layer embeds it; this binary only owns the clock-driven work.

mod config;
mod error;
mod scheduler;

use std::path::Path;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use ascend_db::{PostgresConfig, PostgresPool, seed_default_stats};

use crate::config::EngineConfig;
use crate::scheduler::Scheduler;

/// Default configuration file path, relative to the working directory.
const CONFIG_PATH: &str = "ascend-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration loading, the database connection,
/// migrations, or seeding fail. The sweep loop itself never returns.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing config file is fine: defaults plus DATABASE_URL cover the
    // common deployment.
    let path = Path::new(CONFIG_PATH);
    let config = if path.exists() {
        EngineConfig::from_file(path)?
    } else {
        EngineConfig::from_yaml("{}")?
    };

    // Initialize structured logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    if config.logging.json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("ascend-runner starting");
    info!(
        max_connections = config.database.max_connections,
        run_on_start = config.scheduler.run_on_start,
        "configuration loaded"
    );

    let pg_config = PostgresConfig::new(&config.database.url)
        .with_max_connections(config.database.max_connections)
        .with_connect_timeout(Duration::from_secs(10));
    let pool = PostgresPool::connect(&pg_config).await?;
    pool.run_migrations().await?;

    let seeded = seed_default_stats(pool.inner()).await?;
    if seeded > 0 {
        info!(seeded, "default stat catalog created");
    }

    info!("scheduler initialized, entering sweep loop");
    Scheduler::new(&pool)
        .run_forever(config.scheduler.run_on_start)
        .await;

    Ok(())
}
