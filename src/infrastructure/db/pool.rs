use crate::common::retry::{retry, Backoff, RetryError, RetryPolicy};
use sqlx::postgres::{PgPoolOptions, PgConnectOptions};
use sqlx::{Pool, Postgres, ConnectOptions};
use std::str::FromStr;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing::log::LevelFilter;

pub type DbPool = Pool<Postgres>;

fn pool_options() -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
}

pub async fn connect_to_db(connection_string: &str) -> Result<DbPool, sqlx::Error> {
    let options = PgConnectOptions::from_str(connection_string)?
        .log_statements(LevelFilter::Debug);

    let pool = pool_options().connect_with(options).await?;

    info!("✅ Connected to PostgreSQL");
    Ok(pool)
}

/// Connects with exponential backoff, for start-up while the database may still be booting.
pub async fn connect_with_retry(
    connection_string: &str,
    cancel: &CancellationToken,
) -> anyhow::Result<DbPool> {
    let policy = RetryPolicy::new(
        5,
        Backoff::Exponential {
            base: Duration::from_secs(1),
            max: Duration::from_secs(16),
        },
    );

    retry(&policy, cancel, move |_| async move {
        connect_to_db(connection_string).await.map_err(anyhow::Error::from)
    })
    .await
    .map_err(|e| match e {
        RetryError::Cancelled => anyhow::anyhow!("database connection cancelled"),
        other => other
            .into_last_error()
            .unwrap_or_else(|| anyhow::anyhow!("database connection timed out")),
    })
}

/// Pool that connects on first use.
pub fn lazy_pool(connection_string: &str) -> Result<DbPool, sqlx::Error> {
    let options = PgConnectOptions::from_str(connection_string)?;
    Ok(pool_options().connect_lazy_with(options))
}

pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("✅ Database schema up to date");
    Ok(())
}
