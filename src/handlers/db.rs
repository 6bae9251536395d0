use log::{info, warn};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

pub const CONNECT_ATTEMPTS: u32 = 5;
pub const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(2);

pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(3600))
        .connect(database_url)
        .await
}

/// Connects to Postgres, retrying up to `attempts` times with a fixed delay.
/// Returns the last error once attempts are exhausted.
pub async fn connect_with_retry(
    database_url: &str,
    attempts: u32,
    delay: Duration,
) -> Result<PgPool, sqlx::Error> {
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match connect(database_url).await {
            Ok(pool) => {
                info!("connected to Postgres on attempt {}/{}", attempt, attempts);
                return Ok(pool);
            }
            Err(e) if attempt >= attempts => return Err(e),
            Err(e) => {
                warn!(
                    "Postgres connection attempt {}/{} failed: {}",
                    attempt, attempts, e
                );
                attempt += 1;
                tokio::time::sleep(delay).await;
            }
        }
    }
}

pub async fn check_db_connection(pool: &PgPool) -> bool {
    match pool.acquire().await {
        Ok(_) => true,
        Err(e) => {
            log::error!("Database connection check failed: {}", e);
            false
        }
    }
}
