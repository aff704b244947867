//! Version number allocation
//!
//! Numbers are read as `MAX(version) + 1` inside the writer's transaction and
//! validated by the unique index on `(content_id, version)`. A writer that
//! loses the race rolls back its whole transaction and tries again, up to a
//! bounded number of attempts.

use std::time::Duration;

use rand::Rng;
use sqlx::SqliteConnection;
use tokio::time::sleep;
use tracing::{debug, warn};
use uuid::Uuid;

use super::repository::VersionRepository;
use crate::config::VersioningConfig;
use crate::error::{Error, Result};

/// SQLite result codes that mean another writer got in first
///
/// `SQLITE_BUSY`, `SQLITE_LOCKED`, `SQLITE_BUSY_RECOVERY` and
/// `SQLITE_BUSY_SNAPSHOT`, as reported in extended form by the driver.
const BUSY_CODES: &[&str] = &["5", "6", "261", "517"];

/// Allocates per-post version numbers and paces collision retries
#[derive(Debug, Clone)]
pub struct VersionNumberAllocator {
    max_attempts: u32,
    retry_interval: Duration,
}

impl Default for VersionNumberAllocator {
    fn default() -> Self {
        Self::from_config(&VersioningConfig::default())
    }
}

impl VersionNumberAllocator {
    pub fn new(max_attempts: u32, retry_interval: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            retry_interval,
        }
    }

    pub fn from_config(config: &VersioningConfig) -> Self {
        Self::new(config.max_allocation_attempts, config.retry_interval())
    }

    /// Attempt budget per operation
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Next number for a post, read on the caller's transaction
    pub async fn next_number(&self, conn: &mut SqliteConnection, content_id: Uuid) -> Result<i64> {
        let next = VersionRepository::max_version(conn, content_id).await? + 1;
        debug!(content_id = %content_id, version = next, "Allocated version number");
        Ok(next)
    }

    /// Whether an error means a concurrent writer took the number or the snapshot
    pub fn is_collision(err: &Error) -> bool {
        match err {
            Error::DatabaseError(sqlx::Error::Database(db)) => {
                db.is_unique_violation()
                    || db
                        .code()
                        .is_some_and(|code| BUSY_CODES.contains(&code.as_ref()))
            }
            _ => false,
        }
    }

    /// Decide what to do after attempt `attempt` failed with `err`
    ///
    /// Returns `Ok(())` after backing off when the caller should run another
    /// attempt. Non-collision errors come back unchanged; a collision on the
    /// last attempt becomes [`Error::Conflict`].
    pub async fn after_failure(&self, content_id: Uuid, attempt: u32, err: Error) -> Result<()> {
        if !Self::is_collision(&err) {
            return Err(err);
        }

        if attempt >= self.max_attempts {
            warn!(
                content_id = %content_id,
                attempts = attempt,
                error = %err,
                "Version number allocation exhausted its retries"
            );
            return Err(Error::Conflict {
                content_id,
                attempts: attempt,
            });
        }

        let delay = self.backoff(attempt);
        warn!(
            content_id = %content_id,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "Version number collision, retrying"
        );
        sleep(delay).await;
        Ok(())
    }

    /// Delay before the attempt after `attempt`: linear in the attempt number plus jitter
    fn backoff(&self, attempt: u32) -> Duration {
        let base = self.retry_interval.saturating_mul(attempt);
        let jitter_ceiling = self.retry_interval.as_millis() as u64;
        if jitter_ceiling == 0 {
            return base;
        }
        let jitter = rand::thread_rng().gen_range(0..=jitter_ceiling);
        base + Duration::from_millis(jitter)
    }
}
