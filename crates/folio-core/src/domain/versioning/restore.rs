//! Version restoration
//!
//! Restoring never edits history. The target's snapshot is appended as a new
//! version and written to live content, both on one transaction: either the
//! post reads as the target and the new version exists, or nothing changed.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use super::allocator::VersionNumberAllocator;
use super::repository::VersionRepository;
use super::version::Version;
use crate::clock::Clock;
use crate::domain::content::{Content, ContentStore};
use crate::error::{Error, Result};

/// Outcome of a restore
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreResult {
    /// Live content after the restore
    pub content: Content,

    /// The version that was restored
    pub restored_from: i64,

    /// The version recorded by the restore
    pub version: Version,
}

impl RestoreResult {
    pub fn summary(&self) -> String {
        format!(
            "Restored '{}' to version {} (recorded as version {})",
            self.content.title, self.restored_from, self.version.version
        )
    }
}

/// Runs restores against the version table and a content store
#[derive(Clone)]
pub struct RestoreCoordinator {
    pool: SqlitePool,
    content_store: Arc<dyn ContentStore>,
    clock: Arc<dyn Clock>,
    allocator: VersionNumberAllocator,
}

impl RestoreCoordinator {
    pub fn new(
        pool: SqlitePool,
        content_store: Arc<dyn ContentStore>,
        clock: Arc<dyn Clock>,
        allocator: VersionNumberAllocator,
    ) -> Self {
        Self {
            pool,
            content_store,
            clock,
            allocator,
        }
    }

    /// Restore a post to one of its versions
    ///
    /// Fails with [`Error::VersionIdNotFound`] when the version does not
    /// belong to the post and [`Error::ContentNotFound`] when the post is
    /// gone. Allocation collisions retry the whole transaction and end in
    /// [`Error::Conflict`]; anything else becomes
    /// [`Error::TransactionFailed`].
    pub async fn restore(&self, content_id: Uuid, version_id: Uuid) -> Result<RestoreResult> {
        let start = Instant::now();
        info!(content_id = %content_id, version_id = %version_id, "Starting version restore");

        let mut attempt = 0;
        let result = loop {
            attempt += 1;
            match self.restore_once(content_id, version_id).await {
                Ok(result) => break result,
                Err(err) => self
                    .allocator
                    .after_failure(content_id, attempt, err)
                    .await
                    .map_err(into_transaction_failure)?,
            }
        };

        info!(
            content_id = %content_id,
            restored_from = result.restored_from,
            version = result.version.version,
            attempts = attempt,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Version restore complete"
        );

        Ok(result)
    }

    /// One attempt; dropping `tx` on any early return rolls everything back
    async fn restore_once(&self, content_id: Uuid, version_id: Uuid) -> Result<RestoreResult> {
        let mut tx = self.pool.begin().await?;

        let target = VersionRepository::find_by_id_in(&mut *tx, content_id, version_id)
            .await?
            .ok_or(Error::VersionIdNotFound {
                content_id,
                version_id,
            })?;
        let snapshot = target.snapshot();

        let number = self.allocator.next_number(&mut *tx, content_id).await?;
        let now = self.clock.now();
        let version = Version::new(content_id, snapshot.clone(), number, now);
        VersionRepository::insert(&mut *tx, &version).await?;
        debug!(content_id = %content_id, version = number, "Recorded restore as new version");

        let content = self
            .content_store
            .update_content(&mut *tx, content_id, &snapshot, now)
            .await?;

        tx.commit().await?;

        Ok(RestoreResult {
            content,
            restored_from: target.version,
            version,
        })
    }
}

/// Keep lookup and conflict errors; report everything else as a failed transaction
pub(super) fn into_transaction_failure(err: Error) -> Error {
    if err.is_not_found() || matches!(err, Error::Conflict { .. } | Error::TransactionFailed(_)) {
        err
    } else {
        Error::TransactionFailed(err.to_string())
    }
}
