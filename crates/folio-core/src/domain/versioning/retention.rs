//! Retention policy for version history
//!
//! Keeps the newest `keep_count` versions of a post and deletes the rest,
//! oldest first. Age is never considered and live content is never touched.

use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use super::repository::VersionRepository;
use super::version::Version;
use crate::config::VersioningConfig;
use crate::error::Result;

/// Versions to delete from a newest-first listing
pub fn select_for_deletion(newest_first: &[Version], keep_count: usize) -> &[Version] {
    if newest_first.len() <= keep_count {
        &[]
    } else {
        &newest_first[keep_count..]
    }
}

/// Prunes old versions beyond a keep-count
#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    pool: SqlitePool,
    keep_count: usize,
}

impl RetentionPolicy {
    pub fn new(pool: SqlitePool, keep_count: usize) -> Self {
        Self { pool, keep_count }
    }

    pub fn from_config(pool: SqlitePool, config: &VersioningConfig) -> Self {
        Self::new(pool, config.keep_count)
    }

    /// Default number of versions kept
    pub fn keep_count(&self) -> usize {
        self.keep_count
    }

    /// Delete all but the newest versions of a post
    ///
    /// Uses the policy's keep-count when `keep_count` is `None`. Returns the
    /// number of deleted records. Selection and deletion share one
    /// transaction. A keep-count of zero clears the whole history; the next
    /// version recorded after that is numbered 1 again.
    pub async fn clean_old_versions(&self, content_id: Uuid, keep_count: Option<usize>) -> Result<u64> {
        let keep_count = keep_count.unwrap_or(self.keep_count);

        let mut tx = self.pool.begin().await?;
        let versions = VersionRepository::list_in(&mut *tx, content_id).await?;
        let doomed = select_for_deletion(&versions, keep_count);

        if doomed.is_empty() {
            debug!(
                content_id = %content_id,
                total = versions.len(),
                keep_count,
                "Nothing to prune"
            );
            return Ok(0);
        }

        let mut deleted = 0;
        for version in doomed {
            if VersionRepository::delete_in(&mut *tx, version.id).await? {
                deleted += 1;
            }
        }
        tx.commit().await?;

        info!(
            content_id = %content_id,
            deleted,
            kept = versions.len() - doomed.len(),
            "Pruned old versions"
        );

        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::content::ContentUpdate;
    use chrono::Utc;

    fn newest_first(count: i64) -> Vec<Version> {
        (1..=count)
            .rev()
            .map(|n| Version::new(Uuid::nil(), ContentUpdate::new("T", ""), n, Utc::now()))
            .collect()
    }

    #[test]
    fn test_nothing_selected_at_or_below_keep_count() {
        assert!(select_for_deletion(&newest_first(10), 10).is_empty());
        assert!(select_for_deletion(&newest_first(3), 10).is_empty());
        assert!(select_for_deletion(&[], 0).is_empty());
    }

    #[test]
    fn test_oldest_selected_beyond_keep_count() {
        let versions = newest_first(12);
        let doomed: Vec<i64> = select_for_deletion(&versions, 10)
            .iter()
            .map(|v| v.version)
            .collect();
        assert_eq!(doomed, vec![2, 1]);
    }

    #[test]
    fn test_keep_zero_selects_everything() {
        assert_eq!(select_for_deletion(&newest_first(4), 0).len(), 4);
    }
}
