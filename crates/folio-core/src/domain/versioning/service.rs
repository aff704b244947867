//! Version service
//!
//! The engine's public surface: records versions, reads history, compares
//! versions, restores and prunes. Every write that adds a version runs as
//! one transaction per attempt, retried on number collisions.

use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::allocator::VersionNumberAllocator;
use super::diff::VersionDiff;
use super::repository::VersionRepository;
use super::restore::{RestoreCoordinator, RestoreResult, into_transaction_failure};
use super::retention::RetentionPolicy;
use super::version::{Version, VersionStats};
use crate::clock::{Clock, SystemClock};
use crate::config::VersioningConfig;
use crate::domain::content::{Content, ContentRepository, ContentStore, ContentUpdate};
use crate::error::{Error, Result};

/// Entry point for version history operations
#[derive(Clone)]
pub struct VersionService {
    pool: SqlitePool,
    repository: VersionRepository,
    content_store: Arc<dyn ContentStore>,
    clock: Arc<dyn Clock>,
    allocator: VersionNumberAllocator,
    config: VersioningConfig,
}

impl VersionService {
    /// Create a service over `pool` with the SQLite content store, the
    /// system clock and default settings
    pub fn new(pool: SqlitePool) -> Self {
        let config = VersioningConfig::default();
        Self {
            repository: VersionRepository::new(pool.clone()),
            content_store: Arc::new(ContentRepository::new(pool.clone())),
            clock: Arc::new(SystemClock),
            allocator: VersionNumberAllocator::from_config(&config),
            config,
            pool,
        }
    }

    pub fn with_config(mut self, config: VersioningConfig) -> Self {
        self.allocator = VersionNumberAllocator::from_config(&config);
        self.config = config;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_content_store(mut self, content_store: Arc<dyn ContentStore>) -> Self {
        self.content_store = content_store;
        self
    }

    pub fn config(&self) -> &VersioningConfig {
        &self.config
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create a post together with its first version
    pub async fn create_content(
        &self,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<(Content, Version)> {
        let now = self.clock.now();
        let content = Content::new(title, body, now);
        let version = Version::new(
            content.id,
            ContentUpdate::new(content.title.clone(), content.body.clone()),
            1,
            now,
        );

        let mut tx = self.pool.begin().await?;
        ContentRepository::insert(&mut *tx, &content).await?;
        VersionRepository::insert(&mut *tx, &version).await?;
        tx.commit().await?;

        info!(content_id = %content.id, title = %content.title, "Created post");
        Ok((content, version))
    }

    /// Record a snapshot of a post as its next version
    ///
    /// Live content is left as it is. Fails with [`Error::ContentNotFound`]
    /// for an unknown post and [`Error::Conflict`] when concurrent writers
    /// keep taking the allocated number.
    pub async fn create_version(
        &self,
        content_id: Uuid,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<Version> {
        let snapshot = ContentUpdate::new(title, body);

        let mut attempt = 0;
        let version = loop {
            attempt += 1;
            match self.create_version_once(content_id, &snapshot).await {
                Ok(version) => break version,
                Err(err) => self.allocator.after_failure(content_id, attempt, err).await?,
            }
        };

        info!(
            content_id = %content_id,
            version = version.version,
            attempts = attempt,
            "Created version"
        );

        self.auto_prune(content_id).await;
        Ok(version)
    }

    async fn create_version_once(&self, content_id: Uuid, snapshot: &ContentUpdate) -> Result<Version> {
        let mut tx = self.pool.begin().await?;

        self.content_store
            .find_content(&mut *tx, content_id)
            .await?
            .ok_or(Error::ContentNotFound(content_id))?;

        let number = self.allocator.next_number(&mut *tx, content_id).await?;
        let version = Version::new(content_id, snapshot.clone(), number, self.clock.now());
        VersionRepository::insert(&mut *tx, &version).await?;

        tx.commit().await?;
        Ok(version)
    }

    /// Apply an edit to live content and record it as a new version
    ///
    /// Both writes share one transaction. Errors other than lookup failures
    /// and conflicts surface as [`Error::TransactionFailed`].
    pub async fn record_edit(
        &self,
        content_id: Uuid,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<(Content, Version)> {
        self.record_partial_edit(content_id, Some(title.into()), Some(body.into()))
            .await
    }

    /// Like [`record_edit`](Self::record_edit), keeping the live title or
    /// body where `None` is given
    ///
    /// Kept fields are read inside the edit's transaction, so an edit that
    /// commits concurrently is never overwritten with stale values.
    pub async fn record_partial_edit(
        &self,
        content_id: Uuid,
        title: Option<String>,
        body: Option<String>,
    ) -> Result<(Content, Version)> {
        let mut attempt = 0;
        let (content, version) = loop {
            attempt += 1;
            match self
                .record_edit_once(content_id, title.as_deref(), body.as_deref())
                .await
            {
                Ok(recorded) => break recorded,
                Err(err) => self
                    .allocator
                    .after_failure(content_id, attempt, err)
                    .await
                    .map_err(into_transaction_failure)?,
            }
        };

        info!(
            content_id = %content_id,
            version = version.version,
            attempts = attempt,
            "Recorded edit"
        );

        self.auto_prune(content_id).await;
        Ok((content, version))
    }

    async fn record_edit_once(
        &self,
        content_id: Uuid,
        title: Option<&str>,
        body: Option<&str>,
    ) -> Result<(Content, Version)> {
        let mut tx = self.pool.begin().await?;

        let update = match (title, body) {
            (Some(title), Some(body)) => ContentUpdate::new(title, body),
            _ => {
                let current = self
                    .content_store
                    .find_content(&mut *tx, content_id)
                    .await?
                    .ok_or(Error::ContentNotFound(content_id))?;
                ContentUpdate::new(
                    title.unwrap_or(current.title.as_str()),
                    body.unwrap_or(current.body.as_str()),
                )
            }
        };

        let number = self.allocator.next_number(&mut *tx, content_id).await?;
        let now = self.clock.now();

        // Live content first so an unknown post fails before the version
        // insert trips the foreign key
        let content = self
            .content_store
            .update_content(&mut *tx, content_id, &update, now)
            .await?;

        let version = Version::new(content_id, update, number, now);
        VersionRepository::insert(&mut *tx, &version).await?;

        tx.commit().await?;
        Ok((content, version))
    }

    /// All versions of a post, newest first
    ///
    /// An unknown post has an empty history.
    pub async fn list_versions(&self, content_id: Uuid) -> Result<Vec<Version>> {
        let versions = self.repository.list_by_content(content_id).await?;
        debug!(content_id = %content_id, count = versions.len(), "Listed versions");
        Ok(versions)
    }

    /// A version by number
    pub async fn get_version(&self, content_id: Uuid, version: i64) -> Result<Version> {
        self.repository
            .get_by_number(content_id, version)
            .await?
            .ok_or(Error::VersionNotFound {
                content_id,
                version,
            })
    }

    /// A version by record id; ids of other posts' versions are not found
    pub async fn get_version_by_id(&self, content_id: Uuid, version_id: Uuid) -> Result<Version> {
        self.repository
            .get_by_id(content_id, version_id)
            .await?
            .ok_or(Error::VersionIdNotFound {
                content_id,
                version_id,
            })
    }

    /// Compare two versions of a post by number
    pub async fn compare_versions(
        &self,
        content_id: Uuid,
        from_version: i64,
        to_version: i64,
    ) -> Result<VersionDiff> {
        let from = self.get_version(content_id, from_version).await?;
        let to = self.get_version(content_id, to_version).await?;

        let diff = VersionDiff::between(&from, &to);
        debug!(
            content_id = %content_id,
            from = from_version,
            to = to_version,
            summary = %diff.summary,
            "Compared versions"
        );
        Ok(diff)
    }

    /// Restore a post to a version, returning the updated live content
    pub async fn restore_version(&self, content_id: Uuid, version_id: Uuid) -> Result<Content> {
        Ok(self.restore(content_id, version_id).await?.content)
    }

    /// Restore a post to a version, returning the full outcome
    pub async fn restore(&self, content_id: Uuid, version_id: Uuid) -> Result<RestoreResult> {
        let result = self
            .restore_coordinator()
            .restore(content_id, version_id)
            .await?;
        self.auto_prune(content_id).await;
        Ok(result)
    }

    /// Delete all but the newest `keep_count` versions (configured default when `None`)
    pub async fn clean_old_versions(&self, content_id: Uuid, keep_count: Option<usize>) -> Result<u64> {
        self.retention_policy()
            .clean_old_versions(content_id, keep_count)
            .await
    }

    /// Count and range of a post's stored versions
    pub async fn version_stats(&self, content_id: Uuid) -> Result<VersionStats> {
        let versions = self.repository.list_by_content(content_id).await?;
        Ok(VersionStats::from_newest_first(&versions))
    }

    pub fn restore_coordinator(&self) -> RestoreCoordinator {
        RestoreCoordinator::new(
            self.pool.clone(),
            Arc::clone(&self.content_store),
            Arc::clone(&self.clock),
            self.allocator.clone(),
        )
    }

    pub fn retention_policy(&self) -> RetentionPolicy {
        RetentionPolicy::from_config(self.pool.clone(), &self.config)
    }

    /// Post-commit pruning; the write already succeeded, so failures are only logged
    async fn auto_prune(&self, content_id: Uuid) {
        if !self.config.auto_prune {
            return;
        }
        if let Err(err) = self.clean_old_versions(content_id, None).await {
            warn!(content_id = %content_id, error = %err, "Automatic pruning failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::Database;
    use chrono::{Duration, TimeZone, Utc};

    async fn create_test_service() -> VersionService {
        let db = Database::in_memory()
            .await
            .expect("Failed to create test database");
        VersionService::new(db.pool().clone())
    }

    #[tokio::test]
    async fn test_create_content_records_first_version() {
        let service = create_test_service().await;
        let (content, version) = service.create_content("Hello", "body").await.unwrap();

        assert_eq!(version.version, 1);
        assert_eq!(version.content_id, content.id);
        assert!(content.matches(&version.snapshot()));
        assert_eq!(service.list_versions(content.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_version_numbers_sequentially() {
        let service = create_test_service().await;
        let (content, _) = service.create_content("Post", "v1").await.unwrap();

        let v2 = service.create_version(content.id, "Post", "v2").await.unwrap();
        let v3 = service.create_version(content.id, "Post", "v3").await.unwrap();
        assert_eq!((v2.version, v3.version), (2, 3));

        let live = ContentRepository::new(service.pool().clone())
            .get(content.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(live.body, "v1");
    }

    #[tokio::test]
    async fn test_first_version_of_post_without_history_is_one() {
        let service = create_test_service().await;
        let post = Content::new("Imported", "", Utc::now());
        ContentRepository::new(service.pool().clone())
            .create(&post)
            .await
            .unwrap();

        let version = service.create_version(post.id, "Imported", "").await.unwrap();
        assert_eq!(version.version, 1);
    }

    #[tokio::test]
    async fn test_create_version_for_missing_post() {
        let service = create_test_service().await;
        let missing = Uuid::new_v4();

        let err = service
            .create_version(missing, "x", "y")
            .await
            .expect_err("missing post must fail");
        assert!(matches!(err, Error::ContentNotFound(id) if id == missing));
    }

    #[tokio::test]
    async fn test_record_edit_updates_live_content() {
        let service = create_test_service().await;
        let (content, _) = service.create_content("Draft", "a").await.unwrap();

        let (live, version) = service.record_edit(content.id, "Final", "a\nb").await.unwrap();
        assert_eq!(version.version, 2);
        assert_eq!(live.title, "Final");
        assert!(live.matches(&version.snapshot()));
    }

    #[tokio::test]
    async fn test_record_edit_missing_post_leaves_no_version() {
        let service = create_test_service().await;
        let missing = Uuid::new_v4();

        let err = service.record_edit(missing, "x", "y").await.unwrap_err();
        assert!(matches!(err, Error::ContentNotFound(_)));
        assert!(service.list_versions(missing).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_partial_edit_keeps_live_fields() {
        let service = create_test_service().await;
        let (content, _) = service.create_content("Draft", "a").await.unwrap();
        service.record_edit(content.id, "Renamed", "a").await.unwrap();

        let (live, version) = service
            .record_partial_edit(content.id, None, Some("b".to_string()))
            .await
            .unwrap();
        assert_eq!(version.version, 3);
        assert_eq!((live.title.as_str(), live.body.as_str()), ("Renamed", "b"));
        assert!(live.matches(&version.snapshot()));

        let (live, _) = service
            .record_partial_edit(content.id, Some("Final".to_string()), None)
            .await
            .unwrap();
        assert_eq!((live.title.as_str(), live.body.as_str()), ("Final", "b"));
    }

    #[tokio::test]
    async fn test_partial_edit_missing_post() {
        let service = create_test_service().await;
        let missing = Uuid::new_v4();

        let err = service
            .record_partial_edit(missing, None, Some("b".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ContentNotFound(id) if id == missing));
        assert!(service.list_versions(missing).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_version_lookups() {
        let service = create_test_service().await;
        let (content, v1) = service.create_content("Post", "body").await.unwrap();

        assert_eq!(service.get_version(content.id, 1).await.unwrap(), v1);
        assert_eq!(service.get_version_by_id(content.id, v1.id).await.unwrap(), v1);

        let err = service.get_version(content.id, 2).await.unwrap_err();
        assert!(matches!(err, Error::VersionNotFound { version: 2, .. }));

        let err = service
            .get_version_by_id(content.id, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::VersionIdNotFound { .. }));
    }

    #[tokio::test]
    async fn test_compare_versions() {
        let service = create_test_service().await;
        let (content, _) = service.create_content("Post", "line1").await.unwrap();
        service.record_edit(content.id, "Post", "line1\nline2").await.unwrap();

        let diff = service.compare_versions(content.id, 1, 2).await.unwrap();
        assert!(!diff.title_changed);
        assert_eq!((diff.added, diff.removed), (1, 0));
        assert_eq!(diff.summary, "+1 / -0 lines");

        let same = service.compare_versions(content.id, 2, 2).await.unwrap();
        assert!(same.is_unchanged());

        let err = service.compare_versions(content.id, 1, 9).await.unwrap_err();
        assert!(matches!(err, Error::VersionNotFound { version: 9, .. }));
    }

    #[tokio::test]
    async fn test_timestamps_come_from_clock() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start).with_step(Duration::seconds(1)));
        let service = create_test_service().await.with_clock(clock);

        let (content, v1) = service.create_content("Post", "a").await.unwrap();
        let v2 = service.create_version(content.id, "Post", "b").await.unwrap();

        assert_eq!(content.created_at, start);
        assert_eq!(v1.created_at, start);
        assert_eq!(v2.created_at, start + Duration::seconds(1));
    }

    #[tokio::test]
    async fn test_auto_prune_keeps_history_bounded() {
        let config = VersioningConfig::default()
            .with_keep_count(3)
            .with_auto_prune(true);
        let service = create_test_service().await.with_config(config);
        let (content, _) = service.create_content("Post", "0").await.unwrap();

        for n in 1..=5 {
            service
                .record_edit(content.id, "Post", n.to_string())
                .await
                .unwrap();
        }

        let numbers: Vec<i64> = service
            .list_versions(content.id)
            .await
            .unwrap()
            .iter()
            .map(|v| v.version)
            .collect();
        assert_eq!(numbers, vec![6, 5, 4]);
    }

    #[tokio::test]
    async fn test_version_stats() {
        let service = create_test_service().await;
        let (content, _) = service.create_content("Post", "a").await.unwrap();
        service.create_version(content.id, "Post", "b").await.unwrap();

        let stats = service.version_stats(content.id).await.unwrap();
        assert_eq!(stats.total_count, 2);
        assert_eq!(stats.oldest_version, Some(1));
        assert_eq!(stats.newest_version, Some(2));

        let empty = service.version_stats(Uuid::new_v4()).await.unwrap();
        assert_eq!(empty.total_count, 0);
    }
}
