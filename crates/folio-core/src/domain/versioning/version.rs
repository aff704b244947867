//! Version entity
//!
//! An immutable, numbered snapshot of a post's title and body.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::content::ContentUpdate;

/// A historical snapshot of a post
///
/// Created on every edit and every restore. Never updated afterwards; only
/// the retention policy deletes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    /// Unique identifier for this version record
    pub id: Uuid,

    /// The post this version belongs to
    pub content_id: Uuid,

    /// Title at snapshot time
    pub title: String,

    /// Body at snapshot time
    pub body: String,

    /// Position in the post's history, starting at 1
    pub version: i64,

    /// When this version was recorded
    pub created_at: DateTime<Utc>,
}

impl Version {
    pub fn new(
        content_id: Uuid,
        snapshot: ContentUpdate,
        version: i64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            content_id,
            title: snapshot.title,
            body: snapshot.body,
            version,
            created_at,
        }
    }

    /// The title/body pair this version captured
    pub fn snapshot(&self) -> ContentUpdate {
        ContentUpdate::new(self.title.clone(), self.body.clone())
    }

    /// Whether two versions captured the same title and body
    pub fn same_snapshot(&self, other: &Version) -> bool {
        self.title == other.title && self.body == other.body
    }
}

/// Statistics about a post's stored history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionStats {
    /// Number of stored version records
    pub total_count: usize,

    /// Lowest stored version number
    pub oldest_version: Option<i64>,

    /// Highest stored version number
    pub newest_version: Option<i64>,

    pub oldest_created_at: Option<DateTime<Utc>>,

    pub newest_created_at: Option<DateTime<Utc>>,
}

impl VersionStats {
    /// Build stats from a newest-first listing
    pub fn from_newest_first(versions: &[Version]) -> Self {
        let newest = versions.first();
        let oldest = versions.last();

        Self {
            total_count: versions.len(),
            oldest_version: oldest.map(|v| v.version),
            newest_version: newest.map(|v| v.version),
            oldest_created_at: oldest.map(|v| v.created_at),
            newest_created_at: newest.map(|v| v.created_at),
        }
    }

    /// Number of version numbers missing between oldest and newest
    ///
    /// Non-zero only after retention has pruned records.
    pub fn gaps(&self) -> i64 {
        match (self.oldest_version, self.newest_version) {
            (Some(oldest), Some(newest)) => newest - oldest + 1 - self.total_count as i64,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(number: i64, body: &str) -> Version {
        Version::new(Uuid::nil(), ContentUpdate::new("T", body), number, Utc::now())
    }

    #[test]
    fn test_snapshot_round_trips_title_and_body() {
        let v = version(1, "a\nb");
        assert_eq!(v.snapshot(), ContentUpdate::new("T", "a\nb"));
    }

    #[test]
    fn test_same_snapshot_ignores_number_and_id() {
        let a = version(1, "body");
        let b = version(4, "body");
        assert_ne!(a.id, b.id);
        assert!(a.same_snapshot(&b));
        assert!(!a.same_snapshot(&version(2, "other")));
    }

    #[test]
    fn test_stats_from_newest_first() {
        let versions = vec![version(7, "c"), version(6, "b"), version(3, "a")];
        let stats = VersionStats::from_newest_first(&versions);

        assert_eq!(stats.total_count, 3);
        assert_eq!(stats.newest_version, Some(7));
        assert_eq!(stats.oldest_version, Some(3));
        assert_eq!(stats.gaps(), 2);
    }

    #[test]
    fn test_stats_empty() {
        let stats = VersionStats::from_newest_first(&[]);
        assert_eq!(stats.total_count, 0);
        assert_eq!(stats.newest_version, None);
        assert_eq!(stats.gaps(), 0);
    }
}
