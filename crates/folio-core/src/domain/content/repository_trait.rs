//! Repository trait for live content
//!
//! The version engine only ever writes live content through this trait, and
//! always with the connection of a transaction it already holds, so the
//! content write commits or rolls back together with the version insert.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::error::Result;

use super::entity::{Content, ContentUpdate};

/// Store for live post content
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Overwrite a post's title/body using the caller's connection
    ///
    /// Returns [`crate::Error::ContentNotFound`] if the post does not exist.
    async fn update_content(
        &self,
        conn: &mut SqliteConnection,
        content_id: Uuid,
        update: &ContentUpdate,
        updated_at: DateTime<Utc>,
    ) -> Result<Content>;

    /// Read a post using the caller's connection
    async fn find_content(
        &self,
        conn: &mut SqliteConnection,
        content_id: Uuid,
    ) -> Result<Option<Content>>;
}
