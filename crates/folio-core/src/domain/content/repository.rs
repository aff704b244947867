//! Post repository for database operations
//!
//! Handles all database interactions for live post content.

use super::entity::{Content, ContentUpdate};
use super::repository_trait::ContentStore;
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

/// Repository for post database operations
#[derive(Debug, Clone)]
pub struct ContentRepository {
    pool: SqlitePool,
}

impl ContentRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert a new post
    pub async fn create(&self, content: &Content) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        Self::insert(&mut conn, content).await
    }

    /// Insert a new post on the given connection
    pub async fn insert(conn: &mut SqliteConnection, content: &Content) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO posts (id, title, body, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(content.id.to_string())
        .bind(&content.title)
        .bind(&content.body)
        .bind(content.created_at)
        .bind(content.updated_at)
        .execute(&mut *conn)
        .await
        .map_err(Error::DatabaseError)?;

        Ok(())
    }

    /// Get a post by ID
    pub async fn get(&self, content_id: Uuid) -> Result<Option<Content>> {
        let mut conn = self.pool.acquire().await?;
        self.find_content(&mut conn, content_id).await
    }

    /// List posts, most recently updated first
    pub async fn list(&self, limit: i64) -> Result<Vec<Content>> {
        let rows: Vec<ContentRow> = sqlx::query_as(
            r#"
            SELECT id, title, body, created_at, updated_at
            FROM posts
            ORDER BY updated_at DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        rows.into_iter().map(ContentRow::into_content).collect()
    }

    /// Delete a post and, by cascade, its version history
    pub async fn delete(&self, content_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(content_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(Error::DatabaseError)?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ContentStore for ContentRepository {
    async fn update_content(
        &self,
        conn: &mut SqliteConnection,
        content_id: Uuid,
        update: &ContentUpdate,
        updated_at: DateTime<Utc>,
    ) -> Result<Content> {
        let row: Option<ContentRow> = sqlx::query_as(
            r#"
            UPDATE posts
            SET title = ?, body = ?, updated_at = ?
            WHERE id = ?
            RETURNING id, title, body, created_at, updated_at
            "#,
        )
        .bind(&update.title)
        .bind(&update.body)
        .bind(updated_at)
        .bind(content_id.to_string())
        .fetch_optional(&mut *conn)
        .await
        .map_err(Error::DatabaseError)?;

        row.ok_or(Error::ContentNotFound(content_id))?.into_content()
    }

    async fn find_content(
        &self,
        conn: &mut SqliteConnection,
        content_id: Uuid,
    ) -> Result<Option<Content>> {
        let row: Option<ContentRow> = sqlx::query_as(
            r#"
            SELECT id, title, body, created_at, updated_at
            FROM posts
            WHERE id = ?
            "#,
        )
        .bind(content_id.to_string())
        .fetch_optional(&mut *conn)
        .await
        .map_err(Error::DatabaseError)?;

        row.map(ContentRow::into_content).transpose()
    }
}

/// Database row for a post
#[derive(sqlx::FromRow)]
struct ContentRow {
    id: String,
    title: String,
    body: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ContentRow {
    fn into_content(self) -> Result<Content> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| Error::Parse(format!("Invalid post ID: {}", e)))?;

        Ok(Content {
            id,
            title: self.title,
            body: self.body,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;
    use chrono::Duration;

    async fn create_test_repo() -> ContentRepository {
        let db = Database::in_memory()
            .await
            .expect("Failed to create test database");
        ContentRepository::new(db.pool().clone())
    }

    #[tokio::test]
    async fn test_create_and_get_post() {
        let repo = create_test_repo().await;
        let post = Content::new("Hello", "first line\nsecond line", Utc::now());

        repo.create(&post).await.expect("Failed to create");

        let retrieved = repo
            .get(post.id)
            .await
            .expect("Failed to get")
            .expect("Post not found");
        assert_eq!(retrieved.id, post.id);
        assert_eq!(retrieved.title, "Hello");
        assert_eq!(retrieved.body, "first line\nsecond line");
    }

    #[tokio::test]
    async fn test_get_missing_post() {
        let repo = create_test_repo().await;
        assert!(repo.get(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_content() {
        let repo = create_test_repo().await;
        let created_at = Utc::now() - Duration::hours(1);
        let post = Content::new("Draft", "body", created_at);
        repo.create(&post).await.unwrap();

        let now = Utc::now();
        let mut conn = repo.pool().acquire().await.unwrap();
        let updated = repo
            .update_content(&mut conn, post.id, &ContentUpdate::new("Final", "new body"), now)
            .await
            .expect("Failed to update");
        drop(conn);

        assert_eq!(updated.title, "Final");
        assert_eq!(updated.body, "new body");
        assert_eq!(updated.created_at, post.created_at);
        assert_eq!(updated.updated_at, now);

        let stored = repo.get(post.id).await.unwrap().unwrap();
        assert_eq!(stored, updated);
    }

    #[tokio::test]
    async fn test_update_missing_post_is_not_found() {
        let repo = create_test_repo().await;
        let missing = Uuid::new_v4();
        let mut conn = repo.pool().acquire().await.unwrap();

        let err = repo
            .update_content(&mut conn, missing, &ContentUpdate::new("x", "y"), Utc::now())
            .await
            .expect_err("update of a missing post must fail");
        assert!(matches!(err, Error::ContentNotFound(id) if id == missing));
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let repo = create_test_repo().await;
        let older = Content::new("Older", "", Utc::now() - Duration::minutes(5));
        let newer = Content::new("Newer", "", Utc::now());
        repo.create(&older).await.unwrap();
        repo.create(&newer).await.unwrap();

        let posts = repo.list(10).await.unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].id, newer.id);

        assert!(repo.delete(older.id).await.unwrap());
        assert!(!repo.delete(older.id).await.unwrap());
        assert_eq!(repo.list(10).await.unwrap().len(), 1);
    }
}
