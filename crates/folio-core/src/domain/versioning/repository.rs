//! Version repository for database operations
//!
//! Handles all database interactions for post versions. Reads that back a
//! public operation go through the pool; everything the engine does inside a
//! transaction takes the transaction's connection instead.

use super::version::Version;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

/// Repository for version database operations
#[derive(Debug, Clone)]
pub struct VersionRepository {
    pool: SqlitePool,
}

impl VersionRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Highest stored version number for a post (0 if none exist)
    pub async fn max_version(conn: &mut SqliteConnection, content_id: Uuid) -> Result<i64> {
        let (max,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(MAX(version), 0) FROM post_versions WHERE content_id = ?",
        )
        .bind(content_id.to_string())
        .fetch_one(&mut *conn)
        .await
        .map_err(Error::DatabaseError)?;

        Ok(max)
    }

    /// Insert a version record
    ///
    /// A number already taken for the post fails with the unique index
    /// violation as a [`Error::DatabaseError`].
    pub async fn insert(conn: &mut SqliteConnection, version: &Version) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO post_versions (id, content_id, title, body, version, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(version.id.to_string())
        .bind(version.content_id.to_string())
        .bind(&version.title)
        .bind(&version.body)
        .bind(version.version)
        .bind(version.created_at)
        .execute(&mut *conn)
        .await
        .map_err(Error::DatabaseError)?;

        Ok(())
    }

    /// List versions for a post, newest first
    pub async fn list_by_content(&self, content_id: Uuid) -> Result<Vec<Version>> {
        let mut conn = self.pool.acquire().await?;
        Self::list_in(&mut conn, content_id).await
    }

    /// List versions for a post on the given connection, newest first
    pub async fn list_in(conn: &mut SqliteConnection, content_id: Uuid) -> Result<Vec<Version>> {
        let rows: Vec<VersionRow> = sqlx::query_as(
            r#"
            SELECT id, content_id, title, body, version, created_at
            FROM post_versions
            WHERE content_id = ?
            ORDER BY version DESC
            "#,
        )
        .bind(content_id.to_string())
        .fetch_all(&mut *conn)
        .await
        .map_err(Error::DatabaseError)?;

        rows.into_iter().map(VersionRow::into_version).collect()
    }

    /// Get a version by its number within a post
    pub async fn get_by_number(&self, content_id: Uuid, version: i64) -> Result<Option<Version>> {
        let row: Option<VersionRow> = sqlx::query_as(
            r#"
            SELECT id, content_id, title, body, version, created_at
            FROM post_versions
            WHERE content_id = ? AND version = ?
            "#,
        )
        .bind(content_id.to_string())
        .bind(version)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::DatabaseError)?;

        row.map(VersionRow::into_version).transpose()
    }

    /// Get a version by ID, scoped to a post
    pub async fn get_by_id(&self, content_id: Uuid, version_id: Uuid) -> Result<Option<Version>> {
        let mut conn = self.pool.acquire().await?;
        Self::find_by_id_in(&mut conn, content_id, version_id).await
    }

    /// Get a version by ID on the given connection, scoped to a post
    pub async fn find_by_id_in(
        conn: &mut SqliteConnection,
        content_id: Uuid,
        version_id: Uuid,
    ) -> Result<Option<Version>> {
        let row: Option<VersionRow> = sqlx::query_as(
            r#"
            SELECT id, content_id, title, body, version, created_at
            FROM post_versions
            WHERE id = ? AND content_id = ?
            "#,
        )
        .bind(version_id.to_string())
        .bind(content_id.to_string())
        .fetch_optional(&mut *conn)
        .await
        .map_err(Error::DatabaseError)?;

        row.map(VersionRow::into_version).transpose()
    }

    /// Delete a version record by ID
    pub async fn delete_in(conn: &mut SqliteConnection, version_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM post_versions WHERE id = ?")
            .bind(version_id.to_string())
            .execute(&mut *conn)
            .await
            .map_err(Error::DatabaseError)?;

        Ok(result.rows_affected() > 0)
    }
}

/// Database row for a version
#[derive(sqlx::FromRow)]
struct VersionRow {
    id: String,
    content_id: String,
    title: String,
    body: String,
    version: i64,
    created_at: DateTime<Utc>,
}

impl VersionRow {
    fn into_version(self) -> Result<Version> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| Error::Parse(format!("Invalid version ID: {}", e)))?;
        let content_id = Uuid::parse_str(&self.content_id)
            .map_err(|e| Error::Parse(format!("Invalid post ID: {}", e)))?;

        Ok(Version {
            id,
            content_id,
            title: self.title,
            body: self.body,
            version: self.version,
            created_at: self.created_at,
        })
    }
}
