//! Catalog repository
//!
//! Persistence seam for match records. Every write is a whole-record create
//! or overwrite; last write wins and no multi-step transactions exist.

use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};

use crate::models::{MatchId, MatchRecord};
use crate::Result;

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Insert a new record. The caller supplies the generated id.
    async fn create(&self, record: &MatchRecord) -> Result<MatchRecord>;

    /// Overwrite every mutable field of an existing record.
    /// Fails with `NotFound` when the id does not exist.
    async fn update(&self, record: &MatchRecord) -> Result<MatchRecord>;

    /// Hard delete. Returns whether a record was removed.
    async fn delete(&self, id: &MatchId) -> Result<bool>;

    async fn get(&self, id: &MatchId) -> Result<Option<MatchRecord>>;

    /// All records, newest first.
    async fn list_by_created_desc(&self) -> Result<Vec<MatchRecord>>;
}

/// Postgres-backed catalog repository
#[derive(Clone)]
pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_record(&self, row: PgRow) -> Result<MatchRecord> {
        let status: String = row.try_get("status")?;
        Ok(MatchRecord {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            poster_url: row.try_get("poster_url")?,
            stream_url: row.try_get("stream_url")?,
            status: status.parse()?,
            created_at: row.try_get("created_at")?,
            cookie: row.try_get("cookie")?,
            kid: row.try_get("drm_kid")?,
            key: row.try_get("drm_key")?,
        })
    }
}

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn create(&self, record: &MatchRecord) -> Result<MatchRecord> {
        let row = sqlx::query(
            "INSERT INTO matches (id, title, poster_url, stream_url, status, created_at, cookie, drm_kid, drm_key)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING id, title, poster_url, stream_url, status, created_at, cookie, drm_kid, drm_key",
        )
        .bind(record.id.as_str())
        .bind(&record.title)
        .bind(&record.poster_url)
        .bind(&record.stream_url)
        .bind(record.status.as_str())
        .bind(record.created_at)
        .bind(&record.cookie)
        .bind(&record.kid)
        .bind(&record.key)
        .fetch_one(&self.pool)
        .await?;

        self.row_to_record(row)
    }

    async fn update(&self, record: &MatchRecord) -> Result<MatchRecord> {
        let row = sqlx::query(
            "UPDATE matches
             SET title = $2, poster_url = $3, stream_url = $4, status = $5, cookie = $6, drm_kid = $7, drm_key = $8
             WHERE id = $1
             RETURNING id, title, poster_url, stream_url, status, created_at, cookie, drm_kid, drm_key",
        )
        .bind(record.id.as_str())
        .bind(&record.title)
        .bind(&record.poster_url)
        .bind(&record.stream_url)
        .bind(record.status.as_str())
        .bind(&record.cookie)
        .bind(&record.kid)
        .bind(&record.key)
        .fetch_one(&self.pool)
        .await?;

        self.row_to_record(row)
    }

    async fn delete(&self, id: &MatchId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM matches WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get(&self, id: &MatchId) -> Result<Option<MatchRecord>> {
        let row = sqlx::query(
            "SELECT id, title, poster_url, stream_url, status, created_at, cookie, drm_kid, drm_key
             FROM matches
             WHERE id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.row_to_record(row)?)),
            None => Ok(None),
        }
    }

    async fn list_by_created_desc(&self) -> Result<Vec<MatchRecord>> {
        let rows = sqlx::query(
            "SELECT id, title, poster_url, stream_url, status, created_at, cookie, drm_kid, drm_key
             FROM matches
             ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| self.row_to_record(row))
            .collect()
    }
}
