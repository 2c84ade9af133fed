//! SQLite-backed [`HistoryStore`] implementation.
//!
//! Timestamps are stored as Unix milliseconds so that questions recorded in
//! quick succession (seeding, tests) still order deterministically.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::models::{normalize_question, QuestionRecord};

use super::HistoryStore;

/// SQLite implementation of the [`HistoryStore`] trait.
pub struct SqliteHistoryStore {
    pool: SqlitePool,
}

impl SqliteHistoryStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to the configured database, creating the schema if needed.
    pub async fn open(config: &Config) -> Result<Self> {
        let pool = db::connect(config).await?;
        migrate::apply_schema(&pool).await?;
        Ok(Self::new(pool))
    }

    pub async fn count(&self) -> Result<i64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn row_to_record(row: &SqliteRow) -> Result<QuestionRecord> {
    let id: i64 = row.try_get("id")?;
    let text: String = row.try_get("question")?;
    let created_ms: i64 = row.try_get("created_at")?;
    let created_at = DateTime::<Utc>::from_timestamp_millis(created_ms)
        .with_context(|| format!("question {} has an invalid timestamp: {}", id, created_ms))?;
    Ok(QuestionRecord::new(id, text, created_at))
}

#[async_trait]
impl HistoryStore for SqliteHistoryStore {
    async fn find_by_exact_text(&self, text: &str) -> Result<Option<QuestionRecord>> {
        let row = sqlx::query(
            "SELECT id, question, created_at FROM questions WHERE normalized = ? LIMIT 1",
        )
        .bind(normalize_question(text))
        .fetch_optional(&self.pool)
        .await
        .context("exact-match lookup failed")?;

        row.as_ref().map(row_to_record).transpose()
    }

    async fn list_all(&self) -> Result<Vec<QuestionRecord>> {
        let rows = sqlx::query(
            "SELECT id, question, created_at FROM questions ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to list question history")?;

        rows.iter().map(row_to_record).collect()
    }

    async fn append(&self, text: &str) -> Result<QuestionRecord> {
        if text.trim().is_empty() {
            bail!("cannot record an empty question");
        }

        let now = Utc::now();
        let created_ms = now.timestamp_millis();

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO questions (question, normalized, created_at) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(text)
        .bind(normalize_question(text))
        .bind(created_ms)
        .fetch_one(&self.pool)
        .await
        .context("failed to record question")?;

        // Round-trip through millis so the returned record matches what a
        // later read produces.
        let created_at = DateTime::<Utc>::from_timestamp_millis(created_ms).unwrap_or(now);
        Ok(QuestionRecord::new(id, text, created_at))
    }
}
