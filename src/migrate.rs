use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply_schema(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create the history schema on an open pool. Idempotent.
pub async fn apply_schema(pool: &SqlitePool) -> Result<()> {
    // `normalized` holds the Unicode lower-case form of `question`;
    // SQLite's own NOCASE only folds ASCII.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS questions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            question TEXT NOT NULL,
            normalized TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_questions_normalized ON questions(normalized)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_questions_created_at ON questions(created_at DESC)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
