//! History storage abstraction.
//!
//! The [`HistoryStore`] trait is the single source of truth for which
//! questions have been asked. The uniqueness engine reads a fresh snapshot
//! through it on every check and keeps no cache of its own.
//!
//! | Backend | Module | Used by |
//! |---------|--------|---------|
//! | [`SqliteHistoryStore`] | [`sqlite`] | the CLI and server |
//! | [`InMemoryHistoryStore`] | [`memory`] | tests and `dq post --dry-run` |

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::QuestionRecord;

pub use memory::InMemoryHistoryStore;
pub use sqlite::SqliteHistoryStore;

/// Abstract storage backend for recorded questions.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`find_by_exact_text`](HistoryStore::find_by_exact_text) | Case-insensitive full-text equality lookup |
/// | [`list_all`](HistoryStore::list_all) | Every record, most recent first |
/// | [`append`](HistoryStore::append) | Record a newly accepted question |
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Find a record whose text equals `text`, ignoring case.
    async fn find_by_exact_text(&self, text: &str) -> Result<Option<QuestionRecord>>;

    /// Return all records ordered by creation time, newest first.
    async fn list_all(&self) -> Result<Vec<QuestionRecord>>;

    /// Record `text` and return the stored record with its assigned id.
    ///
    /// Fails on empty or whitespace-only text.
    async fn append(&self, text: &str) -> Result<QuestionRecord>;
}
