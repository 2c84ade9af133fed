//! In-memory [`HistoryStore`] implementation for tests and dry runs.

use std::sync::RwLock;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;

use crate::models::{is_exact_match, QuestionRecord};

use super::HistoryStore;

/// In-memory store. Records are kept in insertion order behind a `RwLock`.
#[derive(Default)]
pub struct InMemoryHistoryStore {
    records: RwLock<Vec<QuestionRecord>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with the given records.
    pub fn with_records(records: Vec<QuestionRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Build a store from plain texts, one record per text.
    pub fn with_questions<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let now = Utc::now();
        let records = texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| QuestionRecord::new(i as i64 + 1, text, now))
            .collect();
        Self::with_records(records)
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> anyhow::Error {
    anyhow::anyhow!("in-memory history lock poisoned")
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn find_by_exact_text(&self, text: &str) -> Result<Option<QuestionRecord>> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records
            .iter()
            .find(|r| is_exact_match(r.text(), text))
            .cloned())
    }

    async fn list_all(&self) -> Result<Vec<QuestionRecord>> {
        let records = self.records.read().map_err(|_| poisoned())?;
        let mut all = records.clone();
        all.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id().cmp(&a.id()))
        });
        Ok(all)
    }

    async fn append(&self, text: &str) -> Result<QuestionRecord> {
        if text.trim().is_empty() {
            bail!("cannot record an empty question");
        }
        let mut records = self.records.write().map_err(|_| poisoned())?;
        let id = records.iter().map(|r| r.id()).max().unwrap_or(0) + 1;
        let record = QuestionRecord::new(id, text, Utc::now());
        records.push(record.clone());
        Ok(record)
    }
}
