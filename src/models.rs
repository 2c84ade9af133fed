//! Core data models shared by the store, the uniqueness engine, and the
//! report tool.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A question that has been accepted and recorded.
///
/// Records are created only by a [`HistoryStore`](crate::store::HistoryStore)
/// and are immutable afterwards: fields are private and there are no setters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionRecord {
    id: i64,
    text: String,
    created_at: DateTime<Utc>,
}

impl QuestionRecord {
    pub fn new(id: i64, text: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            text: text.into(),
            created_at,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Two recorded questions whose embeddings scored at or above a threshold.
///
/// Produced by [`find_similar_pairs`](crate::report::find_similar_pairs);
/// borrows the records from the snapshot it was computed over.
#[derive(Debug, Clone, Copy)]
pub struct SimilarPair<'a> {
    pub a: &'a QuestionRecord,
    pub b: &'a QuestionRecord,
    pub score: f32,
}

/// Case-folded form of a question used for exact-match comparison.
pub fn normalize_question(text: &str) -> String {
    text.to_lowercase()
}

/// Case-insensitive full-string equality.
pub fn is_exact_match(a: &str, b: &str) -> bool {
    normalize_question(a) == normalize_question(b)
}
