//! The uniqueness engine: decides whether a candidate question is new enough
//! to post.
//!
//! # Algorithm
//!
//! ```text
//! candidate ──▶ exact match? ──yes──▶ ExactMatch
//!                   │ no
//!                   ▼
//!             embed candidate ──fail──▶ Unique (semantic check skipped)
//!                   │
//!                   ▼
//!     for each record (newest first):
//!        embed record ──fail──▶ skip pair
//!        cosine ≥ threshold ──▶ SemanticMatch (stop)
//!                   │
//!                   ▼
//!                Unique
//! ```
//!
//! # Failure policy
//!
//! - Store read failures are **fail-open**: the candidate is reported unique
//!   and a warning is logged. Posting a rare duplicate is preferred over
//!   never posting at all.
//! - Embedding failures and dimension mismatches only disable the affected
//!   comparison; they never abort the check.
//!
//! # Cost
//!
//! A check issues one embedding request for the candidate plus one per
//! historical record it has to compare (O(N) calls), and the acquisition
//! loop may repeat that for every attempt. Nothing is cached between
//! checks because every acceptance grows the corpus. That is fine for a
//! team's daily-question history (hundreds of records), and it is the
//! first thing to revisit if the history ever grows into the thousands.
//!
//! There is no minimum-history gate: the semantic check runs against
//! whatever history exists.

use crate::config::SimilarityConfig;
use crate::embedding::EmbeddingProvider;
use crate::models::{is_exact_match, QuestionRecord};
use crate::similarity::cosine_similarity;
use crate::store::HistoryStore;

/// Outcome of a uniqueness check.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Unique,
    /// The candidate equals a recorded question, ignoring case.
    ExactMatch(QuestionRecord),
    /// The candidate's embedding is too close to a recorded question's.
    SemanticMatch { record: QuestionRecord, score: f32 },
}

impl Verdict {
    pub fn is_unique(&self) -> bool {
        matches!(self, Verdict::Unique)
    }
}

/// Exact-match plus semantic-match gate over the question history.
pub struct UniquenessEngine<'a> {
    store: &'a dyn HistoryStore,
    embedder: &'a dyn EmbeddingProvider,
    threshold: f64,
}

impl<'a> UniquenessEngine<'a> {
    pub fn new(
        store: &'a dyn HistoryStore,
        embedder: &'a dyn EmbeddingProvider,
        config: &SimilarityConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            threshold: config.threshold,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// `true` when `candidate` is neither an exact nor a semantic duplicate
    /// of anything currently in the store.
    pub async fn is_unique(&self, candidate: &str) -> bool {
        self.check(candidate).await.is_unique()
    }

    /// Run the full check against a fresh snapshot of the store.
    pub async fn check(&self, candidate: &str) -> Verdict {
        match self.store.find_by_exact_text(candidate).await {
            Ok(Some(record)) => {
                tracing::info!(id = record.id(), "candidate is an exact duplicate");
                return Verdict::ExactMatch(record);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("exact-match lookup failed, assuming unique: {e:#}");
                return Verdict::Unique;
            }
        }

        let history = match self.store.list_all().await {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!("history read failed, assuming unique: {e:#}");
                return Verdict::Unique;
            }
        };

        self.check_against(candidate, &history).await
    }

    /// Check `candidate` against an explicit history snapshot.
    ///
    /// The exact-match pass runs over the snapshot itself, so this works
    /// without any store lookup.
    pub async fn check_against(&self, candidate: &str, history: &[QuestionRecord]) -> Verdict {
        if let Some(record) = history.iter().find(|r| is_exact_match(r.text(), candidate)) {
            tracing::info!(id = record.id(), "candidate is an exact duplicate");
            return Verdict::ExactMatch(record.clone());
        }

        if history.is_empty() {
            return Verdict::Unique;
        }

        let candidate_vec = match self.embedder.embed(candidate).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("could not embed candidate, skipping semantic check: {e:#}");
                return Verdict::Unique;
            }
        };

        for record in history {
            let record_vec = match self.embedder.embed(record.text()).await {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(id = record.id(), "could not embed past question: {e:#}");
                    continue;
                }
            };

            let score = match cosine_similarity(&candidate_vec, &record_vec) {
                Ok(score) => score,
                Err(e) => {
                    tracing::warn!(id = record.id(), "skipping comparison: {e}");
                    continue;
                }
            };

            tracing::debug!(id = record.id(), score, "compared with past question");

            if f64::from(score) >= self.threshold {
                tracing::info!(
                    id = record.id(),
                    score,
                    threshold = self.threshold,
                    "candidate is a semantic duplicate"
                );
                return Verdict::SemanticMatch {
                    record: record.clone(),
                    score,
                };
            }
        }

        Verdict::Unique
    }
}
