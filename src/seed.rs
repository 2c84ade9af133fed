//! Seed the history with sample questions.
//!
//! Seeding gives the uniqueness engine something to compare against on a
//! fresh install. Samples already present (ignoring case) are skipped, so
//! the command can be run repeatedly.

use anyhow::Result;

use crate::config::Config;
use crate::store::{HistoryStore, SqliteHistoryStore};

pub const SAMPLE_QUESTIONS: &[&str] = &[
    "If you could have any superpower for a day, what would it be and how would you use it?",
    "What's a small daily habit that has improved your life significantly?",
    "If you could instantly master any skill, what would it be and why?",
    "What's the most memorable concert or live performance you've ever attended?",
    "If you could time travel to any period in history for a week, when and where would you go?",
    "What's a book or movie that changed your perspective on something important?",
    "If you could have dinner with any three people, living or dead, who would they be and why?",
    "What's your favorite way to recharge after a long work week?",
    "If you had to live in another country for a year, where would you choose and why?",
    "What's a personal goal you're currently working toward?",
];

/// Counts reported by [`seed_questions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeedSummary {
    pub added: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Append each of `questions` that is not already recorded.
///
/// Individual insert failures are counted and logged, not fatal.
pub async fn seed_questions(store: &dyn HistoryStore, questions: &[&str]) -> Result<SeedSummary> {
    let mut summary = SeedSummary::default();

    for &question in questions {
        if store.find_by_exact_text(question).await?.is_some() {
            summary.skipped += 1;
            continue;
        }
        match store.append(question).await {
            Ok(record) => {
                tracing::debug!(id = record.id(), "seeded question");
                summary.added += 1;
            }
            Err(e) => {
                tracing::warn!("failed to seed question: {e:#}");
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

/// `dq seed`
pub async fn run_seed(config: &Config) -> Result<()> {
    let store = SqliteHistoryStore::open(config).await?;
    let summary = seed_questions(&store, SAMPLE_QUESTIONS).await?;

    println!("seed");
    println!("  added:   {}", summary.added);
    println!("  skipped: {}", summary.skipped);
    if summary.failed > 0 {
        println!("  failed:  {}", summary.failed);
    }

    store.close().await;
    Ok(())
}
