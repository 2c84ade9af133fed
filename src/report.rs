//! Duplicate report over the whole question history.
//!
//! An offline tool for calibrating `similarity.threshold`: it embeds every
//! recorded question once, scores every unordered pair, and lists the pairs
//! at or above the threshold, most similar first. Unlike the uniqueness
//! engine, embeddings *are* cached here, because the corpus is frozen for
//! the duration of the report.
//!
//! Cost is O(N) embedding calls and O(N²) comparisons.

use anyhow::Result;

use crate::config::Config;
use crate::embedding::{self, EmbeddingProvider};
use crate::models::{QuestionRecord, SimilarPair};
use crate::similarity::cosine_similarity;
use crate::store::{HistoryStore, SqliteHistoryStore};

/// Find every pair of questions whose similarity is at least `threshold`.
///
/// Results are sorted by descending score; ties keep the `(i, j)` order in
/// which the pairs were generated. Questions whose embedding fails are left
/// out of the report with a warning.
pub async fn find_similar_pairs<'q>(
    questions: &'q [QuestionRecord],
    embedder: &dyn EmbeddingProvider,
    threshold: f64,
) -> Vec<SimilarPair<'q>> {
    let mut embeddings: Vec<Option<Vec<f32>>> = Vec::with_capacity(questions.len());
    for q in questions {
        match embedder.embed(q.text()).await {
            Ok(v) => embeddings.push(Some(v)),
            Err(e) => {
                tracing::warn!(id = q.id(), "could not embed question, excluding it: {e:#}");
                embeddings.push(None);
            }
        }
    }

    let mut pairs = Vec::new();
    for i in 0..questions.len() {
        let Some(vec_i) = &embeddings[i] else {
            continue;
        };
        for j in (i + 1)..questions.len() {
            let Some(vec_j) = &embeddings[j] else {
                continue;
            };
            let score = match cosine_similarity(vec_i, vec_j) {
                Ok(score) => score,
                Err(e) => {
                    tracing::warn!(a = questions[i].id(), b = questions[j].id(), "{e}");
                    continue;
                }
            };
            if f64::from(score) >= threshold {
                pairs.push(SimilarPair {
                    a: &questions[i],
                    b: &questions[j],
                    score,
                });
            }
        }
    }

    // Stable sort keeps generation order for equal scores.
    pairs.sort_by(|x, y| y.score.total_cmp(&x.score));
    pairs
}

/// `dq duplicates`: print the similar-pair report for the stored history.
pub async fn run_duplicates(config: &Config, threshold_override: Option<f64>) -> Result<()> {
    if !config.embedding.is_enabled() {
        anyhow::bail!("Embedding provider is disabled. Set [embedding] provider in config.");
    }

    let threshold = threshold_override.unwrap_or(config.similarity.threshold);
    if !(0.0..=1.0).contains(&threshold) {
        anyhow::bail!("--threshold must be in [0.0, 1.0]");
    }

    let provider = embedding::create_provider(&config.embedding)?;
    let store = SqliteHistoryStore::open(config).await?;
    let questions = store.list_all().await?;

    println!("duplicates");
    println!("  questions: {}", questions.len());
    println!("  threshold: {}", threshold);
    println!("  model:     {}", provider.model_name());

    if questions.len() < 2 {
        println!("  not enough questions to compare");
        store.close().await;
        return Ok(());
    }

    let pairs = find_similar_pairs(&questions, provider.as_ref(), threshold).await;

    if pairs.is_empty() {
        println!();
        println!("No similar question pairs found above threshold.");
    } else {
        println!();
        println!(
            "Found {} similar question pairs above threshold {}:",
            pairs.len(),
            threshold
        );
        for (n, pair) in pairs.iter().enumerate() {
            println!();
            println!("#{}  similarity {:.4}", n + 1, pair.score);
            println!(
                "  [{}] {}  {}",
                pair.a.id(),
                pair.a.created_at().format("%Y-%m-%d"),
                pair.a.text()
            );
            println!(
                "  [{}] {}  {}",
                pair.b.id(),
                pair.b.created_at().format("%Y-%m-%d"),
                pair.b.text()
            );
        }
        println!();
        println!("Consider lowering the threshold if these pairs slipped through.");
    }

    store.close().await;
    Ok(())
}
