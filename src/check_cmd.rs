//! `dq check`: run the uniqueness engine on an ad-hoc question.

use anyhow::Result;

use crate::config::Config;
use crate::embedding;
use crate::store::SqliteHistoryStore;
use crate::uniqueness::{UniquenessEngine, Verdict};

pub async fn run_check(config: &Config, text: &str) -> Result<()> {
    let text = text.trim();
    if text.is_empty() {
        anyhow::bail!("question must not be empty");
    }

    let store = SqliteHistoryStore::open(config).await?;
    let provider = embedding::create_provider(&config.embedding)?;
    if !config.embedding.is_enabled() {
        tracing::warn!("embedding provider is disabled; only exact matches are detected");
    }

    let engine = UniquenessEngine::new(&store, provider.as_ref(), &config.similarity);
    let verdict = engine.check(text).await;

    println!("check");
    println!("  question:  {}", text);
    println!("  threshold: {}", engine.threshold());
    match &verdict {
        Verdict::Unique => println!("  verdict:   unique"),
        Verdict::ExactMatch(record) => {
            println!("  verdict:   exact duplicate");
            println!("  matches:   [{}] {}", record.id(), record.text());
        }
        Verdict::SemanticMatch { record, score } => {
            println!("  verdict:   similar ({:.4})", score);
            println!("  matches:   [{}] {}", record.id(), record.text());
        }
    }

    store.close().await;
    Ok(())
}
