//! Listing the question history.
//!
//! Besides the plain listing, `dq history` groups questions that open with
//! the same few words. It is a cheap, embedding-free hint for near
//! duplicates ("If you could have dinner with ..." twice) and needs no
//! provider configured.

use anyhow::Result;
use std::collections::HashMap;

use crate::config::Config;
use crate::models::QuestionRecord;
use crate::store::{HistoryStore, SqliteHistoryStore};

/// Number of leading words compared by [`group_by_opening`].
pub const OPENING_WORDS: usize = 5;

/// Lower-cased first `n` whitespace-separated words of `text`.
pub fn opening_key(text: &str, n: usize) -> String {
    text.split_whitespace()
        .take(n)
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Groups of two or more records sharing the same opening words.
///
/// Groups appear in the order their first member appears in `records`.
pub fn group_by_opening(records: &[QuestionRecord], n: usize) -> Vec<Vec<&QuestionRecord>> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<&QuestionRecord>> = HashMap::new();

    for record in records {
        let key = opening_key(record.text(), n);
        if key.is_empty() {
            continue;
        }
        let entry = groups.entry(key.clone()).or_default();
        if entry.is_empty() {
            order.push(key);
        }
        entry.push(record);
    }

    order
        .into_iter()
        .filter_map(|key| groups.remove(&key))
        .filter(|group| group.len() > 1)
        .collect()
}

/// `dq history`
pub async fn run_history(config: &Config, limit: Option<usize>) -> Result<()> {
    let store = SqliteHistoryStore::open(config).await?;
    let records = store.list_all().await?;
    let shown = limit.unwrap_or(records.len()).min(records.len());

    println!("history");
    println!("  questions: {}", records.len());
    println!();

    if records.is_empty() {
        println!("  no questions recorded yet");
        store.close().await;
        return Ok(());
    }

    println!("  {:>5}  {:<16}  {}", "ID", "CREATED", "QUESTION");
    println!("  {}", "-".repeat(76));
    for record in &records[..shown] {
        println!(
            "  {:>5}  {:<16}  {}",
            record.id(),
            record.created_at().format("%Y-%m-%d %H:%M"),
            record.text()
        );
    }
    if shown < records.len() {
        println!("  ... {} more", records.len() - shown);
    }

    let groups = group_by_opening(&records, OPENING_WORDS);
    if !groups.is_empty() {
        println!();
        println!(
            "  {} group(s) share their first {} words:",
            groups.len(),
            OPENING_WORDS
        );
        for group in &groups {
            println!();
            for record in group {
                println!("    [{}] {}", record.id(), record.text());
            }
        }
    }

    store.close().await;
    Ok(())
}
