//! Deterministic collaborators shared by the integration tests.

#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use daily_question::chat::ChatPoster;
use daily_question::embedding::EmbeddingProvider;
use daily_question::generation::TextGenerator;
use daily_question::models::QuestionRecord;
use daily_question::store::HistoryStore;

// ─── Embedder ───────────────────────────────────────────────────────

/// Embeds texts by table lookup. Unknown texts fail, like a provider outage.
pub struct MapEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    calls: AtomicUsize,
}

impl MapEmbedder {
    pub fn new<'a>(entries: impl IntoIterator<Item = (&'a str, Vec<f32>)>) -> Self {
        Self {
            vectors: entries
                .into_iter()
                .map(|(text, v)| (text.to_string(), v))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    /// An embedder that knows no texts, so every call fails.
    pub fn empty() -> Self {
        Self::new(Vec::<(&str, Vec<f32>)>::new())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for MapEmbedder {
    fn model_name(&self) -> &str {
        "map"
    }
    fn dims(&self) -> usize {
        self.vectors.values().next().map(Vec::len).unwrap_or(0)
    }
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.vectors.get(text) {
            Some(v) => Ok(v.clone()),
            None => bail!("no embedding for {:?}", text),
        }
    }
}

/// Cancels the token on its first call, as a shutdown arriving while the
/// candidate is being checked, then fails like an unreachable provider.
pub struct CancellingEmbedder(pub CancellationToken);

#[async_trait]
impl EmbeddingProvider for CancellingEmbedder {
    fn model_name(&self) -> &str {
        "cancelling"
    }
    fn dims(&self) -> usize {
        2
    }
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        self.0.cancel();
        bail!("shutting down")
    }
}

/// A unit vector at the given cosine to `[1, 0]`.
pub fn at_cosine(cos: f32) -> Vec<f32> {
    vec![cos, (1.0 - cos * cos).sqrt()]
}

// ─── Generator ──────────────────────────────────────────────────────

/// Replays a fixed script; `None` entries are generation failures.
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Option<String>>>,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new(script: Vec<Option<&str>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().map(|s| s.map(str::to_string)).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Some(text)) => Ok(text),
            Some(None) => bail!("model unavailable"),
            None => bail!("script exhausted"),
        }
    }
}

/// Always returns the same text.
pub struct RepeatingGenerator(pub &'static str);

#[async_trait]
impl TextGenerator for RepeatingGenerator {
    async fn generate(&self) -> Result<String> {
        Ok(self.0.to_string())
    }
}

/// Sleeps before returning the same text every time.
pub struct SlowGenerator {
    pub text: &'static str,
    pub delay: Duration,
}

#[async_trait]
impl TextGenerator for SlowGenerator {
    async fn generate(&self) -> Result<String> {
        tokio::time::sleep(self.delay).await;
        Ok(self.text.to_string())
    }
}

// ─── Poster ─────────────────────────────────────────────────────────

/// Sleeps, then records that a message went out.
pub struct SlowPoster {
    delay: Duration,
    posted: Arc<AtomicBool>,
}

impl SlowPoster {
    /// Returns the poster and a flag that flips once it has posted.
    pub fn new(delay: Duration) -> (Self, Arc<AtomicBool>) {
        let posted = Arc::new(AtomicBool::new(false));
        (
            Self {
                delay,
                posted: posted.clone(),
            },
            posted,
        )
    }
}

#[async_trait]
impl ChatPoster for SlowPoster {
    async fn post(&self, _text: &str) -> Result<()> {
        tokio::time::sleep(self.delay).await;
        self.posted.store(true, Ordering::SeqCst);
        Ok(())
    }
}

// ─── Stores ─────────────────────────────────────────────────────────

/// Every operation fails.
pub struct BrokenStore;

#[async_trait]
impl HistoryStore for BrokenStore {
    async fn find_by_exact_text(&self, _text: &str) -> Result<Option<QuestionRecord>> {
        bail!("connection refused")
    }
    async fn list_all(&self) -> Result<Vec<QuestionRecord>> {
        bail!("connection refused")
    }
    async fn append(&self, _text: &str) -> Result<QuestionRecord> {
        bail!("connection refused")
    }
}

/// Reads succeed (empty history) but writes fail.
pub struct ReadOnlyStore;

#[async_trait]
impl HistoryStore for ReadOnlyStore {
    async fn find_by_exact_text(&self, _text: &str) -> Result<Option<QuestionRecord>> {
        Ok(None)
    }
    async fn list_all(&self) -> Result<Vec<QuestionRecord>> {
        Ok(Vec::new())
    }
    async fn append(&self, _text: &str) -> Result<QuestionRecord> {
        bail!("disk full")
    }
}
