//! One posting cycle: acquire a unique question, then post it.
//!
//! Posting is gated on persistence. The acquisition loop records the
//! question before this module posts it, so a store write failure means
//! nothing is posted. The reverse gap remains: when recording succeeds and
//! posting fails, the question stays recorded and the error names its id
//! so an operator can repost it by hand.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::acquire::{Acquisition, QuestionAcquirer};
use crate::chat::{self, format_question_message, ChatPoster, StdoutPoster};
use crate::config::Config;
use crate::embedding::{self, EmbeddingProvider};
use crate::generation::{self, TextGenerator};
use crate::models::QuestionRecord;
use crate::store::{HistoryStore, InMemoryHistoryStore, SqliteHistoryStore};
use crate::uniqueness::UniquenessEngine;

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Posted { record: QuestionRecord, attempts: u32 },
    /// No unique question within the attempt budget; nothing was posted.
    Skipped { attempts: u32 },
    Cancelled,
}

/// The configured collaborators for running posting cycles.
pub struct Bot {
    config: Config,
    store: Arc<dyn HistoryStore>,
    embedder: Box<dyn EmbeddingProvider>,
    generator: Box<dyn TextGenerator>,
    poster: Box<dyn ChatPoster>,
}

impl Bot {
    pub fn new(
        config: Config,
        store: Arc<dyn HistoryStore>,
        embedder: Box<dyn EmbeddingProvider>,
        generator: Box<dyn TextGenerator>,
        poster: Box<dyn ChatPoster>,
    ) -> Self {
        Self {
            config,
            store,
            embedder,
            generator,
            poster,
        }
    }

    /// Build a bot from configuration, backed by the SQLite history.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let store = SqliteHistoryStore::open(config).await?;
        Ok(Self::new(
            config.clone(),
            Arc::new(store),
            embedding::create_provider(&config.embedding)?,
            generation::create_generator(&config.generation)?,
            chat::create_poster(&config.chat)?,
        ))
    }

    /// Like [`from_config`](Bot::from_config), but checks against an
    /// in-memory copy of the history and prints instead of posting, so
    /// nothing durable changes.
    pub async fn dry_run_from_config(config: &Config) -> Result<Self> {
        let sqlite = SqliteHistoryStore::open(config).await?;
        let history = sqlite.list_all().await?;
        sqlite.close().await;

        Ok(Self::new(
            config.clone(),
            Arc::new(InMemoryHistoryStore::with_records(history)),
            embedding::create_provider(&config.embedding)?,
            generation::create_generator(&config.generation)?,
            Box::new(StdoutPoster),
        ))
    }

    pub fn store(&self) -> &dyn HistoryStore {
        self.store.as_ref()
    }

    /// Run one cycle. `max_attempts` overrides `generation.max_attempts`.
    pub async fn run_cycle(
        &self,
        max_attempts: Option<u32>,
        cancel: &CancellationToken,
    ) -> Result<CycleOutcome> {
        let max_attempts = max_attempts.unwrap_or(self.config.generation.max_attempts);
        let engine = UniquenessEngine::new(
            self.store.as_ref(),
            self.embedder.as_ref(),
            &self.config.similarity,
        );
        let acquirer = QuestionAcquirer::new(self.generator.as_ref(), engine, self.store.as_ref());

        match acquirer.acquire_unique_question(max_attempts, cancel).await? {
            Acquisition::Accepted { record, attempts } => {
                let message =
                    format_question_message(self.config.chat.mention.as_deref(), record.text());
                self.poster.post(&message).await.with_context(|| {
                    format!(
                        "question {} was recorded but posting it failed",
                        record.id()
                    )
                })?;
                tracing::info!(id = record.id(), "posted daily question");
                Ok(CycleOutcome::Posted { record, attempts })
            }
            Acquisition::NotFound { attempts } => Ok(CycleOutcome::Skipped { attempts }),
            Acquisition::Cancelled { .. } => Ok(CycleOutcome::Cancelled),
        }
    }
}

/// `dq post`: run a single cycle, cancelling cleanly on Ctrl-C.
pub async fn run_post(config: &Config, max_attempts: Option<u32>, dry_run: bool) -> Result<()> {
    if !config.generation.is_enabled() {
        anyhow::bail!("Generation provider is disabled. Set [generation] provider in config.");
    }
    if max_attempts == Some(0) {
        anyhow::bail!("--max-attempts must be >= 1");
    }

    let bot = if dry_run {
        Bot::dry_run_from_config(config).await?
    } else {
        Bot::from_config(config).await?
    };

    let cancel = CancellationToken::new();
    let watcher = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling cycle");
            watcher.cancel();
        }
    });

    let outcome = bot.run_cycle(max_attempts, &cancel).await?;

    println!();
    match outcome {
        CycleOutcome::Posted { record, attempts } => {
            println!("post{}", if dry_run { " (dry-run)" } else { "" });
            println!("  id:       {}", record.id());
            println!("  attempts: {}", attempts);
            println!("  question: {}", record.text());
        }
        CycleOutcome::Skipped { attempts } => {
            println!("post");
            println!("  no unique question found after {} attempts; skipped", attempts);
        }
        CycleOutcome::Cancelled => {
            println!("post");
            println!("  cancelled; nothing recorded");
        }
    }

    Ok(())
}
