//! The question acquisition loop.
//!
//! A bounded state machine that keeps asking the generator for candidates
//! until one passes the [`UniquenessEngine`] or the attempt budget runs out:
//!
//! ```text
//!            ┌──────────── duplicate / generation failure ───────────┐
//!            ▼                                                       │
//!      ┌────────────┐  candidate  ┌──────────┐  unique  ┌──────────┐ │
//!  ──▶ │ Generating │ ──────────▶ │ Checking │ ───────▶ │ Accepted │ │
//!      └────────────┘             └──────────┘          └──────────┘ │
//!            │ attempts == max          └────────────────────────────┘
//!            ▼
//!      ┌───────────┐
//!      │ Exhausted │
//!      └───────────┘
//! ```
//!
//! Every generator call consumes one attempt, whether it fails, yields a
//! duplicate, or yields the accepted question. Exhaustion is a normal
//! outcome ([`Acquisition::NotFound`]), not an error. The only error this
//! loop returns is a failure to record the accepted question.

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use crate::generation::TextGenerator;
use crate::models::QuestionRecord;
use crate::store::HistoryStore;
use crate::uniqueness::UniquenessEngine;

/// Result of one acquisition run.
#[derive(Debug, Clone, PartialEq)]
pub enum Acquisition {
    /// A unique question was generated and recorded.
    Accepted { record: QuestionRecord, attempts: u32 },
    /// Every attempt failed or produced a duplicate.
    NotFound { attempts: u32 },
    /// The run was cancelled before anything was recorded.
    Cancelled { attempts: u32 },
}

enum State {
    Generating,
    Checking(String),
    Accepted(String),
    Exhausted,
}

pub struct QuestionAcquirer<'a> {
    generator: &'a dyn TextGenerator,
    engine: UniquenessEngine<'a>,
    store: &'a dyn HistoryStore,
}

impl<'a> QuestionAcquirer<'a> {
    /// `store` is where accepted questions are recorded; it should be the
    /// same store the engine reads from.
    pub fn new(
        generator: &'a dyn TextGenerator,
        engine: UniquenessEngine<'a>,
        store: &'a dyn HistoryStore,
    ) -> Self {
        Self {
            generator,
            engine,
            store,
        }
    }

    /// Generate candidates until one is unique, making at most
    /// `max_attempts` generator calls.
    ///
    /// Cancellation is honoured before every generation and immediately
    /// before the accepted question is recorded; a cancelled run never
    /// writes to the store.
    ///
    /// # Errors
    ///
    /// Only when recording the accepted question fails. The question was
    /// generated but is not durably stored, so it must not be posted.
    pub async fn acquire_unique_question(
        &self,
        max_attempts: u32,
        cancel: &CancellationToken,
    ) -> Result<Acquisition> {
        let mut attempts = 0u32;
        let mut state = State::Generating;

        loop {
            state = match state {
                State::Generating => {
                    if cancel.is_cancelled() {
                        return Ok(Acquisition::Cancelled { attempts });
                    } else if attempts >= max_attempts {
                        State::Exhausted
                    } else {
                        attempts += 1;
                        tracing::info!(
                            "attempt {}/{} to generate a unique question",
                            attempts,
                            max_attempts
                        );
                        self.generate_candidate(cancel).await
                    }
                }
                State::Checking(candidate) => {
                    if self.engine.is_unique(&candidate).await {
                        State::Accepted(candidate)
                    } else {
                        tracing::info!("candidate rejected as a duplicate, trying again");
                        State::Generating
                    }
                }
                State::Accepted(candidate) => {
                    if cancel.is_cancelled() {
                        tracing::info!("cancelled before recording accepted question");
                        return Ok(Acquisition::Cancelled { attempts });
                    }
                    let record = self
                        .store
                        .append(&candidate)
                        .await
                        .context("accepted question could not be recorded")?;
                    tracing::info!(id = record.id(), attempts, "accepted question");
                    return Ok(Acquisition::Accepted { record, attempts });
                }
                State::Exhausted => {
                    tracing::warn!(
                        "failed to generate a unique question after {} attempts",
                        attempts
                    );
                    return Ok(Acquisition::NotFound { attempts });
                }
            };
        }
    }

    async fn generate_candidate(&self, cancel: &CancellationToken) -> State {
        let generated = tokio::select! {
            result = self.generator.generate() => result,
            _ = cancel.cancelled() => return State::Generating,
        };

        match generated {
            Ok(text) if !text.trim().is_empty() => {
                let candidate = text.trim().to_string();
                tracing::debug!(candidate = %candidate, "generated candidate");
                State::Checking(candidate)
            }
            Ok(_) => {
                tracing::warn!("generator returned an empty question");
                State::Generating
            }
            Err(e) => {
                tracing::warn!("question generation failed: {e:#}");
                State::Generating
            }
        }
    }
}
