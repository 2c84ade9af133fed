//! The retry-until-unique acquisition loop.

mod common;

use common::{CancellingEmbedder, MapEmbedder, ReadOnlyStore, RepeatingGenerator, ScriptedGenerator};
use daily_question::acquire::{Acquisition, QuestionAcquirer};
use daily_question::config::SimilarityConfig;
use daily_question::store::{HistoryStore, InMemoryHistoryStore};
use daily_question::uniqueness::UniquenessEngine;
use tokio_util::sync::CancellationToken;

const OLD: &str = "What's your favorite book?";
const FRESH: &str = "What's a tradition you'd like to start?";

fn similarity() -> SimilarityConfig {
    SimilarityConfig { threshold: 0.85 }
}

#[tokio::test]
async fn accepts_after_generation_failures() {
    let store = InMemoryHistoryStore::with_questions([OLD]);
    let embedder = MapEmbedder::new([(OLD, vec![1.0, 0.0]), (FRESH, vec![0.0, 1.0])]);
    let generator = ScriptedGenerator::new(vec![None, None, None, Some(FRESH)]);
    let engine = UniquenessEngine::new(&store, &embedder, &similarity());
    let acquirer = QuestionAcquirer::new(&generator, engine, &store);

    let result = acquirer
        .acquire_unique_question(5, &CancellationToken::new())
        .await
        .unwrap();

    match result {
        Acquisition::Accepted { record, attempts } => {
            assert_eq!(record.text(), FRESH);
            assert_eq!(attempts, 4);
        }
        other => panic!("expected acceptance, got {:?}", other),
    }
    assert_eq!(generator.calls(), 4);
    assert_eq!(store.len(), 2);
    assert!(store.find_by_exact_text(FRESH).await.unwrap().is_some());
}

#[tokio::test]
async fn duplicates_consume_attempts_until_exhausted() {
    let store = InMemoryHistoryStore::with_questions([OLD]);
    let embedder = MapEmbedder::empty();
    let generator = RepeatingGenerator("what's your FAVORITE book?");
    let engine = UniquenessEngine::new(&store, &embedder, &similarity());
    let acquirer = QuestionAcquirer::new(&generator, engine, &store);

    let result = acquirer
        .acquire_unique_question(5, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result, Acquisition::NotFound { attempts: 5 });
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn never_exceeds_max_attempts() {
    let store = InMemoryHistoryStore::new();
    let embedder = MapEmbedder::empty();
    let generator = ScriptedGenerator::new(vec![None; 20]);
    let engine = UniquenessEngine::new(&store, &embedder, &similarity());
    let acquirer = QuestionAcquirer::new(&generator, engine, &store);

    let result = acquirer
        .acquire_unique_question(12, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result, Acquisition::NotFound { attempts: 12 });
    assert_eq!(generator.calls(), 12);
}

#[tokio::test]
async fn semantic_duplicate_then_unique() {
    let near = "Which book do you reread the most?";
    let store = InMemoryHistoryStore::with_questions([OLD]);
    let embedder = MapEmbedder::new([
        (OLD, vec![1.0, 0.0]),
        (near, vec![0.95, 0.05]),
        (FRESH, vec![0.1, 1.0]),
    ]);
    let generator = ScriptedGenerator::new(vec![Some(near), Some(FRESH)]);
    let engine = UniquenessEngine::new(&store, &embedder, &similarity());
    let acquirer = QuestionAcquirer::new(&generator, engine, &store);

    let result = acquirer
        .acquire_unique_question(5, &CancellationToken::new())
        .await
        .unwrap();

    assert!(matches!(result, Acquisition::Accepted { attempts: 2, .. }));
    assert!(store.find_by_exact_text(near).await.unwrap().is_none());
}

#[tokio::test]
async fn blank_generations_are_failures() {
    let store = InMemoryHistoryStore::new();
    let embedder = MapEmbedder::empty();
    let generator = ScriptedGenerator::new(vec![Some("   "), Some("  Tea or coffee?  ")]);
    let engine = UniquenessEngine::new(&store, &embedder, &similarity());
    let acquirer = QuestionAcquirer::new(&generator, engine, &store);

    let result = acquirer
        .acquire_unique_question(3, &CancellationToken::new())
        .await
        .unwrap();

    match result {
        Acquisition::Accepted { record, attempts } => {
            assert_eq!(record.text(), "Tea or coffee?");
            assert_eq!(attempts, 2);
        }
        other => panic!("expected acceptance, got {:?}", other),
    }
}

#[tokio::test]
async fn store_write_failure_is_an_error() {
    let embedder = MapEmbedder::empty();
    let generator = ScriptedGenerator::new(vec![Some(FRESH)]);
    let engine = UniquenessEngine::new(&ReadOnlyStore, &embedder, &similarity());
    let acquirer = QuestionAcquirer::new(&generator, engine, &ReadOnlyStore);

    let err = acquirer
        .acquire_unique_question(3, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(format!("{:#}", err).contains("could not be recorded"));
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn cancelled_run_records_nothing() {
    let store = InMemoryHistoryStore::new();
    let embedder = MapEmbedder::empty();
    let generator = ScriptedGenerator::new(vec![Some(FRESH)]);
    let engine = UniquenessEngine::new(&store, &embedder, &similarity());
    let acquirer = QuestionAcquirer::new(&generator, engine, &store);

    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = acquirer.acquire_unique_question(5, &cancel).await.unwrap();

    assert_eq!(result, Acquisition::Cancelled { attempts: 0 });
    assert_eq!(generator.calls(), 0);
    assert!(store.is_empty());
}

#[tokio::test]
async fn cancellation_during_check_records_nothing() {
    let store = InMemoryHistoryStore::with_questions([OLD]);
    let cancel = CancellationToken::new();
    let embedder = CancellingEmbedder(cancel.clone());
    let generator = ScriptedGenerator::new(vec![Some(FRESH)]);
    let engine = UniquenessEngine::new(&store, &embedder, &similarity());
    let acquirer = QuestionAcquirer::new(&generator, engine, &store);

    let result = acquirer.acquire_unique_question(5, &cancel).await.unwrap();

    // The failed embedding leaves the candidate unique, but the token was
    // cancelled during the check, so it must not be recorded.
    assert_eq!(result, Acquisition::Cancelled { attempts: 1 });
    assert_eq!(generator.calls(), 1);
    assert_eq!(store.len(), 1);
    assert!(store.find_by_exact_text(FRESH).await.unwrap().is_none());
}
