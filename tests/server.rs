//! The health / trigger HTTP server, driven over a real socket.

mod common;

use common::{MapEmbedder, ScriptedGenerator, SlowGenerator, SlowPoster};
use daily_question::chat::StdoutPoster;
use daily_question::config::Config;
use daily_question::cycle::Bot;
use daily_question::server::router;
use daily_question::store::{HistoryStore, InMemoryHistoryStore};
use serde_json::Value;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const FRESH: &str = "What's a place that feels like home to you?";

async fn spawn(bot: Bot) -> String {
    let app = router(Arc::new(bot), CancellationToken::new());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn bot(store: Arc<InMemoryHistoryStore>, script: Vec<Option<&str>>) -> Bot {
    Bot::new(
        Config::minimal("unused.sqlite"),
        store,
        Box::new(MapEmbedder::empty()),
        Box::new(ScriptedGenerator::new(script)),
        Box::new(StdoutPoster),
    )
}

#[tokio::test]
async fn health_reports_ok() {
    let base = spawn(bot(Arc::new(InMemoryHistoryStore::new()), vec![])).await;

    let json: Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn ask_posts_and_records() {
    let store = Arc::new(InMemoryHistoryStore::new());
    let base = spawn(bot(store.clone(), vec![None, Some(FRESH)])).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/ask", base))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let json: Value = resp.json().await.unwrap();

    assert_eq!(json["outcome"], "posted");
    assert_eq!(json["question"], FRESH);
    assert_eq!(json["attempts"], 2);
    assert!(store.find_by_exact_text(FRESH).await.unwrap().is_some());
}

#[tokio::test]
async fn ask_skips_when_exhausted() {
    let store = Arc::new(InMemoryHistoryStore::new());
    let base = spawn(bot(store.clone(), vec![None, None, None])).await;

    let json: Value = reqwest::Client::new()
        .post(format!("{}/ask", base))
        .json(&serde_json::json!({ "max_attempts": 2 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(json["outcome"], "skipped");
    assert_eq!(json["attempts"], 2);
    assert!(store.is_empty());
}

#[tokio::test]
async fn ask_rejects_zero_attempts() {
    let base = spawn(bot(Arc::new(InMemoryHistoryStore::new()), vec![])).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/ask", base))
        .json(&serde_json::json!({ "max_attempts": 0 }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 400);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["error"]["code"], "bad_request");
}

#[tokio::test]
async fn ask_finishes_cycle_after_client_disconnects() {
    let store = Arc::new(InMemoryHistoryStore::new());
    let (poster, posted) = SlowPoster::new(Duration::from_millis(500));
    let base = spawn(Bot::new(
        Config::minimal("unused.sqlite"),
        store.clone(),
        Box::new(MapEmbedder::empty()),
        Box::new(ScriptedGenerator::new(vec![Some(FRESH)])),
        Box::new(poster),
    ))
    .await;

    // The client gives up while the question is being posted.
    let result = reqwest::Client::new()
        .post(format!("{}/ask", base))
        .timeout(Duration::from_millis(100))
        .send()
        .await;
    assert!(result.is_err());

    tokio::time::sleep(Duration::from_millis(1500)).await;

    assert_eq!(store.len(), 1);
    assert!(
        posted.load(Ordering::SeqCst),
        "recorded question was never posted"
    );
}

#[tokio::test]
async fn overlapping_ask_is_busy() {
    let store = Arc::new(InMemoryHistoryStore::new());
    let base = spawn(Bot::new(
        Config::minimal("unused.sqlite"),
        store.clone(),
        Box::new(MapEmbedder::empty()),
        Box::new(SlowGenerator {
            text: FRESH,
            delay: Duration::from_millis(500),
        }),
        Box::new(StdoutPoster),
    ))
    .await;

    let client = reqwest::Client::new();
    let url = format!("{}/ask", base);
    let first = client.post(&url).send();
    let second = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        client.post(&url).send().await
    };
    let (first, second) = tokio::join!(first, second);
    let first = first.unwrap();
    let second = second.unwrap();

    assert!(first.status().is_success());
    assert_eq!(second.status().as_u16(), 409);
    let json: Value = second.json().await.unwrap();
    assert_eq!(json["error"]["code"], "busy");

    let json: Value = first.json().await.unwrap();
    assert_eq!(json["outcome"], "posted");
    assert_eq!(store.len(), 1);
}
