//! Health and manual-trigger HTTP server.
//!
//! There is no built-in scheduler. A deployment's cron (or any HTTP client)
//! triggers a posting cycle with `POST /ask`, and platform health checks
//! hit `GET /health`.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Plain-text banner |
//! | `GET`  | `/health` | Health check (returns version) |
//! | `POST` | `/ask` | Run one posting cycle |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "busy", "message": "a posting cycle is already running" } }
//! ```
//!
//! Error codes: `bad_request` (400), `busy` (409), `cycle_error` (500).
//!
//! Only one cycle runs at a time per process; overlapping triggers get 409
//! instead of queueing. A cycle runs to completion even if the client that
//! triggered it disconnects.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::cycle::{Bot, CycleOutcome};

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    bot: Arc<Bot>,
    /// Held for the duration of a cycle.
    cycle_lock: Arc<Mutex<()>>,
    /// Cancelled on shutdown so an in-flight cycle stops before recording.
    shutdown: CancellationToken,
}

/// Starts the HTTP server on `[server].bind`.
///
/// Runs until Ctrl-C, then cancels any in-flight cycle and shuts down
/// gracefully.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    if !config.generation.is_enabled() {
        anyhow::bail!("Generation provider is disabled. Set [generation] provider in config.");
    }

    let bot = Bot::from_config(config).await?;
    let shutdown = CancellationToken::new();

    let app = router(Arc::new(bot), shutdown.clone());

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!("listening on http://{}", config.server.bind);
    println!("Daily question server listening on http://{}", config.server.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
            shutdown.cancel();
        })
        .await?;

    Ok(())
}

/// Build the router. Exposed separately so tests can drive it directly.
pub fn router(bot: Arc<Bot>, shutdown: CancellationToken) -> Router {
    let state = AppState {
        bot,
        cycle_lock: Arc::new(Mutex::new(())),
        shutdown,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route("/ask", post(handle_ask))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn busy() -> AppError {
    AppError {
        status: StatusCode::CONFLICT,
        code: "busy".to_string(),
        message: "a posting cycle is already running".to_string(),
    }
}

fn cycle_error(err: anyhow::Error) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "cycle_error".to_string(),
        message: format!("{:#}", err),
    }
}

// ============ GET / and GET /health ============

async fn handle_root() -> &'static str {
    "Daily Question Bot is running!"
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /ask ============

#[derive(Deserialize, Default)]
struct AskRequest {
    /// Overrides `generation.max_attempts` for this cycle.
    #[serde(default)]
    max_attempts: Option<u32>,
}

#[derive(Serialize)]
struct AskResponse {
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attempts: Option<u32>,
}

/// Handler for `POST /ask`. The JSON body is optional.
async fn handle_ask(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AskResponse>, AppError> {
    let request: AskRequest = if body.iter().all(u8::is_ascii_whitespace) {
        AskRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| bad_request(format!("invalid body: {}", e)))?
    };
    if request.max_attempts == Some(0) {
        return Err(bad_request("max_attempts must be >= 1"));
    }

    let guard = state.cycle_lock.clone().try_lock_owned().map_err(|_| busy())?;

    // The cycle runs in its own task so a client that disconnects mid-cycle
    // cannot drop it between recording and posting. Only shutdown cancels it.
    let bot = state.bot.clone();
    let shutdown = state.shutdown.clone();
    let cycle = tokio::spawn(async move {
        let _guard = guard;
        let result = bot.run_cycle(request.max_attempts, &shutdown).await;
        if let Err(e) = &result {
            tracing::error!("posting cycle failed: {e:#}");
        }
        result
    });

    let outcome = cycle
        .await
        .map_err(|e| cycle_error(anyhow::anyhow!("posting cycle panicked: {}", e)))?
        .map_err(cycle_error)?;

    let response = match outcome {
        CycleOutcome::Posted { record, attempts } => AskResponse {
            outcome: "posted",
            id: Some(record.id()),
            question: Some(record.text().to_string()),
            attempts: Some(attempts),
        },
        CycleOutcome::Skipped { attempts } => AskResponse {
            outcome: "skipped",
            id: None,
            question: None,
            attempts: Some(attempts),
        },
        CycleOutcome::Cancelled => AskResponse {
            outcome: "cancelled",
            id: None,
            question: None,
            attempts: None,
        },
    };

    Ok(Json(response))
}
