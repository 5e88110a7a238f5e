//! # REST + WebSocket API
//!
//! Builds the axum router that serves the demo page and exposes the
//! session over HTTP. All endpoints share application state through axum's
//! `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path                  | Description                            |
//! |--------|-----------------------|----------------------------------------|
//! | GET    | `/`                   | The demo page                          |
//! | GET    | `/health`             | Liveness probe                         |
//! | GET    | `/session`            | Current session snapshot               |
//! | POST   | `/register`           | Run one registration                   |
//! | POST   | `/explain`            | Explain the last registration          |
//! | GET    | `/ws`                 | Live snapshot stream                   |
//! | POST   | `/behavior/classify`  | Score one access attempt               |
//!
//! `/register` and `/explain` answer with the snapshot after the action.
//! A refused action (trigger disabled, nothing registered yet) is a
//! `409 Conflict`; a failed registration or explanation is still a `200`,
//! because the failure is part of what the page displays.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{Method, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use qrdid_protocol::behavior::{Assessment, BehaviorModel, Sample};
use qrdid_protocol::explain::ExplanationStatus;
use qrdid_protocol::{Session, SessionError, SessionSnapshot};

use crate::metrics::SharedMetrics;

/// The single-page front end.
const INDEX_HTML: &str = include_str!("../assets/index.html");

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone, everything behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    /// The one demo session this node drives.
    pub session: Arc<Session>,
    /// Reference to Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
    /// Typing-rhythm model, trained at startup.
    pub behavior: Arc<BehaviorModel>,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/session", get(session_handler))
        .route("/register", post(register_handler))
        .route("/explain", post(explain_handler))
        .route("/ws", get(ws_handler))
        .route("/behavior/classify", post(classify_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

/// Response payload for `POST /register` and `POST /explain`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ActionResponse {
    /// Why the action was refused or failed, if it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Session state after the action.
    pub session: SessionSnapshot,
}

/// Response payload for `GET /health`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Generic error payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = ErrorResponse {
        error: message.into(),
        code: status.as_u16(),
    };
    (status, Json(body)).into_response()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /` — the demo page.
async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// `GET /health` — returns 200 if the node is alive.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".into(),
        version: state.version.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// `GET /session` — the current snapshot.
async fn session_handler(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.session.snapshot())
}

/// `POST /register` — runs one registration to completion.
///
/// Holds the request open for the confirmation delay. Live progress is on
/// `/ws`.
async fn register_handler(State(state): State<AppState>) -> Response {
    let timer = state.metrics.registration_latency_seconds.start_timer();
    let result = state.session.register().await;

    let (status, error) = match result {
        Ok(record) => {
            timer.observe_duration();
            state.metrics.registrations_total.inc();
            tracing::debug!(did = %record.did, "register request served");
            (StatusCode::OK, None)
        }
        Err(e @ SessionError::Registration(_)) => {
            timer.observe_duration();
            state.metrics.registration_failures_total.inc();
            (StatusCode::OK, Some(e.to_string()))
        }
        Err(e) => {
            timer.stop_and_discard();
            state.metrics.guard_rejections_total.inc();
            tracing::debug!(error = %e, "register request refused");
            (StatusCode::CONFLICT, Some(e.to_string()))
        }
    };

    let body = ActionResponse {
        error,
        session: state.session.snapshot(),
    };
    (status, Json(body)).into_response()
}

/// `POST /explain` — asks the model to explain the last registration.
async fn explain_handler(State(state): State<AppState>) -> Response {
    let timer = state.metrics.explanation_latency_seconds.start_timer();

    let (status, error) = match state.session.explain().await {
        Ok(view) => {
            timer.observe_duration();
            match view.status {
                Some(ExplanationStatus::Generated) => state.metrics.explanations_total.inc(),
                _ => state.metrics.explanation_failures_total.inc(),
            }
            (StatusCode::OK, None)
        }
        Err(e) => {
            timer.stop_and_discard();
            state.metrics.guard_rejections_total.inc();
            tracing::debug!(error = %e, "explain request refused");
            (StatusCode::CONFLICT, Some(e.to_string()))
        }
    };

    let body = ActionResponse {
        error,
        session: state.session.snapshot(),
    };
    (status, Json(body)).into_response()
}

/// `POST /behavior/classify` — scores one access attempt.
async fn classify_handler(State(state): State<AppState>, Json(sample): Json<Sample>) -> Response {
    let valid = |x: f64| x.is_finite() && x >= 0.0;
    if !valid(sample.typing_speed) || !valid(sample.latency_variation) {
        return error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "typing_speed and latency_variation must be finite and non-negative",
        );
    }

    let assessment: Assessment = state.behavior.classify(sample);
    tracing::info!(
        typing_speed = sample.typing_speed,
        latency_variation = sample.latency_variation,
        verdict = %assessment.verdict,
        probability = assessment.anomaly_probability,
        "access attempt classified"
    );
    Json(assessment).into_response()
}

// ---------------------------------------------------------------------------
// WebSocket
// ---------------------------------------------------------------------------

/// `GET /ws` — upgrades to a WebSocket that pushes session snapshots.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

/// Sends the current snapshot, then every published change.
async fn handle_ws_connection(mut socket: WebSocket, state: AppState) {
    // Subscribe before reading the snapshot so no change falls in between.
    let mut rx = state.session.subscribe();
    if send_snapshot(&mut socket, &state.session.snapshot()).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Ok(snapshot) => {
                        if send_snapshot(&mut socket, &snapshot).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        // Later snapshots are complete states, so skipping is fine.
                        tracing::warn!("ws subscriber lagged by {} snapshots", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(_)) => {
                        // Push-only channel.
                    }
                    _ => break,
                }
            }
        }
    }
}

/// `Err` means the client is gone.
async fn send_snapshot(socket: &mut WebSocket, snapshot: &SessionSnapshot) -> Result<(), ()> {
    let payload = match serde_json::to_string(snapshot) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("failed to serialize ws snapshot: {}", e);
            return Ok(());
        }
    };
    socket.send(Message::Text(payload)).await.map_err(|_| ())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
