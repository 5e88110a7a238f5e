//! End-to-end tests for the QR-DID flow.
//!
//! These run the real `GeminiClient` over HTTP against a local axum stub
//! standing in for the Generative Language API, so the URL shape, the
//! query-string key, the JSON body, and the response handling are all
//! exercised together with the session state machine.
//!
//! Each test gets its own stub server on an ephemeral port.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};

use qrdid_protocol::config::{
    GeminiConfig, KEY_PREVIEW_CHARS, MSG_EXPLAIN_TRANSPORT_ERROR, MSG_EXPLAIN_UNAVAILABLE,
    MSG_REGISTER_FIRST, PLACEHOLDER_PUBLIC_KEY,
};
use qrdid_protocol::explain::{ExplanationStatus, GeminiClient};
use qrdid_protocol::identity::{key_preview, ScriptedSource};
use qrdid_protocol::ledger::SimulatedLedger;
use qrdid_protocol::{Session, SessionError};

// ---------------------------------------------------------------------------
// Stub Endpoint
// ---------------------------------------------------------------------------

/// One request as seen by the stub.
#[derive(Debug, Clone)]
struct Captured {
    call: String,
    key: Option<String>,
    body: Value,
}

#[derive(Clone)]
struct Stub {
    reply: Reply,
    seen: Arc<Mutex<Vec<Captured>>>,
}

#[derive(Clone)]
enum Reply {
    Json(Value),
    NotJson,
}

async fn generate_handler(
    State(stub): State<Stub>,
    Path(call): Path<String>,
    Query(query): Query<std::collections::HashMap<String, String>>,
    Json(body): Json<Value>,
) -> axum::response::Response {
    stub.seen.lock().push(Captured {
        call,
        key: query.get("key").cloned(),
        body,
    });
    match stub.reply {
        Reply::Json(v) => Json(v).into_response(),
        Reply::NotJson => (StatusCode::BAD_GATEWAY, "upstream exploded").into_response(),
    }
}

/// Starts the stub and returns its base URL plus the request log.
async fn spawn_stub(reply: Reply) -> (String, Arc<Mutex<Vec<Captured>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/v1beta/models/:call", post(generate_handler))
        .with_state(Stub {
            reply,
            seen: Arc::clone(&seen),
        });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub");
    let addr = listener.local_addr().expect("stub addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server");
    });
    (format!("http://{}/v1beta", addr), seen)
}

fn text_reply(text: &str) -> Reply {
    Reply::Json(json!({
        "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
    }))
}

fn session_against(endpoint: String) -> Session {
    let client = GeminiClient::new(GeminiConfig {
        endpoint,
        model: "demo-model".into(),
        api_key: "test-key".into(),
    });
    Session::builder()
        .ledger(Arc::new(SimulatedLedger::new(Duration::ZERO)))
        .generator(Arc::new(client))
        .build()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn register_then_explain_over_http() {
    let (endpoint, seen) = spawn_stub(text_reply("Your DID\nexplained")).await;
    let session = session_against(endpoint);

    let record = session.register().await.expect("registration");
    let view = session.explain().await.expect("explanation");

    assert_eq!(view.status, Some(ExplanationStatus::Generated));
    assert_eq!(view.html, "Your DID<br>explained");

    let seen = seen.lock();
    assert_eq!(seen.len(), 1);
    let req = &seen[0];
    assert_eq!(req.call, "demo-model:generateContent");
    assert_eq!(req.key.as_deref(), Some("test-key"));
    assert_eq!(req.body["contents"][0]["role"], "user");
    let prompt = req.body["contents"][0]["parts"][0]["text"]
        .as_str()
        .expect("prompt text");
    assert!(prompt.contains(&record.did));
    assert!(prompt.contains(&record.transaction_hash));
    assert!(!prompt.contains("-----END PUBLIC KEY-----"));
}

#[tokio::test]
async fn empty_candidates_render_fallback() {
    let (endpoint, _seen) = spawn_stub(Reply::Json(json!({ "candidates": [] }))).await;
    let session = session_against(endpoint);
    session.register().await.expect("registration");

    let view = session.explain().await.expect("explanation");

    assert_eq!(view.status, Some(ExplanationStatus::Unavailable));
    assert_eq!(view.html, MSG_EXPLAIN_UNAVAILABLE);
    assert!(session.snapshot().explain_enabled);
}

#[tokio::test]
async fn api_error_object_renders_fallback() {
    let (endpoint, _seen) = spawn_stub(Reply::Json(json!({
        "error": { "code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT" }
    })))
    .await;
    let session = session_against(endpoint);
    session.register().await.expect("registration");

    let view = session.explain().await.expect("explanation");

    assert_eq!(view.html, MSG_EXPLAIN_UNAVAILABLE);
}

#[tokio::test]
async fn non_json_body_is_a_transport_failure() {
    let (endpoint, _seen) = spawn_stub(Reply::NotJson).await;
    let session = session_against(endpoint);
    session.register().await.expect("registration");

    let view = session.explain().await.expect("explanation");

    assert_eq!(view.status, Some(ExplanationStatus::Failed));
    assert_eq!(view.html, MSG_EXPLAIN_TRANSPORT_ERROR);
    assert!(session.snapshot().explain_enabled);
}

#[tokio::test]
async fn explain_before_register_makes_no_request() {
    let (endpoint, seen) = spawn_stub(text_reply("Hello")).await;
    let session = session_against(endpoint);

    let err = session.explain().await.unwrap_err();

    assert!(matches!(err, SessionError::NoTransaction));
    assert_eq!(session.snapshot().notice.as_deref(), Some(MSG_REGISTER_FIRST));
    assert!(seen.lock().is_empty());
}

#[tokio::test]
async fn explanation_follows_latest_registration() {
    let (endpoint, seen) = spawn_stub(text_reply("Hello")).await;
    let session = session_against(endpoint);

    let first = session.register().await.expect("first registration");
    let second = session.register().await.expect("second registration");
    session.explain().await.expect("explanation");

    let prompt = seen.lock()[0].body["contents"][0]["parts"][0]["text"]
        .as_str()
        .expect("prompt text")
        .to_string();
    assert!(prompt.contains(&second.did));
    assert!(prompt.contains(&second.transaction_hash));
    assert!(!prompt.contains(&first.transaction_hash));
}

#[tokio::test]
async fn scripted_sources_make_the_flow_deterministic() {
    let (endpoint, _seen) = spawn_stub(text_reply("Hello")).await;
    let client = GeminiClient::new(GeminiConfig {
        endpoint,
        ..GeminiConfig::default()
    });
    let ledger =
        SimulatedLedger::with_source(Duration::ZERO, Box::new(ScriptedSource::constant(0x0f)));
    let session = Session::builder()
        .identity_source(Box::new(ScriptedSource::new(vec![3, 1, 4, 1, 5, 9, 2, 6, 5, 3])))
        .ledger(Arc::new(ledger))
        .generator(Arc::new(client))
        .build();

    let record = session.register().await.expect("registration");

    assert_eq!(record.did, "did:example:3141592653");
    assert_eq!(record.transaction_hash, format!("0x{}", "0f".repeat(32)));
    assert_eq!(
        session.snapshot().status.details,
        format!(
            "Transaction Hash: 0x{}\nDID: did:example:3141592653\nPublic Key: {}",
            "0f".repeat(32),
            key_preview(PLACEHOLDER_PUBLIC_KEY, KEY_PREVIEW_CHARS)
        )
    );
}
