//! Integration tests for the points API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. This validates handler logic, routing and the
//! error-to-status mapping without a live network connection.

#![allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use rewards_api::router::build_router;
use rewards_api::server::ServerConfig;
use rewards_api::startup::spawn_api;
use rewards_api::state::AppState;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

/// Send one request through a fresh router over `state`.
async fn send(state: &Arc<AppState>, request: Request<Body>) -> (StatusCode, Value) {
    let response = build_router(Arc::clone(state))
        .oneshot(request)
        .await
        .unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

async fn record(state: &Arc<AppState>, payer: &str, points: i64, timestamp: &str) {
    let (status, _) = send(
        state,
        post_json(
            "/transactions",
            &json!({ "payer": payer, "points": points, "timestamp": timestamp }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

/// The classic five-entry history.
async fn make_test_state() -> Arc<AppState> {
    let state = Arc::new(AppState::new());
    record(&state, "DANNON", 1000, "2020-11-02T14:00:00Z").await;
    record(&state, "UNILEVER", 200, "2020-10-31T11:00:00Z").await;
    record(&state, "DANNON", -200, "2020-10-31T15:00:00Z").await;
    record(&state, "MILLER COORS", 10000, "2020-11-01T14:00:00Z").await;
    record(&state, "DANNON", 300, "2020-10-31T10:00:00Z").await;
    state
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_health() {
    let state = Arc::new(AppState::new());
    let (status, json) = send(&state, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_record_returns_payer_entries() {
    let state = Arc::new(AppState::new());
    record(&state, "DANNON", 300, "2020-10-31T10:00:00Z").await;

    let (status, json) = send(
        &state,
        post_json(
            "/transactions",
            &json!({ "payer": "DANNON", "points": 200, "timestamp": "2020-10-31T11:00:00Z" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["points"], 300);
    assert_eq!(entries[1]["points"], 200);
    assert_eq!(entries[1]["payer"], "DANNON");
    assert_eq!(entries[1]["sequence"], 1);
}

#[tokio::test]
async fn test_record_accepts_zoneless_timestamp() {
    let state = Arc::new(AppState::new());
    let (status, json) = send(
        &state,
        post_json(
            "/transactions",
            &json!({ "payer": "DANNON", "points": 300, "timestamp": "2020-11-02T14:00:00" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json[0]["timestamp"], "2020-11-02T14:00:00Z");
}

#[tokio::test]
async fn test_record_missing_field_is_bad_request() {
    let state = Arc::new(AppState::new());
    let (status, json) = send(
        &state,
        post_json(
            "/transactions",
            &json!({ "payer": "DANNON", "timestamp": "2020-10-31T10:00:00Z" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);
    assert_eq!(json["error"], "missing required field: points");
}

#[tokio::test]
async fn test_record_malformed_json_is_bad_request() {
    let state = Arc::new(AppState::new());
    let request = Request::post("/transactions")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, json) = send(&state, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().starts_with("invalid request body"));
}

#[tokio::test]
async fn test_clawback_below_zero_is_bad_request() {
    let state = Arc::new(AppState::new());
    record(&state, "DANNON", 100, "2020-10-31T10:00:00Z").await;

    let (status, _) = send(
        &state,
        post_json(
            "/transactions",
            &json!({ "payer": "DANNON", "points": -150, "timestamp": "2020-10-31T11:00:00Z" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, balances) = send(&state, get("/balances")).await;
    assert_eq!(balances, json!({ "DANNON": 100 }));
}

#[tokio::test]
async fn test_spend_points() {
    let state = make_test_state().await;
    let (status, json) = send(&state, post_json("/points", &json!({ "points": 5000 }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!([
            { "payer": "DANNON", "points": -100 },
            { "payer": "UNILEVER", "points": -200 },
            { "payer": "MILLER COORS", "points": -4700 },
        ])
    );

    let (status, balances) = send(&state, get("/balances")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        balances,
        json!({ "DANNON": 1000, "UNILEVER": 0, "MILLER COORS": 5300 })
    );
}

#[tokio::test]
async fn test_spend_insufficient_funds() {
    let state = make_test_state().await;
    let (status, json) = send(&state, post_json("/points", &json!({ "points": 20000 }))).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["status"], 422);

    // Nothing was charged.
    let (_, balances) = send(&state, get("/balances")).await;
    assert_eq!(
        balances,
        json!({ "DANNON": 1100, "UNILEVER": 200, "MILLER COORS": 10000 })
    );
}

#[tokio::test]
async fn test_spend_negative_is_bad_request() {
    let state = make_test_state().await;
    let (status, _) = send(&state, post_json("/points", &json!({ "points": -5 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_spend_zero_returns_empty_list() {
    let state = make_test_state().await;
    let (status, json) = send(&state, post_json("/points", &json!({ "points": 0 }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!([]));
}

#[tokio::test]
async fn test_list_transactions_oldest_first() {
    let state = make_test_state().await;
    let (status, json) = send(&state, get("/transactions")).await;

    assert_eq!(status, StatusCode::OK);
    let order: Vec<(&str, i64)> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|e| (e["payer"].as_str().unwrap(), e["points"].as_i64().unwrap()))
        .collect();
    assert_eq!(
        order,
        vec![
            ("DANNON", 300),
            ("UNILEVER", 200),
            ("DANNON", -200),
            ("MILLER COORS", 10000),
            ("DANNON", 1000),
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_spends_never_overdraw() {
    let state = Arc::new(AppState::new());
    record(&state, "DANNON", 600, "2020-10-31T10:00:00Z").await;
    record(&state, "UNILEVER", 400, "2020-10-31T11:00:00Z").await;

    let spends: Vec<_> = (0..8)
        .map(|_| {
            let state = Arc::clone(&state);
            tokio::spawn(async move {
                send(&state, post_json("/points", &json!({ "points": 150 }))).await
            })
        })
        .collect();

    let mut charged = 0;
    for spend in spends {
        let (status, json) = spend.await.unwrap();
        if status == StatusCode::OK {
            charged += json
                .as_array()
                .unwrap()
                .iter()
                .map(|d| -d["points"].as_i64().unwrap())
                .sum::<i64>();
        } else {
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        }
    }

    // 1000 recorded; six spends of 150 fit, the rest are refused whole.
    assert_eq!(charged, 900);
    let ledger = state.ledger.lock().await;
    assert_eq!(ledger.total_points(), Ok(100));
    assert!(ledger.verify().is_consistent());
}

#[tokio::test]
async fn test_empty_ledger_has_no_balances() {
    let state = Arc::new(AppState::new());
    let (status, json) = send(&state, get("/balances")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({}));
}

#[tokio::test]
async fn test_nonexistent_route_returns_404() {
    let router = build_router(Arc::new(AppState::new()));
    let response = router.oneshot(get("/nonexistent")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_spawn_api_rejects_bad_host() {
    let config = ServerConfig {
        host: String::from("not an address"),
        port: 0,
    };
    assert!(spawn_api(config, Arc::new(AppState::new())).is_err());
}

#[tokio::test]
async fn test_spawn_api_on_ephemeral_port() {
    let config = ServerConfig {
        host: String::from("127.0.0.1"),
        port: 0,
    };
    let handle = spawn_api(config, Arc::new(AppState::new())).unwrap();
    handle.abort();
    assert!(handle.await.unwrap_err().is_cancelled());
}
