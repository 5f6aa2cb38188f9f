//! REST endpoint handlers for the points API.
//!
//! All handlers go through the shared [`AppState`] ledger lock.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/transactions` | Record an entry, returns the payer's entries |
//! | `GET` | `/transactions` | Every held entry, oldest first |
//! | `POST` | `/points` | Spend points, returns per-payer deductions |
//! | `GET` | `/balances` | Balance per payer |
//! | `GET` | `/health` | Liveness probe |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use rewards_types::{RecordRequest, SpendRequest};
use tracing::warn;

use crate::error::ApiError;
use crate::state::AppState;

/// Unwrap a JSON body, logging and converting a rejection.
fn body<T>(payload: Result<Json<T>, JsonRejection>, endpoint: &'static str) -> Result<T, ApiError> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            warn!(endpoint, reason = %rejection.body_text(), "Malformed request body");
            Err(ApiError::from(rejection))
        }
    }
}

// ---------------------------------------------------------------------------
// POST /transactions
// ---------------------------------------------------------------------------

/// Record one payer entry.
///
/// Responds `201 Created` with the payer's entries after the append.
pub async fn record_transaction(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RecordRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = body(payload, "/transactions")?;

    let entries = state.ledger.lock().await.record(request).map_err(|e| {
        warn!(error = %e, "Transaction rejected");
        ApiError::from(e)
    })?;

    Ok((StatusCode::CREATED, Json(entries)))
}

// ---------------------------------------------------------------------------
// GET /transactions
// ---------------------------------------------------------------------------

/// List every held entry by timestamp, then arrival.
pub async fn list_transactions(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let entries = state.ledger.lock().await.all_entries();
    Json(entries)
}

// ---------------------------------------------------------------------------
// POST /points
// ---------------------------------------------------------------------------

/// Spend points oldest first across all payers.
///
/// Responds with one `{payer, points}` pair per payer charged, in the
/// order the payers were first drawn from.
pub async fn spend_points(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SpendRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let SpendRequest { points } = body(payload, "/points")?;

    let result = state.ledger.lock().await.spend(points).map_err(|e| {
        warn!(points, error = %e, "Spend rejected");
        ApiError::from(e)
    })?;

    Ok(Json(result))
}

// ---------------------------------------------------------------------------
// GET /balances
// ---------------------------------------------------------------------------

/// Current balance of every known payer.
pub async fn get_balances(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let balances = state.ledger.lock().await.balances();
    Json(balances)
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

/// Liveness probe.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
