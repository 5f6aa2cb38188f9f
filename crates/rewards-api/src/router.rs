//! Axum router construction for the points API.
//!
//! Assembles all routes into a single [`Router`] with permissive CORS and
//! HTTP request tracing.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router for the points API.
///
/// The router includes:
/// - `POST /transactions` -- record an entry
/// - `GET /transactions` -- every held entry, oldest first
/// - `POST /points` -- spend points
/// - `GET /balances` -- balance per payer
/// - `GET /health` -- liveness probe
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/transactions",
            post(handlers::record_transaction).get(handlers::list_transactions),
        )
        .route("/points", post(handlers::spend_points))
        .route("/balances", get(handlers::get_balances))
        .route("/health", get(handlers::health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
