//! Bridge routes.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::{get, post},
};
use serde::Serialize;
use tracing::debug;

use super::error::{BridgeError, BridgeResult};
use super::server::BridgeState;
use crate::coordinator::{Request, Response};

/// `GET /health` body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Create the bridge router.
pub fn create_router(state: BridgeState) -> Router {
    Router::new()
        .route("/message", post(post_message))
        .route("/health", get(health_check))
        .with_state(state)
}

/// Forward one message to the coordinator and return its reply verbatim.
async fn post_message(
    State(state): State<BridgeState>,
    payload: Result<Json<Request>, JsonRejection>,
) -> BridgeResult<Json<Response>> {
    let Json(request) = payload.map_err(|rejection| {
        debug!(error = %rejection.body_text(), "Rejected bridge message");
        BridgeError::bad_request(rejection.body_text())
    })?;

    debug!(kind = request.kind(), "Bridge message");
    let response = state.coordinator.request(request).await?;
    Ok(Json(response))
}

async fn health_check(State(state): State<BridgeState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}
