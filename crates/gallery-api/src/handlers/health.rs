//! Health check handlers
//!
//! Endpoints for liveness and readiness probes.

use axum::{extract::State, http::StatusCode, Json};
use gallery_service::dto::{HealthResponse, ReadinessResponse};

use crate::state::AppState;

/// Basic health check (liveness probe)
///
/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Readiness check with like store health
///
/// GET /health/ready
pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let likes = state.service_context().likes();
    let store_healthy = match likes.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, backend = likes.backend(), "Like store ping failed");
            false
        }
    };

    let response = ReadinessResponse::ready(store_healthy, likes.backend(), state.hub().receiver_count());
    let status = if store_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}
