//! Liveness and readiness probes.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use super::state::AppState;

/// Body of the liveness probe.
#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

/// Liveness probe: answers as long as the process is up.
///
/// Does not touch the database; `/ready` covers that.
///
/// ```bash
/// curl http://localhost:5000/health
/// # {"status":"healthy"}
/// ```
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

/// Body of the readiness probe.
#[derive(Serialize)]
pub struct ReadinessResponse {
    ready: bool,
    database: bool,
}

/// Readiness probe: 200 once the code database answers a ping,
/// 503 until then.
pub async fn readiness_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<ReadinessResponse>) {
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ReadinessResponse {
                ready: true,
                database: true,
            }),
        ),
        Err(err) => {
            tracing::warn!(error = %err, "Readiness probe could not reach the database");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessResponse {
                    ready: false,
                    database: false,
                }),
            )
        }
    }
}
