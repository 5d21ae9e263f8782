//! Route table for the gate service.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::health::{health_check, readiness_check};
use super::state::AppState;
use crate::api::{admin, scan, tickets};

/// Assemble the full router: probes and `/scan` at the root, lookup
/// and admin endpoints under `/api`.
///
/// CORS is fully open: the scan endpoint is loaded straight from phone
/// cameras and the admin dashboard is served from a separate origin.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/tickets/:code", get(tickets::get_ticket))
        .route("/admin/login", post(admin::login))
        .route("/admin/logout", post(admin::logout))
        .route("/admin/stats", get(admin::stats))
        .route("/admin/reset", post(admin::reset))
        .route("/admin/delete-valid", post(admin::delete_valid));

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        // QR codes resolve here; must stay unauthenticated
        .route("/scan", get(scan::scan))
        .nest("/api", api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
