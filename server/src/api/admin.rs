//! Admin endpoints: login, stats and code maintenance.
//!
//! Everything except `login` requires a bearer token from a prior
//! login. Sessions live in memory; restarting the server signs every
//! admin out.

use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use gatekeeper_ticketing::providers::CodeStore;
use gatekeeper_ticketing::ResetScope;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::extractors::AdminSession;
use crate::server::state::AppState;

/// Number of scan-log lines shown on the admin dashboard.
const RECENT_SCAN_LINES: usize = 20;

// ============================================================================
// Request / Response Types
// ============================================================================

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Admin password.
    pub password: String,
}

/// Login response with the session bearer token.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Bearer token for subsequent admin calls
    pub token: String,
    /// When the session expires
    pub expires_at: DateTime<Utc>,
}

/// Logout confirmation.
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    /// Success message
    pub message: String,
}

/// Code counters plus the recent scan feed.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    /// Total codes in the database
    pub total: i64,
    /// Codes still marked valid
    pub valid: i64,
    /// Codes already used
    pub used: i64,
    /// Codes not yet used
    pub unused: i64,
    /// Last scan-log lines, oldest first
    pub recent_scans: Vec<String>,
}

/// Query parameters for the reset endpoint.
#[derive(Debug, Deserialize)]
pub struct ResetParams {
    /// `expired` (default) clears only stale usage, `all` clears everything.
    pub mode: Option<String>,
}

/// Outcome of a reset operation.
#[derive(Debug, Serialize)]
pub struct ResetResponse {
    /// What happened
    pub message: String,
    /// Number of affected rows
    pub affected: u64,
}

/// Outcome of a delete operation.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    /// What happened
    pub message: String,
    /// Number of deleted rows
    pub deleted: u64,
}

// ============================================================================
// Handlers
// ============================================================================

/// Authenticate as admin.
///
/// # Endpoint
///
/// ```text
/// POST /api/admin/login
/// Content-Type: application/json
///
/// {"password": "..."}
/// ```
///
/// # Response
///
/// ```json
/// {"token": "...", "expires_at": "2025-03-01T19:02:44Z"}
/// ```
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let (token, expires_at) = state
        .sessions
        .login(&request.password)
        .await
        .ok_or_else(|| AppError::unauthorized("Invalid password"))?;

    tracing::info!("Admin login");
    Ok(Json(LoginResponse { token, expires_at }))
}

/// End the current admin session.
pub async fn logout(
    State(state): State<AppState>,
    session: AdminSession,
) -> Json<LogoutResponse> {
    state.sessions.revoke(&session.token).await;
    Json(LogoutResponse {
        message: "Logged out.".to_string(),
    })
}

/// Code counters and the recent scan feed for the dashboard.
///
/// # Endpoint
///
/// ```text
/// GET /api/admin/stats
/// Authorization: Bearer <token>
/// ```
///
/// # Response
///
/// ```json
/// {
///   "total": 250,
///   "valid": 250,
///   "used": 87,
///   "unused": 163,
///   "recent_scans": ["[2025-03-01 18:02:44] ABC123 - ok"]
/// }
/// ```
pub async fn stats(
    State(state): State<AppState>,
    _session: AdminSession,
) -> Result<Json<StatsResponse>, AppError> {
    let counters = state.store.stats().await?;
    let recent_scans = state.scan_log.tail(RECENT_SCAN_LINES).await?;

    Ok(Json(StatsResponse {
        total: counters.total,
        valid: counters.valid,
        used: counters.used,
        unused: counters.unused,
        recent_scans,
    }))
}

/// Clear usage marks so codes admit again.
///
/// `?mode=all` clears every code; any other mode (including the
/// default) clears only codes whose last use is older than the reuse
/// window, matching what the gate would no longer reject anyway.
///
/// # Endpoint
///
/// ```text
/// POST /api/admin/reset?mode=expired
/// Authorization: Bearer <token>
/// ```
pub async fn reset(
    State(state): State<AppState>,
    _session: AdminSession,
    Query(params): Query<ResetParams>,
) -> Result<Json<ResetResponse>, AppError> {
    let mode = params.mode.as_deref().unwrap_or("expired");

    let (scope, message) = if mode == "all" {
        (ResetScope::All, "All codes have been reset.".to_string())
    } else {
        let window = state.engine.reuse_window();
        (
            ResetScope::OlderThan(Utc::now() - window),
            format!(
                "Codes used more than {} hours ago have been reset.",
                window.num_hours()
            ),
        )
    };

    let affected = state.store.reset_used(scope).await?;
    tracing::info!(mode, affected, "Admin reset");

    Ok(Json(ResetResponse { message, affected }))
}

/// Delete all still-valid codes.
///
/// Used after an event to purge unredeemed tickets before minting a
/// fresh batch.
///
/// # Endpoint
///
/// ```text
/// POST /api/admin/delete-valid
/// Authorization: Bearer <token>
/// ```
pub async fn delete_valid(
    State(state): State<AppState>,
    _session: AdminSession,
) -> Result<Json<DeleteResponse>, AppError> {
    let deleted = state.store.delete_valid().await?;
    tracing::info!(deleted, "Admin delete-valid");

    Ok(Json(DeleteResponse {
        message: format!("Deleted {deleted} valid tickets from the database."),
        deleted,
    }))
}
