//! Gate scan endpoint.
//!
//! The endpoint QR codes resolve to. Gate hardware and phone browsers
//! both consume it, so it always answers 200 with a JSON verdict; the
//! `status` field carries the outcome.

use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use gatekeeper_ticketing::{ScanStatus, Verification};
use serde::{Deserialize, Serialize};

use crate::extractors::ClientIp;
use crate::server::state::AppState;

/// Placeholder token recorded when a scan arrives without one.
const EMPTY_TOKEN: &str = "(empty)";

/// Query parameters for the scan endpoint.
///
/// `token` is the canonical parameter; `id` is accepted as a legacy
/// alias from older QR batches. A present-but-empty `token` falls
/// through to `id`.
#[derive(Debug, Deserialize)]
pub struct ScanParams {
    /// Ticket token to verify.
    pub token: Option<String>,
    /// Legacy alias for `token`.
    pub id: Option<String>,
}

impl ScanParams {
    fn into_token(self) -> Option<String> {
        self.token
            .filter(|t| !t.is_empty())
            .or_else(|| self.id.filter(|t| !t.is_empty()))
    }
}

/// Scan verdict returned to the gate.
#[derive(Debug, Serialize)]
pub struct ScanResponse {
    /// Outcome: `ok`, `used`, `invalid` or `error`
    pub status: ScanStatus,
    /// Human-readable message shown at the gate
    pub message: String,
    /// The token that was checked
    pub code: String,
    /// Scan wall-clock time, `YYYY-MM-DD HH:MM:SS`
    pub timestamp: String,
}

impl ScanResponse {
    fn new(status: ScanStatus, message: String, code: String, at: DateTime<Utc>) -> Self {
        Self {
            status,
            message,
            code,
            timestamp: at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// Verify a scanned ticket token.
///
/// # Endpoint
///
/// ```text
/// GET /scan?token=ABC123
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "ok",
///   "message": "Ticket valid. Welcome!",
///   "code": "ABC123",
///   "timestamp": "2025-03-01 18:02:44"
/// }
/// ```
pub async fn scan(
    State(state): State<AppState>,
    client_ip: ClientIp,
    Query(params): Query<ScanParams>,
) -> Json<ScanResponse> {
    let now = Utc::now();

    let Some(token) = params.into_token() else {
        // No token at all still leaves a trace in the scan log.
        if let Err(err) = state.scan_log.append(now, EMPTY_TOKEN, ScanStatus::Error).await {
            tracing::warn!(error = %err, "Failed to record empty scan");
        }
        return Json(ScanResponse::new(
            ScanStatus::Error,
            "No QR code supplied.".to_string(),
            EMPTY_TOKEN.to_string(),
            now,
        ));
    };

    let scanner = client_ip.0.to_string();
    match state.engine.verify(&token, &scanner).await {
        Ok(Verification { status, message }) => {
            Json(ScanResponse::new(status, message, token, now))
        }
        Err(err) => {
            tracing::error!(token = %token, error = %err, "Scan verification failed");
            Json(ScanResponse::new(
                ScanStatus::Error,
                "Verification failed.".to_string(),
                token,
                now,
            ))
        }
    }
}
