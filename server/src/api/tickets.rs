//! Public ticket status lookup.

use axum::extract::{Path, State};
use axum::Json;
use gatekeeper_ticketing::providers::ParticipantStore;
use serde::Serialize;

use crate::error::AppError;
use crate::server::state::AppState;

/// Ticket status as shown to the holder.
#[derive(Debug, Serialize)]
pub struct TicketResponse {
    /// Admission token
    pub code: String,
    /// Participant name
    pub name: String,
    /// Participant email
    pub email: String,
    /// Payment status from the ledger
    pub status: String,
    /// When the ticket mail went out, if it did
    pub sent_at: Option<String>,
}

/// Look up a ticket by its admission code.
///
/// Codes are matched case-insensitively; surrounding whitespace from
/// copy-paste is ignored.
///
/// # Endpoint
///
/// ```text
/// GET /api/tickets/:code
/// ```
///
/// # Response
///
/// ```json
/// {
///   "code": "ABC123",
///   "name": "Jane Doe",
///   "email": "jane@example.com",
///   "status": "PAID",
///   "sent_at": "2025-02-20 09:15:00"
/// }
/// ```
pub async fn get_ticket(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<TicketResponse>, AppError> {
    let normalized = code.trim().to_uppercase();

    let participant = state
        .store
        .find_by_code(&normalized)
        .await?
        .ok_or_else(|| AppError::not_found("Ticket", &normalized))?;

    Ok(Json(TicketResponse {
        code: normalized,
        name: participant.name,
        email: participant.email,
        status: participant.status,
        sent_at: participant.sent_at,
    }))
}
