//! Data records shared by the stores, the sync layer, the issuance
//! workflow, and the verification engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One admission code as stored locally.
///
/// The local store is the authority for verification decisions; the
/// external ledger only mirrors these fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CodeRecord {
    /// The token itself (primary key).
    pub code: String,
    /// Whether this code may admit at all. Disabled codes stay stored.
    pub valid: bool,
    /// Whether this code has admitted someone in its current cycle.
    pub used: bool,
    /// When the code last admitted someone.
    pub last_used: Option<DateTime<Utc>>,
    /// Scanner identity recorded at admission.
    pub used_by: Option<String>,
}

impl CodeRecord {
    /// Creates a valid, unused record for a newly issued token.
    #[must_use]
    pub const fn fresh(code: String) -> Self {
        Self {
            code,
            valid: true,
            used: false,
            last_used: None,
            used_by: None,
        }
    }
}

/// Aggregate counters for the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeStats {
    /// All stored codes.
    pub total: i64,
    /// Codes with `valid = true`.
    pub valid: i64,
    /// Codes currently marked used.
    pub used: i64,
    /// Codes currently unused.
    pub unused: i64,
}

/// Scope selector for bulk resets of used codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetScope {
    /// Every record, regardless of when it was used.
    All,
    /// Only records last used strictly before the cutoff.
    OlderThan(DateTime<Utc>),
}

/// One participant row in the local ledger mirror.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ParticipantRecord {
    /// Local row id.
    pub id: i64,
    /// Participant name as written in the ledger.
    pub name: String,
    /// Contact email; empty when the ledger cell was blank.
    pub email: String,
    /// Phone number, stored verbatim.
    pub phone: String,
    /// Payment status, uppercased at sync time.
    pub status: String,
    /// Assigned admission token, set once by issuance.
    pub code: Option<String>,
    /// When the ticket was sent, preserved as ledger text.
    pub sent_at: Option<String>,
    /// 1-based row position in the external ledger, when known.
    pub sheet_row: Option<i64>,
}

impl ParticipantRecord {
    /// Whether this participant has paid.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.status.trim().eq_ignore_ascii_case("PAID")
    }

    /// Whether a ticket was already issued to this participant.
    #[must_use]
    pub fn has_code(&self) -> bool {
        self.code.as_deref().is_some_and(|c| !c.trim().is_empty())
    }
}

/// Ledger-sourced participant fields for mirror upserts.
///
/// Rows are matched by the `(email, name)` pair; matched rows are updated
/// in place, everything else is inserted. Mirror rows are never deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParticipantUpsert {
    /// Participant name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Phone number.
    pub phone: String,
    /// Payment status (stored uppercased).
    pub status: String,
    /// Already-assigned token, if the ledger has one.
    pub code: Option<String>,
    /// Sent-at text, if the ledger has one.
    pub sent_at: Option<String>,
    /// 1-based external row position.
    pub sheet_row: Option<i64>,
}

/// Outcome class of one verification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    /// Admitted.
    Ok,
    /// Rejected: already admitted within the reuse window.
    Used,
    /// Rejected: unknown or disabled code.
    Invalid,
    /// Malformed request (no token supplied).
    Error,
}

impl std::fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Ok => "ok",
            Self::Used => "used",
            Self::Invalid => "invalid",
            Self::Error => "error",
        };
        write!(f, "{s}")
    }
}

/// Result of one verification attempt, ready for the gate display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verification {
    /// Outcome class.
    pub status: ScanStatus,
    /// Human-readable message.
    pub message: String,
}
