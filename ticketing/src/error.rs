//! Error types for code issuance and verification operations.

use thiserror::Error;

/// Result type alias for ticketing operations.
pub type Result<T> = std::result::Result<T, TicketingError>;

/// Error taxonomy for the ticketing system.
///
/// Variants are organized by category so callers can tell per-item
/// recoverable failures (log, skip the item, continue the batch) apart
/// from fatal ones (abort the run).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TicketingError {
    // ═══════════════════════════════════════════════════════════
    // Code Store Errors
    // ═══════════════════════════════════════════════════════════

    /// No code record exists for this token.
    #[error("Code not found")]
    CodeNotFound,

    /// A code record with this token already exists.
    #[error("Code already exists: {token}")]
    CodeExists {
        /// Token that collided with an existing record
        token: String,
    },

    /// No participant row exists for this id.
    #[error("Participant not found")]
    ParticipantNotFound,

    // ═══════════════════════════════════════════════════════════
    // Ledger Errors
    // ═══════════════════════════════════════════════════════════

    /// The named sheet does not exist in the external ledger.
    #[error("Sheet not found: {sheet}")]
    SheetNotFound {
        /// Sheet title that was requested
        sheet: String,
    },

    /// The external ledger rejected or failed a request.
    #[error("Ledger error: {0}")]
    Ledger(String),

    // ═══════════════════════════════════════════════════════════
    // Delivery Errors
    // ═══════════════════════════════════════════════════════════

    /// Email construction or delivery failed.
    #[error("Mail error: {0}")]
    Mail(String),

    /// QR image rendering or encoding failed.
    #[error("QR render error: {0}")]
    QrRender(String),

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// Filesystem operation failed.
    #[error("IO error: {0}")]
    Io(String),
}

impl TicketingError {
    /// Returns `true` if this error should skip one item of a batch
    /// rather than abort the whole run.
    ///
    /// # Examples
    ///
    /// ```
    /// # use gatekeeper_ticketing::TicketingError;
    /// assert!(TicketingError::Mail("connection refused".into()).is_recoverable_per_item());
    /// assert!(!TicketingError::Database("disk full".into()).is_recoverable_per_item());
    /// ```
    pub const fn is_recoverable_per_item(&self) -> bool {
        matches!(
            self,
            Self::SheetNotFound { .. }
                | Self::Ledger(_)
                | Self::Mail(_)
                | Self::QrRender(_)
        )
    }

    /// Returns `true` if this error means the requested record is absent.
    ///
    /// # Examples
    ///
    /// ```
    /// # use gatekeeper_ticketing::TicketingError;
    /// assert!(TicketingError::CodeNotFound.is_not_found());
    /// assert!(!TicketingError::Io("read-only filesystem".into()).is_not_found());
    /// ```
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::CodeNotFound | Self::ParticipantNotFound | Self::SheetNotFound { .. }
        )
    }
}

impl From<sqlx::Error> for TicketingError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<std::io::Error> for TicketingError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
