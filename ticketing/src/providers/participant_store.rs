//! Participant mirror store trait.

use crate::error::Result;
use crate::records::{ParticipantRecord, ParticipantUpsert};

/// Local mirror of the external participant ledger.
///
/// Sync keys rows by the `(email, name)` pair and never deletes: a
/// participant who disappears from the ledger keeps their local row, so an
/// already-issued ticket stays traceable.
pub trait ParticipantStore: Send + Sync {
    /// Insert or update one participant row, matched by `(email, name)`.
    ///
    /// # Errors
    ///
    /// Returns a database error if the write fails.
    fn upsert_participant(
        &self,
        row: &ParticipantUpsert,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// All participants in external ledger order (`sheet_row` ascending).
    ///
    /// # Errors
    ///
    /// Returns a database error if the read fails.
    fn list_participants(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<ParticipantRecord>>> + Send;

    /// Record the issued token and send time on one participant.
    ///
    /// # Errors
    ///
    /// Returns `ParticipantNotFound` for a stale id, or a database error if
    /// the write fails.
    fn assign_code(
        &self,
        id: i64,
        token: &str,
        sent_at: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Look up the participant who holds a code.
    ///
    /// # Errors
    ///
    /// Returns a database error if the read fails.
    fn find_by_code(
        &self,
        code: &str,
    ) -> impl std::future::Future<Output = Result<Option<ParticipantRecord>>> + Send;
}
