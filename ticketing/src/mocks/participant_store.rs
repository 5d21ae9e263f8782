//! Mock participant store for testing.

use crate::error::{Result, TicketingError};
use crate::providers::ParticipantStore;
use crate::records::{ParticipantRecord, ParticipantUpsert};
use std::sync::{Arc, Mutex};

/// Mock participant store.
///
/// In-memory mirror with the same `(email, name)` upsert key and set-once
/// code semantics as the SQLite implementation.
#[derive(Debug, Clone)]
pub struct MockParticipantStore {
    rows: Arc<Mutex<Vec<ParticipantRecord>>>,
}

impl MockParticipantStore {
    /// Create a new, empty mock store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Get all rows (for testing).
    #[must_use]
    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    pub fn get_all(&self) -> Vec<ParticipantRecord> {
        self.rows.lock().unwrap().clone()
    }
}

impl Default for MockParticipantStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ParticipantStore for MockParticipantStore {
    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    async fn upsert_participant(&self, row: &ParticipantUpsert) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(existing) = rows
            .iter_mut()
            .find(|p| p.email == row.email && p.name == row.name)
        {
            existing.phone.clone_from(&row.phone);
            existing.status.clone_from(&row.status);
            existing.sheet_row = row.sheet_row;
            // code and sent_at are set once
            if existing.code.is_none() {
                existing.code.clone_from(&row.code);
            }
            if existing.sent_at.is_none() {
                existing.sent_at.clone_from(&row.sent_at);
            }
        } else {
            let id = rows.len() as i64 + 1;
            rows.push(ParticipantRecord {
                id,
                name: row.name.clone(),
                email: row.email.clone(),
                phone: row.phone.clone(),
                status: row.status.clone(),
                code: row.code.clone(),
                sent_at: row.sent_at.clone(),
                sheet_row: row.sheet_row,
            });
        }
        Ok(())
    }

    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    async fn list_participants(&self) -> Result<Vec<ParticipantRecord>> {
        let mut rows = self.rows.lock().unwrap().clone();
        rows.sort_by_key(|p| p.sheet_row);
        Ok(rows)
    }

    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    async fn assign_code(&self, id: i64, token: &str, sent_at: &str) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows.iter_mut().find(|p| p.id == id) else {
            return Err(TicketingError::ParticipantNotFound);
        };
        row.code = Some(token.to_string());
        row.sent_at = Some(sent_at.to_string());
        Ok(())
    }

    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    async fn find_by_code(&self, code: &str) -> Result<Option<ParticipantRecord>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|p| p.code.as_deref() == Some(code)).cloned())
    }
}
