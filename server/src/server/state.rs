//! Shared state for the gate HTTP server.

use gatekeeper_ticketing::{ScanLog, SqliteStore, VerificationEngine};

use crate::sessions::AdminSessions;

/// Everything the HTTP handlers share.
///
/// Cloned per request; each field is a handle (connection pool or
/// `Arc`-backed registry), so clones are cheap.
#[derive(Clone)]
pub struct AppState {
    /// Decides scan outcomes
    pub engine: VerificationEngine<SqliteStore>,

    /// Backs ticket lookups and admin maintenance
    pub store: SqliteStore,

    /// Bearer-token session registry
    pub sessions: AdminSessions,

    /// Feeds the admin activity tail
    pub scan_log: ScanLog,
}

impl AppState {
    /// Bundle the shared handles.
    #[must_use]
    pub const fn new(
        engine: VerificationEngine<SqliteStore>,
        store: SqliteStore,
        sessions: AdminSessions,
        scan_log: ScanLog,
    ) -> Self {
        Self {
            engine,
            store,
            sessions,
            scan_log,
        }
    }
}
