//! # Gatekeeper Ticketing
//!
//! Event ticket issuance and gate verification over a local SQLite store,
//! with a Google Sheets ledger as the team-facing mirror.
//!
//! ## Features
//!
//! - **Local-first**: SQLite is the system of record; the gate never waits
//!   on a spreadsheet
//! - **Best-effort mirroring**: sheet pushes, CSV records, and ticket mail
//!   are side effects that never roll back an issued code
//! - **Atomic admission**: one conditional write decides every scan, so
//!   two gates cannot admit the same code inside the reuse window
//! - **Testable**: every seam is a trait with an in-memory mock
//!
//! ## Architecture
//!
//! ```text
//!                sync (pull)                 issuance (mint + push)
//! Google Sheets ────────────→ SqliteStore ←──────────────────────── tokens
//!       ↑                          │                                  │
//!       └── best-effort mirror ────┤                          QR + CSV + mail
//!                                  ↓
//!                          VerificationEngine ──→ ScanLog
//! ```
//!
//! ## Example: verifying a scan
//!
//! ```rust,ignore
//! use gatekeeper_ticketing::{ScanLog, SqliteStore, VerificationEngine};
//!
//! let store = SqliteStore::new("data.db").await?;
//! let engine = VerificationEngine::new(store, ScanLog::new("scan_log.txt"));
//!
//! let verification = engine.verify("TICKET0TOKEN", "gate-1").await?;
//! println!("{}: {}", verification.status, verification.message);
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod error;
pub mod issuance;
pub mod providers;
pub mod records;
pub mod scan_log;
pub mod stores;
pub mod sync;
pub mod token;
pub mod verify;

// Test doubles, available to downstream crates via the `test-utils` feature
#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

pub use error::{Result, TicketingError};
pub use issuance::{IssuanceOptions, IssuanceSummary, IssuanceWorkflow};
pub use records::{
    CodeRecord, CodeStats, ParticipantRecord, ParticipantUpsert, ResetScope, ScanStatus,
    Verification,
};
pub use scan_log::ScanLog;
pub use stores::SqliteStore;
pub use sync::{sync_codes, sync_participants, SyncSummary};
pub use token::generate_token;
pub use verify::VerificationEngine;
