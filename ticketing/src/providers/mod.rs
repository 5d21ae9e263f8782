//! Providers for external collaborators and storage.
//!
//! This module defines traits for everything the issuance workflow and the
//! verification engine depend on. The domain logic is written against these
//! traits; binaries wire in concrete implementations, tests wire in mocks.
//!
//! ```text
//! Issuance / Verification / Sync
//!         │
//!         ├── CodeStore ───────────► SqliteStore (stores/)
//!         ├── ParticipantStore ────► SqliteStore (stores/)
//!         ├── Ledger ──────────────► SheetsLedger (REST) / MockLedger
//!         ├── TicketMailer ────────► SmtpMailer (lettre) / MockMailer
//!         └── QrRenderer ──────────► QrPngRenderer / MockQrRenderer
//! ```
//!
//! The local store is the authority for every verification decision; the
//! ledger and the mailer are best-effort collaborators whose failures are
//! logged and tolerated per item.

pub mod code_store;
pub mod ledger;
pub mod mailer;
pub mod participant_store;
pub mod qr;
pub mod sheets;
pub mod smtp_mailer;

// Re-export provider traits and their data models
pub use code_store::CodeStore;
pub use ledger::{Ledger, LedgerRow};
pub use mailer::TicketMailer;
pub use participant_store::ParticipantStore;
pub use qr::{QrPngRenderer, QrRenderer};
pub use sheets::SheetsLedger;
pub use smtp_mailer::{EventDetails, SmtpMailer, SmtpMailerConfig};
