//! Mock provider implementations for testing.
//!
//! Simple, in-memory implementations of every provider trait, for use in
//! unit and integration tests. The code store mock preserves the atomic
//! admission semantics of the real store.

pub mod code_store;
pub mod ledger;
pub mod mailer;
pub mod participant_store;
pub mod qr;

pub use code_store::MockCodeStore;
pub use ledger::MockLedger;
pub use mailer::{MockMailer, SentTicket};
pub use participant_store::MockParticipantStore;
pub use qr::MockQrRenderer;
