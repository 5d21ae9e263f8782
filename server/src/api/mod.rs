//! API endpoints for the gate service.
//!
//! HTTP handlers organized by concern:
//! - Scan: QR verification at the gate
//! - Tickets: public ticket status lookup
//! - Admin: authenticated maintenance endpoints

pub mod admin;
pub mod scan;
pub mod tickets;

pub use admin::{delete_valid, login, logout, reset, stats};
pub use scan::scan;
pub use tickets::get_ticket;
