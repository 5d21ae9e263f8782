//! # Gatekeeper Server
//!
//! HTTP front end for the gatekeeper ticketing system: the public scan
//! endpoint QR codes resolve to, a ticket status lookup, and a small
//! bearer-authenticated admin API for counters and code maintenance.
//!
//! The binaries in `src/bin` wire this crate to a concrete SQLite
//! store: `server` runs the gate, `issue` runs the issuance batch,
//! `mint` creates standalone codes.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod api;
pub mod config;
pub mod error;
pub mod extractors;
pub mod server;
pub mod sessions;

pub use config::Config;
pub use error::AppError;
pub use server::{build_router, AppState};
pub use sessions::AdminSessions;
