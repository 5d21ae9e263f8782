//! Axum front end for the gate.
//!
//! Splits into shared state, liveness/readiness probes, and the route
//! table; [`build_router`] assembles the three into one router.

pub mod health;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
