//! Store implementations.
//!
//! Production storage for admission codes and the participant mirror.
//! The in-memory counterparts used by tests live in [`crate::mocks`].

pub mod sqlite;

pub use sqlite::SqliteStore;
