//! Code store trait.
//!
//! This module defines the authoritative store for admission codes with
//! atomic single-admission semantics.

use crate::error::Result;
use crate::records::{CodeRecord, CodeStats, ResetScope};
use chrono::{DateTime, Utc};

/// Authoritative store for admission codes.
///
/// # Implementation Notes
///
/// - **CRITICAL**: `mark_used()` MUST be atomic (a single conditional
///   UPDATE, or one locked critical section). Under concurrent scans of the
///   same token at most one caller may win the transition per reuse window.
/// - `create()` never overwrites: a duplicate token is a conflict, not an
///   update. Mirror refreshes that legitimately replay externally authored
///   rows use `upsert()` instead.
/// - Timestamps are compared as bound values, not via SQL date arithmetic,
///   so every implementation compares like with like.
pub trait CodeStore: Send + Sync {
    /// Insert a new code record.
    ///
    /// # Errors
    ///
    /// Returns `CodeExists` if the token is already stored, or a database
    /// error if the write fails.
    fn create(&self, record: &CodeRecord) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Insert or replace a code record.
    ///
    /// Used by ledger sync, where the external sheet legitimately carries
    /// rows this store has already seen.
    ///
    /// # Errors
    ///
    /// Returns a database error if the write fails.
    fn upsert(&self, record: &CodeRecord) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Fetch a code record by token.
    ///
    /// # Errors
    ///
    /// Returns a database error if the read fails.
    fn get(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<Option<CodeRecord>>> + Send;

    /// Atomically claim a code for admission.
    ///
    /// Sets `used = true`, `last_used = now`, `used_by = scanner` only when
    /// the record is valid and either unused or last used strictly before
    /// `reuse_cutoff`.
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: this call won the transition
    /// - `Ok(false)`: the record exists but was ineligible (disabled, or
    ///   already claimed within the window, possibly by a concurrent scan)
    ///
    /// # Errors
    ///
    /// Returns `CodeNotFound` if no record exists for the token, or a
    /// database error if the write fails.
    fn mark_used(
        &self,
        token: &str,
        used_by: &str,
        now: DateTime<Utc>,
        reuse_cutoff: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;

    /// Bulk-clear `used` and `last_used` for codes matching the scope.
    ///
    /// # Returns
    ///
    /// The number of records changed.
    ///
    /// # Errors
    ///
    /// Returns a database error if the write fails.
    fn reset_used(
        &self,
        scope: ResetScope,
    ) -> impl std::future::Future<Output = Result<u64>> + Send;

    /// Delete every record with `valid = true`.
    ///
    /// Post-event cleanup; invalidated codes are kept for the record.
    ///
    /// # Returns
    ///
    /// The number of records deleted.
    ///
    /// # Errors
    ///
    /// Returns a database error if the write fails.
    fn delete_valid(&self) -> impl std::future::Future<Output = Result<u64>> + Send;

    /// Aggregate counters for the admin dashboard.
    ///
    /// # Errors
    ///
    /// Returns a database error if the read fails.
    fn stats(&self) -> impl std::future::Future<Output = Result<CodeStats>> + Send;
}
