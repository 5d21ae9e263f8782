//! Mock code store for testing.

use crate::error::{Result, TicketingError};
use crate::providers::CodeStore;
use crate::records::{CodeRecord, CodeStats, ResetScope};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Mock code store.
///
/// In-memory store with the same atomic admission semantics as the SQLite
/// implementation: the whole claim runs inside one locked critical section,
/// so concurrent scans still produce at most one winner.
#[derive(Debug, Clone)]
pub struct MockCodeStore {
    codes: Arc<Mutex<HashMap<String, CodeRecord>>>,
}

impl MockCodeStore {
    /// Create a new, empty mock store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            codes: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Get all stored records (for testing).
    #[must_use]
    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    pub fn get_all(&self) -> HashMap<String, CodeRecord> {
        self.codes.lock().unwrap().clone()
    }

    /// Clear all records (for testing).
    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    pub fn clear(&self) {
        self.codes.lock().unwrap().clear();
    }
}

impl Default for MockCodeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeStore for MockCodeStore {
    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    async fn create(&self, record: &CodeRecord) -> Result<()> {
        let mut codes = self.codes.lock().unwrap();
        if codes.contains_key(&record.code) {
            return Err(TicketingError::CodeExists {
                token: record.code.clone(),
            });
        }
        codes.insert(record.code.clone(), record.clone());
        Ok(())
    }

    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    async fn upsert(&self, record: &CodeRecord) -> Result<()> {
        let mut codes = self.codes.lock().unwrap();
        codes.insert(record.code.clone(), record.clone());
        Ok(())
    }

    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    async fn get(&self, token: &str) -> Result<Option<CodeRecord>> {
        let codes = self.codes.lock().unwrap();
        Ok(codes.get(token).cloned())
    }

    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    async fn mark_used(
        &self,
        token: &str,
        used_by: &str,
        now: DateTime<Utc>,
        reuse_cutoff: DateTime<Utc>,
    ) -> Result<bool> {
        // Atomic check-and-claim under mutex protection
        let mut codes = self.codes.lock().unwrap();
        let Some(record) = codes.get_mut(token) else {
            return Err(TicketingError::CodeNotFound);
        };

        let eligible =
            record.valid && (!record.used || record.last_used.is_none_or(|t| t < reuse_cutoff));
        if !eligible {
            return Ok(false);
        }

        record.used = true;
        record.last_used = Some(now);
        record.used_by = Some(used_by.to_string());
        Ok(true)
    }

    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    async fn reset_used(&self, scope: ResetScope) -> Result<u64> {
        let mut codes = self.codes.lock().unwrap();
        let mut affected = 0;
        for record in codes.values_mut() {
            let matches = match scope {
                ResetScope::All => record.used || record.last_used.is_some(),
                ResetScope::OlderThan(cutoff) => {
                    record.used && record.last_used.is_some_and(|t| t < cutoff)
                }
            };
            if matches {
                record.used = false;
                record.last_used = None;
                affected += 1;
            }
        }
        Ok(affected)
    }

    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    async fn delete_valid(&self) -> Result<u64> {
        let mut codes = self.codes.lock().unwrap();
        let before = codes.len();
        codes.retain(|_, record| !record.valid);
        Ok((before - codes.len()) as u64)
    }

    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    async fn stats(&self) -> Result<CodeStats> {
        let codes = self.codes.lock().unwrap();
        let total = codes.len() as i64;
        let valid = codes.values().filter(|r| r.valid).count() as i64;
        let used = codes.values().filter(|r| r.used).count() as i64;
        Ok(CodeStats {
            total,
            valid,
            used,
            unused: total - used,
        })
    }
}
