//! Gate-side verification engine.
//!
//! Turns a scanned token into an admit/reject decision against the local
//! code store. The store is the single authority here; the external
//! ledger is never consulted at the gate.

use crate::error::{Result, TicketingError};
use crate::providers::CodeStore;
use crate::records::{ScanStatus, Verification};
use crate::scan_log::ScanLog;
use chrono::{DateTime, Duration, Utc};

/// Default reuse window: a used code re-admits after this long.
pub const DEFAULT_REUSE_WINDOW_HOURS: i64 = 24;

/// Decides admissions and writes the scan audit trail.
///
/// Concurrent scans of the same token are serialized by the store's
/// conditional write, so at most one scanner per window sees `ok`.
#[derive(Debug, Clone)]
pub struct VerificationEngine<S> {
    store: S,
    scan_log: ScanLog,
    reuse_window: Duration,
}

impl<S: CodeStore> VerificationEngine<S> {
    /// Creates an engine with the default 24 hour reuse window.
    pub fn new(store: S, scan_log: ScanLog) -> Self {
        Self {
            store,
            scan_log,
            reuse_window: Duration::hours(DEFAULT_REUSE_WINDOW_HOURS),
        }
    }

    /// Overrides the reuse window.
    #[must_use]
    pub fn with_reuse_window(mut self, window: Duration) -> Self {
        self.reuse_window = window;
        self
    }

    /// The configured reuse window.
    #[must_use]
    pub const fn reuse_window(&self) -> Duration {
        self.reuse_window
    }

    /// Verifies a scanned token as of now.
    ///
    /// # Errors
    ///
    /// Returns the store's error when the code table cannot be read or
    /// written. Rejections are not errors; they come back as `used` or
    /// `invalid` verifications.
    pub async fn verify(&self, token: &str, scanner: &str) -> Result<Verification> {
        self.verify_at(token, scanner, Utc::now()).await
    }

    /// Verifies a scanned token at an explicit instant.
    ///
    /// # Errors
    ///
    /// Same as [`verify`](Self::verify).
    pub async fn verify_at(
        &self,
        token: &str,
        scanner: &str,
        now: DateTime<Utc>,
    ) -> Result<Verification> {
        let verification = self.decide(token, scanner, now).await?;
        // The admission is already committed; a lost audit line must not
        // turn the scanner's screen red.
        if let Err(e) = self.scan_log.append(now, token, verification.status).await {
            tracing::warn!(token, "failed to append scan log line: {}", e);
        }
        Ok(verification)
    }

    async fn decide(
        &self,
        token: &str,
        scanner: &str,
        now: DateTime<Utc>,
    ) -> Result<Verification> {
        let Some(record) = self.store.get(token).await? else {
            return Ok(Verification {
                status: ScanStatus::Invalid,
                message: "Code not found.".to_string(),
            });
        };
        if !record.valid {
            return Ok(Verification {
                status: ScanStatus::Invalid,
                message: "Code not valid.".to_string(),
            });
        }

        let cutoff = now - self.reuse_window;
        match self.store.mark_used(token, scanner, now, cutoff).await {
            Ok(true) => Ok(Verification {
                status: ScanStatus::Ok,
                message: "Ticket valid. Welcome!".to_string(),
            }),
            Ok(false) => Ok(self.already_used()),
            // Deleted between the read and the write; report what the
            // scanner would see on retry.
            Err(TicketingError::CodeNotFound) => Ok(Verification {
                status: ScanStatus::Invalid,
                message: "Code not found.".to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    fn already_used(&self) -> Verification {
        Verification {
            status: ScanStatus::Used,
            message: format!(
                "Code already used within the last {} hours.",
                self.reuse_window.num_hours()
            ),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use crate::mocks::MockCodeStore;
    use crate::records::CodeRecord;
    use crate::token::generate_token;
    use chrono::TimeZone;

    fn temp_engine(store: MockCodeStore) -> VerificationEngine<MockCodeStore> {
        let path = std::env::temp_dir().join(format!("verify_log_{}.txt", generate_token(8)));
        VerificationEngine::new(store, ScanLog::new(path))
    }

    fn at(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, hour, min, 0).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_token_is_invalid_and_untouched() {
        let store = MockCodeStore::new();
        let engine = temp_engine(store.clone());

        let v = engine.verify_at("NOPE", "gate-1", at(9, 0)).await.unwrap();
        assert_eq!(v.status, ScanStatus::Invalid);
        assert_eq!(v.message, "Code not found.");
        assert!(store.get_all().is_empty());
    }

    #[tokio::test]
    async fn test_disabled_code_is_invalid() {
        let store = MockCodeStore::new();
        let mut record = CodeRecord::fresh("DISABLED1".to_string());
        record.valid = false;
        store.upsert(&record).await.unwrap();
        let engine = temp_engine(store);

        let v = engine
            .verify_at("DISABLED1", "gate-1", at(9, 0))
            .await
            .unwrap();
        assert_eq!(v.status, ScanStatus::Invalid);
        assert_eq!(v.message, "Code not valid.");
    }

    #[tokio::test]
    async fn test_first_scan_admits_second_rejects() {
        let store = MockCodeStore::new();
        store
            .create(&CodeRecord::fresh("TICKET001".to_string()))
            .await
            .unwrap();
        let engine = temp_engine(store.clone());

        let first = engine
            .verify_at("TICKET001", "gate-1", at(19, 0))
            .await
            .unwrap();
        assert_eq!(first.status, ScanStatus::Ok);
        assert_eq!(first.message, "Ticket valid. Welcome!");

        let second = engine
            .verify_at("TICKET001", "gate-2", at(19, 5))
            .await
            .unwrap();
        assert_eq!(second.status, ScanStatus::Used);
        assert_eq!(
            second.message,
            "Code already used within the last 24 hours."
        );

        let record = store.get("TICKET001").await.unwrap().unwrap();
        assert_eq!(record.used_by.as_deref(), Some("gate-1"));
    }

    #[tokio::test]
    async fn test_readmission_after_the_window() {
        let store = MockCodeStore::new();
        store
            .create(&CodeRecord::fresh("TICKET002".to_string()))
            .await
            .unwrap();
        let engine = temp_engine(store.clone());

        let day_one = at(19, 0);
        engine
            .verify_at("TICKET002", "gate-1", day_one)
            .await
            .unwrap();

        // 25 hours later the window has lapsed
        let day_two = day_one + Duration::hours(25);
        let v = engine
            .verify_at("TICKET002", "gate-1", day_two)
            .await
            .unwrap();
        assert_eq!(v.status, ScanStatus::Ok);

        let record = store.get("TICKET002").await.unwrap().unwrap();
        assert_eq!(record.last_used, Some(day_two));
    }

    #[tokio::test]
    async fn test_used_without_timestamp_admits() {
        let store = MockCodeStore::new();
        let mut record = CodeRecord::fresh("STALE0001".to_string());
        record.used = true;
        store.upsert(&record).await.unwrap();
        let engine = temp_engine(store);

        let v = engine
            .verify_at("STALE0001", "gate-1", at(10, 0))
            .await
            .unwrap();
        assert_eq!(v.status, ScanStatus::Ok);
    }

    #[tokio::test]
    async fn test_concurrent_scans_admit_exactly_once() {
        let store = MockCodeStore::new();
        store
            .create(&CodeRecord::fresh("RACE00001".to_string()))
            .await
            .unwrap();
        let engine = temp_engine(store);
        let now = at(20, 0);

        let (a, b) = tokio::join!(
            engine.verify_at("RACE00001", "gate-1", now),
            engine.verify_at("RACE00001", "gate-2", now),
        );
        let statuses = [a.unwrap().status, b.unwrap().status];
        let admitted = statuses.iter().filter(|s| **s == ScanStatus::Ok).count();
        assert_eq!(admitted, 1);
        assert!(statuses.contains(&ScanStatus::Used));
    }

    #[tokio::test]
    async fn test_every_attempt_is_logged() {
        let store = MockCodeStore::new();
        store
            .create(&CodeRecord::fresh("LOGGED001".to_string()))
            .await
            .unwrap();
        let engine = temp_engine(store);

        engine
            .verify_at("LOGGED001", "gate-1", at(19, 2))
            .await
            .unwrap();
        engine
            .verify_at("MISSING01", "gate-1", at(19, 3))
            .await
            .unwrap();

        let lines = engine.scan_log.tail(10).await.unwrap();
        assert_eq!(
            lines,
            vec![
                "[2025-06-01 19:02:00] LOGGED001 - ok".to_string(),
                "[2025-06-01 19:03:00] MISSING01 - invalid".to_string(),
            ]
        );

        tokio::fs::remove_file(engine.scan_log.path()).await.unwrap();
    }
}
