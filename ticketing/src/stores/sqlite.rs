//! SQLite-backed store for admission codes and the participant mirror.

use crate::error::{Result, TicketingError};
use crate::providers::{CodeStore, ParticipantStore};
use crate::records::{CodeRecord, CodeStats, ParticipantRecord, ParticipantUpsert, ResetScope};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// SQLite-backed store.
///
/// One database file holds both tables. The schema is created idempotently
/// on open, so pointing the store at a fresh path yields a working, empty
/// database.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Opens (and creates, if needed) the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created, the
    /// database cannot be opened, or the schema cannot be applied.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            // Prevent transient "database is locked" errors under concurrent access.
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            // SQLite permits limited write concurrency; a single connection avoids
            // "database is locked" failures when several scanners hit one code.
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Pings the database. Used by the readiness probe.
    ///
    /// # Errors
    ///
    /// Returns a database error if the round trip fails.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS codes (
                code TEXT PRIMARY KEY,
                valid INTEGER NOT NULL DEFAULT 1,
                used INTEGER NOT NULL DEFAULT 0,
                last_used TEXT,
                used_by TEXT
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS participants (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL DEFAULT '',
                email TEXT NOT NULL DEFAULT '',
                phone TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL DEFAULT '',
                code TEXT,
                sent_at TEXT,
                sheet_row INTEGER
            )",
        )
        .execute(&self.pool)
        .await?;

        // Sync matches rows by (email, name); lookups come in by code
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_participants_identity ON participants(email, name)",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_participants_code ON participants(code)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

impl CodeStore for SqliteStore {
    async fn create(&self, record: &CodeRecord) -> Result<()> {
        let result = sqlx::query(
            "INSERT INTO codes (code, valid, used, last_used, used_by) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&record.code)
        .bind(record.valid)
        .bind(record.used)
        .bind(record.last_used)
        .bind(record.used_by.as_deref())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            // SQLite error: "UNIQUE constraint failed: codes.code"
            Err(sqlx::Error::Database(db_err))
                if db_err.message().contains("UNIQUE constraint") =>
            {
                Err(TicketingError::CodeExists {
                    token: record.code.clone(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn upsert(&self, record: &CodeRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO codes (code, valid, used, last_used, used_by) VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(code) DO UPDATE SET
                 valid = excluded.valid,
                 used = excluded.used,
                 last_used = excluded.last_used,
                 used_by = excluded.used_by",
        )
        .bind(&record.code)
        .bind(record.valid)
        .bind(record.used)
        .bind(record.last_used)
        .bind(record.used_by.as_deref())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Option<CodeRecord>> {
        let record = sqlx::query_as::<_, CodeRecord>(
            "SELECT code, valid, used, last_used, used_by FROM codes WHERE code = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn mark_used(
        &self,
        token: &str,
        used_by: &str,
        now: DateTime<Utc>,
        reuse_cutoff: DateTime<Utc>,
    ) -> Result<bool> {
        // Single conditional UPDATE; rows_affected decides the race. Two
        // concurrent scans of one code both reach this statement, the
        // database serializes them, and only the first matches the guard.
        let result = sqlx::query(
            "UPDATE codes
             SET used = 1, last_used = ?, used_by = ?
             WHERE code = ? AND valid = 1
               AND (used = 0 OR last_used IS NULL OR last_used < ?)",
        )
        .bind(now)
        .bind(used_by)
        .bind(token)
        .bind(reuse_cutoff)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM codes WHERE code = ?)")
            .bind(token)
            .fetch_one(&self.pool)
            .await?;
        if exists {
            Ok(false)
        } else {
            Err(TicketingError::CodeNotFound)
        }
    }

    async fn reset_used(&self, scope: ResetScope) -> Result<u64> {
        let result = match scope {
            ResetScope::All => {
                sqlx::query(
                    "UPDATE codes SET used = 0, last_used = NULL
                     WHERE used = 1 OR last_used IS NOT NULL",
                )
                .execute(&self.pool)
                .await?
            }
            ResetScope::OlderThan(cutoff) => {
                sqlx::query(
                    "UPDATE codes SET used = 0, last_used = NULL
                     WHERE used = 1 AND last_used < ?",
                )
                .bind(cutoff)
                .execute(&self.pool)
                .await?
            }
        };
        Ok(result.rows_affected())
    }

    async fn delete_valid(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM codes WHERE valid = 1")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn stats(&self) -> Result<CodeStats> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM codes")
            .fetch_one(&self.pool)
            .await?;
        let valid = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM codes WHERE valid = 1")
            .fetch_one(&self.pool)
            .await?;
        let used = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM codes WHERE used = 1")
            .fetch_one(&self.pool)
            .await?;
        let unused = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM codes WHERE used = 0")
            .fetch_one(&self.pool)
            .await?;

        Ok(CodeStats {
            total,
            valid,
            used,
            unused,
        })
    }
}

impl ParticipantStore for SqliteStore {
    async fn upsert_participant(&self, row: &ParticipantUpsert) -> Result<()> {
        let existing: Option<i64> =
            sqlx::query_scalar("SELECT id FROM participants WHERE email = ? AND name = ?")
                .bind(&row.email)
                .bind(&row.name)
                .fetch_optional(&self.pool)
                .await?;

        if let Some(id) = existing {
            // code and sent_at are set once; a later sync never clears or
            // replaces them
            sqlx::query(
                "UPDATE participants
                 SET phone = ?, status = ?,
                     code = COALESCE(code, ?),
                     sent_at = COALESCE(sent_at, ?),
                     sheet_row = ?
                 WHERE id = ?",
            )
            .bind(&row.phone)
            .bind(&row.status)
            .bind(row.code.as_deref())
            .bind(row.sent_at.as_deref())
            .bind(row.sheet_row)
            .bind(id)
            .execute(&self.pool)
            .await?;
        } else {
            sqlx::query(
                "INSERT INTO participants (name, email, phone, status, code, sent_at, sheet_row)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&row.name)
            .bind(&row.email)
            .bind(&row.phone)
            .bind(&row.status)
            .bind(row.code.as_deref())
            .bind(row.sent_at.as_deref())
            .bind(row.sheet_row)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    async fn list_participants(&self) -> Result<Vec<ParticipantRecord>> {
        let rows = sqlx::query_as::<_, ParticipantRecord>(
            "SELECT id, name, email, phone, status, code, sent_at, sheet_row
             FROM participants ORDER BY sheet_row ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn assign_code(&self, id: i64, token: &str, sent_at: &str) -> Result<()> {
        let result = sqlx::query("UPDATE participants SET code = ?, sent_at = ? WHERE id = ?")
            .bind(token)
            .bind(sent_at)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(TicketingError::ParticipantNotFound);
        }
        Ok(())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<ParticipantRecord>> {
        let row = sqlx::query_as::<_, ParticipantRecord>(
            "SELECT id, name, email, phone, status, code, sent_at, sheet_row
             FROM participants WHERE code = ?",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use crate::token::generate_token;
    use chrono::Duration as ChronoDuration;

    async fn open_temp() -> SqliteStore {
        let path = std::env::temp_dir().join(format!("gatekeeper-test-{}.db", generate_token(8)));
        SqliteStore::new(path).await.unwrap()
    }

    fn upsert_row(name: &str, email: &str, status: &str, sheet_row: i64) -> ParticipantUpsert {
        ParticipantUpsert {
            name: name.to_string(),
            email: email.to_string(),
            status: status.to_string(),
            sheet_row: Some(sheet_row),
            ..ParticipantUpsert::default()
        }
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let store = open_temp().await;
        let record = CodeRecord::fresh("ABC123XYZ".to_string());

        store.create(&record).await.unwrap();

        let fetched = store.get("ABC123XYZ").await.unwrap().unwrap();
        assert_eq!(fetched, record);
        assert!(store.get("NOPE000").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_duplicate_is_conflict() {
        let store = open_temp().await;
        let record = CodeRecord::fresh("DUPLICATE1".to_string());

        store.create(&record).await.unwrap();
        let err = store.create(&record).await.unwrap_err();

        assert_eq!(
            err,
            TicketingError::CodeExists {
                token: "DUPLICATE1".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing() {
        let store = open_temp().await;
        let mut record = CodeRecord::fresh("REPLACEME1".to_string());
        store.create(&record).await.unwrap();

        record.valid = false;
        store.upsert(&record).await.unwrap();

        let fetched = store.get("REPLACEME1").await.unwrap().unwrap();
        assert!(!fetched.valid);
    }

    #[tokio::test]
    async fn test_mark_used_claims_once_within_window() {
        let store = open_temp().await;
        store
            .create(&CodeRecord::fresh("GATE1".to_string()))
            .await
            .unwrap();

        let now = Utc::now();
        let cutoff = now - ChronoDuration::hours(24);

        assert!(store.mark_used("GATE1", "gate-a", now, cutoff).await.unwrap());

        let record = store.get("GATE1").await.unwrap().unwrap();
        assert!(record.used);
        assert_eq!(record.used_by.as_deref(), Some("gate-a"));

        // Second claim inside the window loses
        let later = now + ChronoDuration::minutes(5);
        let later_cutoff = later - ChronoDuration::hours(24);
        assert!(
            !store
                .mark_used("GATE1", "gate-b", later, later_cutoff)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_mark_used_readmits_after_window() {
        let store = open_temp().await;
        store
            .create(&CodeRecord::fresh("GATE2".to_string()))
            .await
            .unwrap();

        let yesterday = Utc::now() - ChronoDuration::hours(25);
        let yesterday_cutoff = yesterday - ChronoDuration::hours(24);
        assert!(
            store
                .mark_used("GATE2", "gate-a", yesterday, yesterday_cutoff)
                .await
                .unwrap()
        );

        let now = Utc::now();
        let cutoff = now - ChronoDuration::hours(24);
        assert!(store.mark_used("GATE2", "gate-b", now, cutoff).await.unwrap());

        let record = store.get("GATE2").await.unwrap().unwrap();
        assert_eq!(record.used_by.as_deref(), Some("gate-b"));
    }

    #[tokio::test]
    async fn test_mark_used_unknown_token() {
        let store = open_temp().await;
        let now = Utc::now();
        let err = store
            .mark_used("NOPE000", "gate-a", now, now - ChronoDuration::hours(24))
            .await
            .unwrap_err();
        assert_eq!(err, TicketingError::CodeNotFound);
    }

    #[tokio::test]
    async fn test_mark_used_skips_disabled_code() {
        let store = open_temp().await;
        let mut record = CodeRecord::fresh("DISABLED1".to_string());
        record.valid = false;
        store.upsert(&record).await.unwrap();

        let now = Utc::now();
        let claimed = store
            .mark_used("DISABLED1", "gate-a", now, now - ChronoDuration::hours(24))
            .await
            .unwrap();
        assert!(!claimed);
    }

    #[tokio::test]
    async fn test_concurrent_mark_used_single_winner() {
        let store = open_temp().await;
        store
            .create(&CodeRecord::fresh("RACE1".to_string()))
            .await
            .unwrap();

        let now = Utc::now();
        let cutoff = now - ChronoDuration::hours(24);
        let (a, b) = tokio::join!(
            store.mark_used("RACE1", "gate-a", now, cutoff),
            store.mark_used("RACE1", "gate-b", now, cutoff),
        );

        let wins = [a.unwrap(), b.unwrap()];
        assert_eq!(wins.iter().filter(|w| **w).count(), 1);
    }

    #[tokio::test]
    async fn test_reset_all_clears_used_state() {
        let store = open_temp().await;
        let now = Utc::now();
        let cutoff = now - ChronoDuration::hours(24);

        for token in ["RESET1", "RESET2", "RESET3"] {
            store
                .create(&CodeRecord::fresh(token.to_string()))
                .await
                .unwrap();
        }
        store.mark_used("RESET1", "gate-a", now, cutoff).await.unwrap();
        store.mark_used("RESET2", "gate-a", now, cutoff).await.unwrap();

        let affected = store.reset_used(ResetScope::All).await.unwrap();
        assert_eq!(affected, 2);

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.used, 0);
        assert_eq!(stats.unused, 3);
        assert!(store.get("RESET1").await.unwrap().unwrap().last_used.is_none());
    }

    #[tokio::test]
    async fn test_reset_older_than_spares_recent() {
        let store = open_temp().await;
        let now = Utc::now();

        store
            .create(&CodeRecord::fresh("OLD1".to_string()))
            .await
            .unwrap();
        store
            .create(&CodeRecord::fresh("FRESH1".to_string()))
            .await
            .unwrap();

        let stale = now - ChronoDuration::hours(25);
        store
            .mark_used("OLD1", "gate-a", stale, stale - ChronoDuration::hours(24))
            .await
            .unwrap();
        store
            .mark_used("FRESH1", "gate-a", now, now - ChronoDuration::hours(24))
            .await
            .unwrap();

        let affected = store
            .reset_used(ResetScope::OlderThan(now - ChronoDuration::hours(24)))
            .await
            .unwrap();
        assert_eq!(affected, 1);

        assert!(!store.get("OLD1").await.unwrap().unwrap().used);
        assert!(store.get("FRESH1").await.unwrap().unwrap().used);
    }

    #[tokio::test]
    async fn test_delete_valid_spares_disabled() {
        let store = open_temp().await;
        store
            .create(&CodeRecord::fresh("KEEP-VALID1".to_string()))
            .await
            .unwrap();
        store
            .create(&CodeRecord::fresh("KEEP-VALID2".to_string()))
            .await
            .unwrap();
        let mut disabled = CodeRecord::fresh("DISABLED2".to_string());
        disabled.valid = false;
        store.upsert(&disabled).await.unwrap();

        let deleted = store.delete_valid().await.unwrap();
        assert_eq!(deleted, 2);

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.valid, 0);
    }

    #[tokio::test]
    async fn test_participant_upsert_matches_email_and_name() {
        let store = open_temp().await;

        store
            .upsert_participant(&upsert_row("Alice", "alice@example.com", "PAID", 2))
            .await
            .unwrap();
        // Same pair: update in place
        store
            .upsert_participant(&upsert_row("Alice", "alice@example.com", "PAID", 4))
            .await
            .unwrap();
        // Same email, different name: new row
        store
            .upsert_participant(&upsert_row("Alice B", "alice@example.com", "PENDING", 5))
            .await
            .unwrap();

        let all = store.list_participants().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].sheet_row, Some(4));
    }

    #[tokio::test]
    async fn test_participant_code_is_set_once() {
        let store = open_temp().await;
        store
            .upsert_participant(&upsert_row("Bob", "bob@example.com", "PAID", 2))
            .await
            .unwrap();
        let id = store.list_participants().await.unwrap()[0].id;

        store.assign_code(id, "BOBTOKEN01", "2025-06-01 10:00:00").await.unwrap();

        // A later sync with an empty code cell must not clear the assignment
        store
            .upsert_participant(&upsert_row("Bob", "bob@example.com", "PAID", 2))
            .await
            .unwrap();

        let row = store.find_by_code("BOBTOKEN01").await.unwrap().unwrap();
        assert_eq!(row.id, id);
        assert_eq!(row.sent_at.as_deref(), Some("2025-06-01 10:00:00"));
    }

    #[tokio::test]
    async fn test_assign_code_unknown_id() {
        let store = open_temp().await;
        let err = store
            .assign_code(999, "TOKEN99", "2025-06-01 10:00:00")
            .await
            .unwrap_err();
        assert_eq!(err, TicketingError::ParticipantNotFound);
    }

    #[tokio::test]
    async fn test_list_participants_in_ledger_order() {
        let store = open_temp().await;
        store
            .upsert_participant(&upsert_row("Cara", "cara@example.com", "PAID", 9))
            .await
            .unwrap();
        store
            .upsert_participant(&upsert_row("Dan", "dan@example.com", "PAID", 2))
            .await
            .unwrap();
        store
            .upsert_participant(&upsert_row("Eve", "eve@example.com", "PAID", 5))
            .await
            .unwrap();

        let rows: Vec<Option<i64>> = store
            .list_participants()
            .await
            .unwrap()
            .iter()
            .map(|p| p.sheet_row)
            .collect();
        assert_eq!(rows, vec![Some(2), Some(5), Some(9)]);
    }
}
