//! One-way pull from the external ledger into the local store.
//!
//! The ledger is where the event team types; the local store is where the
//! gate decides. Sync copies ledger rows in, resolving the team's column
//! headers through a small alias table and parsing their hand-typed
//! booleans and timestamps leniently. Nothing here writes back out.

use crate::error::{Result, TicketingError};
use crate::providers::{CodeStore, Ledger, ParticipantStore};
use crate::records::{CodeRecord, ParticipantUpsert};
use chrono::{DateTime, NaiveDateTime, Utc};

/// Column headers of the external codes sheet, in push order.
pub const CODES_SHEET_HEADER: [&str; 5] = ["Kode", "Valid", "Used", "LastUsed", "UsedBy"];

const NAME_ALIASES: &[&str] = &["Nama Peserta", "Name"];
const EMAIL_ALIASES: &[&str] = &["Email"];
const PHONE_ALIASES: &[&str] = &["Nomor HP", "Phone"];
const STATUS_ALIASES: &[&str] = &["Status"];
const CODE_ALIASES: &[&str] = &["Kode Unik", "Kode", "Code", "UniqueCode", "unique_code"];
const SENT_AT_ALIASES: &[&str] = &["Waktu Kirim", "SentAt"];
const VALID_ALIASES: &[&str] = &["Valid"];
const USED_ALIASES: &[&str] = &["Used"];
const LAST_USED_ALIASES: &[&str] = &["LastUsed"];
const USED_BY_ALIASES: &[&str] = &["UsedBy"];

/// Counts from one sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Rows written to the local store.
    pub upserted: u64,
    /// Rows passed over (blank, malformed, or store rejection).
    pub skipped: u64,
}

/// Pulls the participant sheet into the local mirror.
///
/// Rows missing both name and email are skipped; a row the store rejects
/// is logged and skipped without aborting the pass.
///
/// # Errors
///
/// Returns the ledger's error when the sheet cannot be read at all,
/// including `SheetNotFound`: unlike the codes sheet, the participant
/// sheet is the reason to sync.
pub async fn sync_participants<P, L>(store: &P, ledger: &L, sheet: &str) -> Result<SyncSummary>
where
    P: ParticipantStore,
    L: Ledger,
{
    let rows = ledger.read_rows(sheet).await?;
    let mut summary = SyncSummary::default();
    for row in rows {
        let name = row.field(NAME_ALIASES).unwrap_or_default();
        let email = row.field(EMAIL_ALIASES).unwrap_or_default();
        if name.is_empty() && email.is_empty() {
            tracing::debug!(row = row.row, "skipping participant row without name or email");
            summary.skipped += 1;
            continue;
        }
        let upsert = ParticipantUpsert {
            name,
            email,
            phone: row.field(PHONE_ALIASES).unwrap_or_default(),
            status: row.field(STATUS_ALIASES).unwrap_or_default().to_uppercase(),
            code: row.field(CODE_ALIASES),
            sent_at: row.field(SENT_AT_ALIASES),
            sheet_row: Some(i64::from(row.row)),
        };
        match store.upsert_participant(&upsert).await {
            Ok(()) => summary.upserted += 1,
            Err(e) => {
                tracing::warn!(row = row.row, "failed to upsert participant row: {}", e);
                summary.skipped += 1;
            }
        }
    }
    tracing::info!(
        sheet,
        upserted = summary.upserted,
        skipped = summary.skipped,
        "participant sync finished"
    );
    Ok(summary)
}

/// Pulls the codes sheet into the local code store.
///
/// A missing codes sheet is normal before the first issuance run, so it
/// reads as an empty pass rather than an error.
///
/// # Errors
///
/// Returns the ledger's error for transport failures, or the store's
/// error when a write fails.
pub async fn sync_codes<S, L>(store: &S, ledger: &L, sheet: &str) -> Result<SyncSummary>
where
    S: CodeStore,
    L: Ledger,
{
    let rows = match ledger.read_rows(sheet).await {
        Ok(rows) => rows,
        Err(TicketingError::SheetNotFound { .. }) => {
            tracing::debug!(sheet, "no codes sheet yet, nothing to pull");
            return Ok(SyncSummary::default());
        }
        Err(e) => return Err(e),
    };

    let mut summary = SyncSummary::default();
    for row in rows {
        let Some(code) = row.field(CODE_ALIASES) else {
            summary.skipped += 1;
            continue;
        };
        let record = CodeRecord {
            code,
            valid: row.field(VALID_ALIASES).map_or(true, |v| is_truthy(&v)),
            used: row.field(USED_ALIASES).is_some_and(|v| is_truthy(&v)),
            last_used: row
                .field(LAST_USED_ALIASES)
                .and_then(|v| parse_last_used(&v)),
            used_by: row.field(USED_BY_ALIASES),
        };
        match store.upsert(&record).await {
            Ok(()) => summary.upserted += 1,
            Err(e) => {
                tracing::warn!(row = row.row, "failed to upsert code row: {}", e);
                summary.skipped += 1;
            }
        }
    }
    tracing::info!(
        sheet,
        upserted = summary.upserted,
        skipped = summary.skipped,
        "code sync finished"
    );
    Ok(summary)
}

/// Truthy rule for hand-typed ledger booleans.
fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_uppercase().as_str(),
        "TRUE" | "1" | "YES" | "Y"
    )
}

/// Lenient timestamp parse: the issuance format first, RFC 3339 second,
/// anything else reads as never-used.
fn parse_last_used(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use crate::mocks::{MockCodeStore, MockLedger, MockParticipantStore};
    use chrono::TimeZone;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(ToString::to_string).collect())
            .collect()
    }

    #[test]
    fn test_truthy_rule() {
        for value in ["TRUE", "true", " 1 ", "YES", "y"] {
            assert!(is_truthy(value), "{value} should be truthy");
        }
        for value in ["FALSE", "", "0", "no", "maybe"] {
            assert!(!is_truthy(value), "{value} should be falsy");
        }
    }

    #[test]
    fn test_lenient_timestamp_parse() {
        let expected = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
        assert_eq!(parse_last_used("2025-06-01 10:00:00"), Some(expected));
        assert_eq!(parse_last_used("2025-06-01T10:00:00Z"), Some(expected));
        assert_eq!(parse_last_used("yesterday-ish"), None);
        assert_eq!(parse_last_used(""), None);
    }

    #[tokio::test]
    async fn test_sync_participants_resolves_aliases() {
        let ledger = MockLedger::new().with_sheet(
            "Peserta",
            grid(&[
                &["Nama Peserta", "Email", "Nomor HP", "Status", "Kode Unik", "Waktu Kirim"],
                &["Alice", "alice@example.com", "0812", "paid", "", ""],
                &["", "", "", "", "", ""],
                &["Bob", "bob@example.com", "", "PAID", "OLDCODE1", "2025-05-01 09:00:00"],
            ]),
        );
        let store = MockParticipantStore::new();

        let summary = sync_participants(&store, &ledger, "Peserta").await.unwrap();
        assert_eq!(summary, SyncSummary { upserted: 2, skipped: 1 });

        let rows = store.list_participants().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].status, "PAID");
        assert_eq!(rows[0].sheet_row, Some(2));
        assert_eq!(rows[1].code.as_deref(), Some("OLDCODE1"));
        assert_eq!(rows[1].sheet_row, Some(4));
    }

    #[tokio::test]
    async fn test_sync_never_clears_an_issued_code() {
        let store = MockParticipantStore::new();
        store
            .upsert_participant(&ParticipantUpsert {
                name: "Cara".to_string(),
                email: "cara@example.com".to_string(),
                status: "PAID".to_string(),
                code: Some("ISSUED01".to_string()),
                sent_at: Some("2025-05-01 09:00:00".to_string()),
                ..ParticipantUpsert::default()
            })
            .await
            .unwrap();

        // The ledger cell was wiped by hand; the local copy survives.
        let ledger = MockLedger::new().with_sheet(
            "Peserta",
            grid(&[
                &["Nama Peserta", "Email", "Status", "Kode Unik"],
                &["Cara", "cara@example.com", "PAID", ""],
            ]),
        );
        sync_participants(&store, &ledger, "Peserta").await.unwrap();

        let row = store.find_by_code("ISSUED01").await.unwrap().unwrap();
        assert_eq!(row.email, "cara@example.com");
    }

    #[tokio::test]
    async fn test_sync_codes_parses_booleans_and_timestamps() {
        let ledger = MockLedger::new().with_sheet(
            "Codes",
            grid(&[
                &["Kode", "Valid", "Used", "LastUsed", "UsedBy"],
                &["ABC123", "TRUE", "FALSE", "", ""],
                &["DEF456", "", "yes", "2025-06-01 10:00:00", "gate-1"],
                &["", "TRUE", "", "", ""],
                &["GHI789", "no", "1", "not-a-date", ""],
            ]),
        );
        let store = MockCodeStore::new();

        let summary = sync_codes(&store, &ledger, "Codes").await.unwrap();
        assert_eq!(summary, SyncSummary { upserted: 3, skipped: 1 });

        let abc = store.get("ABC123").await.unwrap().unwrap();
        assert!(abc.valid && !abc.used);

        let def = store.get("DEF456").await.unwrap().unwrap();
        assert!(def.valid && def.used);
        assert_eq!(
            def.last_used,
            Some(Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap())
        );
        assert_eq!(def.used_by.as_deref(), Some("gate-1"));

        let ghi = store.get("GHI789").await.unwrap().unwrap();
        assert!(!ghi.valid && ghi.used);
        assert_eq!(ghi.last_used, None);
    }

    #[tokio::test]
    async fn test_missing_codes_sheet_reads_as_empty() {
        let ledger = MockLedger::new();
        let store = MockCodeStore::new();

        let summary = sync_codes(&store, &ledger, "Codes").await.unwrap();
        assert_eq!(summary, SyncSummary::default());
    }

    #[tokio::test]
    async fn test_missing_participant_sheet_is_an_error() {
        let ledger = MockLedger::new();
        let store = MockParticipantStore::new();

        let err = sync_participants(&store, &ledger, "Peserta").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
