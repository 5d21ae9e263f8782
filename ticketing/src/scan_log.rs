//! Append-only scan audit log.
//!
//! One line per verification attempt, in the shape
//! `[2025-06-01 19:02:11] TOKEN - ok`. The log is advisory: admission
//! decisions come from the code store, and a write failure here must
//! never turn a valid ticket away.

use crate::error::Result;
use crate::records::ScanStatus;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Plain-text audit trail of scans.
#[derive(Debug, Clone)]
pub struct ScanLog {
    path: PathBuf,
}

impl ScanLog {
    /// Creates a log handle for the given file path. The file itself is
    /// created on first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The log file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one scan line.
    ///
    /// # Errors
    ///
    /// Returns `Io` when the file cannot be opened or written.
    pub async fn append(&self, at: DateTime<Utc>, token: &str, status: ScanStatus) -> Result<()> {
        let line = format!("[{}] {token} - {status}\n", at.format("%Y-%m-%d %H:%M:%S"));
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        Ok(())
    }

    /// Returns the last `n` log lines, oldest first. A log that does not
    /// exist yet reads as empty.
    ///
    /// # Errors
    ///
    /// Returns `Io` when the file exists but cannot be read.
    pub async fn tail(&self, n: usize) -> Result<Vec<String>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let lines: Vec<String> = contents.lines().map(ToString::to_string).collect();
        let start = lines.len().saturating_sub(n);
        Ok(lines[start..].to_vec())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use crate::token::generate_token;
    use chrono::TimeZone;

    fn temp_log() -> ScanLog {
        let path = std::env::temp_dir().join(format!("scan_log_{}.txt", generate_token(8)));
        ScanLog::new(path)
    }

    #[tokio::test]
    async fn test_append_writes_formatted_lines() {
        let log = temp_log();
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 19, 2, 11).unwrap();

        log.append(at, "ABC123", ScanStatus::Ok).await.unwrap();
        log.append(at, "ABC123", ScanStatus::Used).await.unwrap();

        let lines = log.tail(10).await.unwrap();
        assert_eq!(
            lines,
            vec![
                "[2025-06-01 19:02:11] ABC123 - ok".to_string(),
                "[2025-06-01 19:02:11] ABC123 - used".to_string(),
            ]
        );

        tokio::fs::remove_file(log.path()).await.unwrap();
    }

    #[tokio::test]
    async fn test_tail_keeps_only_the_newest_lines() {
        let log = temp_log();
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();
        for i in 0..5 {
            log.append(at, &format!("TOK{i}"), ScanStatus::Invalid)
                .await
                .unwrap();
        }

        let lines = log.tail(2).await.unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("TOK3"));
        assert!(lines[1].contains("TOK4"));

        tokio::fs::remove_file(log.path()).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_log_reads_as_empty() {
        let log = temp_log();
        assert!(log.tail(20).await.unwrap().is_empty());
    }
}
