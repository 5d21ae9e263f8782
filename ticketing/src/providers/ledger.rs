//! External ledger provider trait.
//!
//! Abstracts the spreadsheet-like ledger the event team works in. The
//! system only needs five operations: read a whole sheet, append a row,
//! create a sheet with a header, overwrite one cell, and find a row by
//! value. Everything richer stays on the other side of this seam.

use crate::error::Result;
use std::collections::HashMap;

/// One data row read from a ledger sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRow {
    /// 1-based row position in the sheet. The header is row 1, so data
    /// rows start at 2.
    pub row: u32,
    /// Cell values keyed by header title. Blank cells may be absent.
    pub fields: HashMap<String, String>,
}

impl LedgerRow {
    /// Returns the first non-empty cell matching any of the given header
    /// aliases, trimmed.
    #[must_use]
    pub fn field(&self, aliases: &[&str]) -> Option<String> {
        aliases
            .iter()
            .filter_map(|alias| self.fields.get(*alias))
            .map(|value| value.trim())
            .find(|value| !value.is_empty())
            .map(ToString::to_string)
    }
}

/// Spreadsheet-like external ledger.
///
/// Implementations are best-effort collaborators: the local store stays
/// authoritative, and callers tolerate per-call failures by logging and
/// moving on.
pub trait Ledger: Send + Sync {
    /// Read all data rows of a sheet, header row excluded.
    ///
    /// # Errors
    ///
    /// Returns `SheetNotFound` when the sheet does not exist, or `Ledger`
    /// for transport and API failures.
    fn read_rows(
        &self,
        sheet: &str,
    ) -> impl std::future::Future<Output = Result<Vec<LedgerRow>>> + Send;

    /// Append one row after the last non-empty row of a sheet.
    ///
    /// # Errors
    ///
    /// Returns `SheetNotFound` when the sheet does not exist, or `Ledger`
    /// for transport and API failures.
    fn append_row(
        &self,
        sheet: &str,
        values: &[String],
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Create a sheet and write its header row.
    ///
    /// Creating a sheet that already exists is not an error.
    ///
    /// # Errors
    ///
    /// Returns `Ledger` for transport and API failures.
    fn create_sheet(
        &self,
        sheet: &str,
        header: &[String],
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Overwrite one cell (1-based row and column).
    ///
    /// # Errors
    ///
    /// Returns `SheetNotFound` when the sheet does not exist, or `Ledger`
    /// for transport and API failures.
    fn update_cell(
        &self,
        sheet: &str,
        row: u32,
        col: u32,
        value: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Find the first row with a cell exactly equal to `query`.
    ///
    /// # Returns
    ///
    /// The 1-based row position, or `None` when no cell matches.
    ///
    /// # Errors
    ///
    /// Returns `SheetNotFound` when the sheet does not exist, or `Ledger`
    /// for transport and API failures.
    fn find_row(
        &self,
        sheet: &str,
        query: &str,
    ) -> impl std::future::Future<Output = Result<Option<u32>>> + Send;
}
