//! Google Sheets ledger implementation.

use crate::error::{Result, TicketingError};
use crate::providers::ledger::{Ledger, LedgerRow};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

/// Spreadsheet ledger backed by the Google Sheets v4 REST API.
///
/// Authenticates with a pre-acquired OAuth 2.0 bearer token; acquiring and
/// refreshing that token is the operator's concern, not this crate's.
///
/// # Example
///
/// ```no_run
/// use gatekeeper_ticketing::providers::SheetsLedger;
///
/// let ledger = SheetsLedger::new(
///     "1BxiMVs0XRA5nFMdKvBdBZjgmUUqptlbs74OgvE2upms".to_string(),
///     std::env::var("SHEETS_ACCESS_TOKEN").unwrap_or_default(),
/// );
/// ```
#[derive(Clone, Debug)]
pub struct SheetsLedger {
    /// Spreadsheet id from the sheet URL.
    spreadsheet_id: String,

    /// OAuth 2.0 bearer token with spreadsheet scope.
    access_token: String,

    http_client: Client,

    /// API endpoint base, overridable for tests.
    base_url: String,
}

impl SheetsLedger {
    /// Creates a ledger client for one spreadsheet.
    #[must_use]
    pub fn new(spreadsheet_id: String, access_token: String) -> Self {
        Self {
            spreadsheet_id,
            access_token,
            http_client: Client::new(),
            base_url: "https://sheets.googleapis.com/v4/spreadsheets".to_string(),
        }
    }

    /// Points the client at a different API endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/{}/values/{}",
            self.base_url,
            self.spreadsheet_id,
            urlencoding::encode(range)
        )
    }

    /// Fetches the raw cell grid of a sheet, header row included.
    async fn fetch_grid(&self, sheet: &str) -> Result<Vec<Vec<String>>> {
        let response = self
            .http_client
            .get(self.values_url(&quote_title(sheet)))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| TicketingError::Ledger(e.to_string()))?;

        if !response.status().is_success() {
            return Err(api_error(sheet, response).await);
        }

        let range: ValueRange = response
            .json()
            .await
            .map_err(|e| TicketingError::Ledger(e.to_string()))?;
        Ok(range.values)
    }
}

impl Ledger for SheetsLedger {
    async fn read_rows(&self, sheet: &str) -> Result<Vec<LedgerRow>> {
        let grid = self.fetch_grid(sheet).await?;
        let Some((header, data)) = grid.split_first() else {
            return Ok(Vec::new());
        };

        let rows = data
            .iter()
            .enumerate()
            .map(|(idx, cells)| {
                let fields: HashMap<String, String> = header
                    .iter()
                    .zip(cells.iter())
                    .map(|(title, cell)| (title.clone(), cell.clone()))
                    .collect();
                LedgerRow {
                    // Header occupies row 1, so the first data row is 2
                    row: u32::try_from(idx).unwrap_or(u32::MAX).saturating_add(2),
                    fields,
                }
            })
            .collect();
        Ok(rows)
    }

    async fn append_row(&self, sheet: &str, values: &[String]) -> Result<()> {
        let url = format!("{}:append", self.values_url(&quote_title(sheet)));
        let response = self
            .http_client
            .post(url)
            .bearer_auth(&self.access_token)
            .query(&[("valueInputOption", "RAW")])
            .json(&serde_json::json!({ "values": [values] }))
            .send()
            .await
            .map_err(|e| TicketingError::Ledger(e.to_string()))?;

        if !response.status().is_success() {
            return Err(api_error(sheet, response).await);
        }
        Ok(())
    }

    async fn create_sheet(&self, sheet: &str, header: &[String]) -> Result<()> {
        let url = format!("{}/{}:batchUpdate", self.base_url, self.spreadsheet_id);
        let body = serde_json::json!({
            "requests": [{ "addSheet": { "properties": { "title": sheet } } }]
        });
        let response = self
            .http_client
            .post(url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| TicketingError::Ledger(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            // Re-creating an existing sheet is fine; its header is left alone
            if error_body.contains("already exists") {
                return Ok(());
            }
            tracing::error!(%status, "Sheets addSheet failed: {}", error_body);
            return Err(TicketingError::Ledger(format!(
                "Sheets API returned {status}"
            )));
        }

        let range = format!("{}!A1", quote_title(sheet));
        let response = self
            .http_client
            .put(self.values_url(&range))
            .bearer_auth(&self.access_token)
            .query(&[("valueInputOption", "RAW")])
            .json(&serde_json::json!({ "values": [header] }))
            .send()
            .await
            .map_err(|e| TicketingError::Ledger(e.to_string()))?;

        if !response.status().is_success() {
            return Err(api_error(sheet, response).await);
        }
        Ok(())
    }

    async fn update_cell(&self, sheet: &str, row: u32, col: u32, value: &str) -> Result<()> {
        let range = format!("{}!{}{}", quote_title(sheet), column_letter(col), row);
        let response = self
            .http_client
            .put(self.values_url(&range))
            .bearer_auth(&self.access_token)
            .query(&[("valueInputOption", "RAW")])
            .json(&serde_json::json!({ "values": [[value]] }))
            .send()
            .await
            .map_err(|e| TicketingError::Ledger(e.to_string()))?;

        if !response.status().is_success() {
            return Err(api_error(sheet, response).await);
        }
        Ok(())
    }

    async fn find_row(&self, sheet: &str, query: &str) -> Result<Option<u32>> {
        let grid = self.fetch_grid(sheet).await?;
        for (idx, cells) in grid.iter().enumerate() {
            if cells.iter().any(|cell| cell == query) {
                return Ok(Some(u32::try_from(idx).unwrap_or(u32::MAX).saturating_add(1)));
            }
        }
        Ok(None)
    }
}

/// Sheets `values` responses; `values` is absent for an empty sheet.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Maps a failed API response onto the error taxonomy.
///
/// The API answers 400 "Unable to parse range" when a range names a sheet
/// that does not exist, which is the `SheetNotFound` case callers branch on.
async fn api_error(sheet: &str, response: reqwest::Response) -> TicketingError {
    let status = response.status();
    let error_body = response.text().await.unwrap_or_default();
    if status == reqwest::StatusCode::BAD_REQUEST && error_body.contains("Unable to parse range") {
        return TicketingError::SheetNotFound {
            sheet: sheet.to_string(),
        };
    }
    tracing::error!(%status, "Sheets API request failed: {}", error_body);
    TicketingError::Ledger(format!("Sheets API returned {status}"))
}

/// Quotes a sheet title for A1 notation.
fn quote_title(sheet: &str) -> String {
    format!("'{}'", sheet.replace('\'', "''"))
}

/// Converts a 1-based column number to its A1 letter form.
fn column_letter(mut col: u32) -> String {
    let mut letters = Vec::new();
    while col > 0 {
        let rem = u8::try_from((col - 1) % 26).unwrap_or(0);
        letters.push(b'A' + rem);
        col = (col - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letter(1), "A");
        assert_eq!(column_letter(5), "E");
        assert_eq!(column_letter(6), "F");
        assert_eq!(column_letter(26), "Z");
        assert_eq!(column_letter(27), "AA");
        assert_eq!(column_letter(52), "AZ");
    }

    #[test]
    fn test_quoted_titles() {
        assert_eq!(quote_title("Peserta"), "'Peserta'");
        assert_eq!(quote_title("It's Codes"), "'It''s Codes'");
    }
}
