//! Mock ledger for testing.

use crate::error::{Result, TicketingError};
use crate::providers::{Ledger, LedgerRow};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Mock spreadsheet ledger.
///
/// Keeps per-sheet cell grids in memory, with row 0 of each grid playing
/// the header row. Set `should_succeed` to `false` to simulate transport
/// failures.
#[derive(Debug, Clone)]
pub struct MockLedger {
    grids: Arc<Mutex<HashMap<String, Vec<Vec<String>>>>>,
    /// Whether ledger calls should succeed.
    pub should_succeed: bool,
}

impl MockLedger {
    /// Create a new mock ledger with no sheets.
    #[must_use]
    pub fn new() -> Self {
        Self {
            grids: Arc::new(Mutex::new(HashMap::new())),
            should_succeed: true,
        }
    }

    /// Seed a sheet with a full grid, header row first.
    #[must_use]
    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    pub fn with_sheet(self, name: &str, grid: Vec<Vec<String>>) -> Self {
        self.grids.lock().unwrap().insert(name.to_string(), grid);
        self
    }

    /// Get a sheet's grid (for testing).
    #[must_use]
    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    pub fn sheet(&self, name: &str) -> Option<Vec<Vec<String>>> {
        self.grids.lock().unwrap().get(name).cloned()
    }

    fn check_transport(&self) -> Result<()> {
        if self.should_succeed {
            Ok(())
        } else {
            Err(TicketingError::Ledger("mock ledger failure".to_string()))
        }
    }
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger for MockLedger {
    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    async fn read_rows(&self, sheet: &str) -> Result<Vec<LedgerRow>> {
        self.check_transport()?;
        let grids = self.grids.lock().unwrap();
        let grid = grids.get(sheet).ok_or_else(|| TicketingError::SheetNotFound {
            sheet: sheet.to_string(),
        })?;
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
                    row: u32::try_from(idx).unwrap_or(u32::MAX).saturating_add(2),
                    fields,
                }
            })
            .collect();
        Ok(rows)
    }

    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    async fn append_row(&self, sheet: &str, values: &[String]) -> Result<()> {
        self.check_transport()?;
        let mut grids = self.grids.lock().unwrap();
        let grid = grids.get_mut(sheet).ok_or_else(|| TicketingError::SheetNotFound {
            sheet: sheet.to_string(),
        })?;
        grid.push(values.to_vec());
        Ok(())
    }

    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    async fn create_sheet(&self, sheet: &str, header: &[String]) -> Result<()> {
        self.check_transport()?;
        let mut grids = self.grids.lock().unwrap();
        grids
            .entry(sheet.to_string())
            .or_insert_with(|| vec![header.to_vec()]);
        Ok(())
    }

    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    async fn update_cell(&self, sheet: &str, row: u32, col: u32, value: &str) -> Result<()> {
        self.check_transport()?;
        let mut grids = self.grids.lock().unwrap();
        let grid = grids.get_mut(sheet).ok_or_else(|| TicketingError::SheetNotFound {
            sheet: sheet.to_string(),
        })?;
        let row_idx = row.saturating_sub(1) as usize;
        let col_idx = col.saturating_sub(1) as usize;
        while grid.len() <= row_idx {
            grid.push(Vec::new());
        }
        let cells = &mut grid[row_idx];
        while cells.len() <= col_idx {
            cells.push(String::new());
        }
        cells[col_idx] = value.to_string();
        Ok(())
    }

    #[allow(clippy::unwrap_used)] // Test mock: mutex poisoning is a test failure
    async fn find_row(&self, sheet: &str, query: &str) -> Result<Option<u32>> {
        self.check_transport()?;
        let grids = self.grids.lock().unwrap();
        let grid = grids.get(sheet).ok_or_else(|| TicketingError::SheetNotFound {
            sheet: sheet.to_string(),
        })?;
        let found = grid.iter().enumerate().find_map(|(idx, cells)| {
            cells
                .iter()
                .any(|cell| cell == query)
                .then_some(u32::try_from(idx).unwrap_or(u32::MAX).saturating_add(1))
        });
        Ok(found)
    }
}
