//! In-process [`SheetStore`] used by tests and local development.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::SheetsError;
use crate::store::{cell_text, SheetStore};

type Worksheets = HashMap<String, Vec<Vec<Value>>>;

/// Spreadsheets held in memory, keyed by id then worksheet title.
#[derive(Default)]
pub struct MemorySheetStore {
    spreadsheets: Mutex<HashMap<String, Worksheets>>,
    unavailable: AtomicBool,
    created: AtomicUsize,
}

impl MemorySheetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already contains an empty spreadsheet `id`.
    pub fn with_spreadsheet(id: &str) -> Self {
        let store = Self::default();
        store.lock().insert(id.to_string(), Worksheets::new());
        store
    }

    /// Simulate the remote service being unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Snapshot of a worksheet's rows.
    pub fn rows(&self, spreadsheet_id: &str, worksheet: &str) -> Vec<Vec<Value>> {
        self.lock()
            .get(spreadsheet_id)
            .and_then(|sheets| sheets.get(worksheet))
            .cloned()
            .unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Worksheets>> {
        // A poisoned lock only means a test panicked mid-write.
        self.spreadsheets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn reachable(&self) -> Result<(), SheetsError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(SheetsError::Api {
                status: 503,
                body: "service unavailable".to_string(),
            });
        }
        Ok(())
    }

    fn with_sheet<T>(
        &self,
        spreadsheet_id: &str,
        worksheet: &str,
        f: impl FnOnce(&mut Vec<Vec<Value>>) -> T,
    ) -> Result<T, SheetsError> {
        self.reachable()?;
        let mut all = self.lock();
        let sheets = all.get_mut(spreadsheet_id).ok_or_else(|| not_found(spreadsheet_id))?;
        let rows = sheets.get_mut(worksheet).ok_or_else(|| SheetsError::Api {
            status: 400,
            body: format!("Unable to parse range: '{worksheet}'"),
        })?;
        Ok(f(rows))
    }
}

fn not_found(spreadsheet_id: &str) -> SheetsError {
    SheetsError::Api {
        status: 404,
        body: format!("Requested entity was not found: {spreadsheet_id}"),
    }
}

#[async_trait]
impl SheetStore for MemorySheetStore {
    async fn authenticate(&self) -> Result<(), SheetsError> {
        self.reachable()
    }

    async fn check_access(&self, spreadsheet_id: &str) -> Result<(), SheetsError> {
        self.reachable()?;
        if self.lock().contains_key(spreadsheet_id) {
            Ok(())
        } else {
            Err(not_found(spreadsheet_id))
        }
    }

    async fn create_spreadsheet(
        &self,
        _title: &str,
        worksheet: &str,
    ) -> Result<String, SheetsError> {
        self.reachable()?;
        let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("memory-{n}");
        let mut sheets = Worksheets::new();
        sheets.insert(worksheet.to_string(), Vec::new());
        self.lock().insert(id.clone(), sheets);
        Ok(id)
    }

    async fn ensure_worksheet(
        &self,
        spreadsheet_id: &str,
        worksheet: &str,
    ) -> Result<(), SheetsError> {
        self.reachable()?;
        let mut all = self.lock();
        let sheets = all.get_mut(spreadsheet_id).ok_or_else(|| not_found(spreadsheet_id))?;
        sheets.entry(worksheet.to_string()).or_default();
        Ok(())
    }

    async fn read_row(
        &self,
        spreadsheet_id: &str,
        worksheet: &str,
        row: usize,
    ) -> Result<Vec<String>, SheetsError> {
        self.with_sheet(spreadsheet_id, worksheet, |rows| {
            row.checked_sub(1)
                .and_then(|i| rows.get(i))
                .map(|cells| cells.iter().map(cell_text).collect())
                .unwrap_or_default()
        })
    }

    async fn read_column(
        &self,
        spreadsheet_id: &str,
        worksheet: &str,
        column: usize,
    ) -> Result<Vec<String>, SheetsError> {
        self.with_sheet(spreadsheet_id, worksheet, |rows| {
            let index = column.saturating_sub(1);
            rows.iter()
                .map(|cells| cells.get(index).map(cell_text).unwrap_or_default())
                .collect()
        })
    }

    async fn write_row(
        &self,
        spreadsheet_id: &str,
        worksheet: &str,
        row: usize,
        values: &[Value],
    ) -> Result<(), SheetsError> {
        let index = row.checked_sub(1).ok_or_else(|| {
            SheetsError::MalformedResponse("row indices start at 1".to_string())
        })?;
        self.with_sheet(spreadsheet_id, worksheet, |rows| {
            if rows.len() <= index {
                rows.resize(index + 1, Vec::new());
            }
            rows[index] = values.to_vec();
        })
    }

    async fn append_row(
        &self,
        spreadsheet_id: &str,
        worksheet: &str,
        values: &[Value],
    ) -> Result<(), SheetsError> {
        self.with_sheet(spreadsheet_id, worksheet, |rows| rows.push(values.to_vec()))
    }
}
