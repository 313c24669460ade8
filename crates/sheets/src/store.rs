//! The spreadsheet seam and the row-level sync steps built on it.

use async_trait::async_trait;
use serde_json::Value;
use feedfort_core::export::header_matches;
use feedfort_core::types::DbId;

use crate::error::SheetsError;

/// Minimal tabular store the exporter writes to.
///
/// Rows and columns are 1-based. Worksheets are addressed by title inside
/// a spreadsheet identified by its external id.
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// Confirm credentials work by obtaining an access token.
    async fn authenticate(&self) -> Result<(), SheetsError>;

    /// Confirm the spreadsheet exists and is reachable with our credentials.
    async fn check_access(&self, spreadsheet_id: &str) -> Result<(), SheetsError>;

    /// Create a spreadsheet with one worksheet named `worksheet`, returning
    /// its id.
    async fn create_spreadsheet(&self, title: &str, worksheet: &str)
        -> Result<String, SheetsError>;

    /// Create the worksheet if the spreadsheet lacks it.
    async fn ensure_worksheet(&self, spreadsheet_id: &str, worksheet: &str)
        -> Result<(), SheetsError>;

    /// Cell values of one row, as displayed. Missing rows read as empty.
    async fn read_row(
        &self,
        spreadsheet_id: &str,
        worksheet: &str,
        row: usize,
    ) -> Result<Vec<String>, SheetsError>;

    /// Cell values of one column from the top, as displayed.
    async fn read_column(
        &self,
        spreadsheet_id: &str,
        worksheet: &str,
        column: usize,
    ) -> Result<Vec<String>, SheetsError>;

    /// Overwrite one row starting at column A.
    async fn write_row(
        &self,
        spreadsheet_id: &str,
        worksheet: &str,
        row: usize,
        values: &[Value],
    ) -> Result<(), SheetsError>;

    /// Append a row after the last non-empty one.
    async fn append_row(
        &self,
        spreadsheet_id: &str,
        worksheet: &str,
        values: &[Value],
    ) -> Result<(), SheetsError>;
}

/// Text of a cell as the sheet would display it.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Locate the row holding `id` in the id column (column A, header
/// included). More than one match is an error.
pub fn find_row(id_column: &[String], id: DbId) -> Result<Option<usize>, SheetsError> {
    let needle = id.to_string();
    let matches: Vec<usize> = id_column
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, cell)| cell.trim() == needle)
        .map(|(i, _)| i + 1)
        .collect();
    match matches.as_slice() {
        [] => Ok(None),
        [row] => Ok(Some(*row)),
        _ => Err(SheetsError::AmbiguousRow {
            id,
            count: matches.len(),
        }),
    }
}

/// Write the header row unless it already matches. Returns `true` when
/// the header was (re)written.
pub async fn reconcile_header(
    store: &dyn SheetStore,
    spreadsheet_id: &str,
    worksheet: &str,
    expected: &[String],
) -> Result<bool, SheetsError> {
    store.ensure_worksheet(spreadsheet_id, worksheet).await?;
    let current = store.read_row(spreadsheet_id, worksheet, 1).await?;
    if header_matches(&current, expected) {
        return Ok(false);
    }
    let values: Vec<Value> = expected.iter().cloned().map(Value::String).collect();
    store.write_row(spreadsheet_id, worksheet, 1, &values).await?;
    Ok(true)
}

/// Overwrite the row for `id` if present, otherwise append it.
pub async fn upsert_row(
    store: &dyn SheetStore,
    spreadsheet_id: &str,
    worksheet: &str,
    id: DbId,
    values: &[Value],
) -> Result<(), SheetsError> {
    let ids = store.read_column(spreadsheet_id, worksheet, 1).await?;
    match find_row(&ids, id)? {
        Some(row) => {
            tracing::debug!(feedback_id = id, row, "Overwriting exported row");
            store.write_row(spreadsheet_id, worksheet, row, values).await
        }
        None => {
            tracing::debug!(feedback_id = id, "Appending exported row");
            store.append_row(spreadsheet_id, worksheet, values).await
        }
    }
}
