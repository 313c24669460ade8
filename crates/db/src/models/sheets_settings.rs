//! Persisted export target.

use serde::Serialize;
use sqlx::FromRow;
use feedfort_core::types::Timestamp;

/// The single row of `sheets_settings`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SheetsSettings {
    pub spreadsheet_id: Option<String>,
    pub updated_at: Timestamp,
}
