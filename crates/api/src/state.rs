use std::sync::Arc;

use feedfort_sheets::SheetsExporter;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is behind `Arc` or already `Clone`.
#[derive(Clone)]
pub struct AppState {
    pub pool: feedfort_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Spreadsheet export, constructed once at start-up.
    pub exporter: Arc<SheetsExporter>,
}
