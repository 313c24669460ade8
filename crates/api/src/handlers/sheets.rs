//! Handlers for the Google Sheets export.
//!
//! Syncing and status are open to any authenticated user. Configuring,
//! creating and testing the target spreadsheet require an admin.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use feedfort_core::error::CoreError;
use feedfort_core::export::{spreadsheet_url, DEFAULT_SPREADSHEET_TITLE};
use feedfort_core::types::DbId;
use feedfort_sheets::exporter::ExportStatus;
use feedfort_sheets::SheetsError;
use serde::{Deserialize, Serialize};

use super::required_text;
use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct SyncRequest {
    /// Sync just this record; all unsynced records when absent.
    pub feedback_id: Option<DbId>,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<usize>,
    pub spreadsheet_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub spreadsheet_id: Option<String>,
    pub spreadsheet_url: Option<String>,
    pub credentials_file: String,
    /// Whether an access token can currently be obtained.
    pub authenticated: bool,
}

#[derive(Debug, Deserialize)]
pub struct ConfigRequest {
    pub spreadsheet_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateSpreadsheetRequest {
    pub title: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SpreadsheetResponse {
    pub message: String,
    pub spreadsheet_id: String,
    pub spreadsheet_url: String,
}

/// Configuration problems are the caller's to fix; storage failures are not.
fn config_error(err: SheetsError) -> AppError {
    match err {
        SheetsError::Database(db) => AppError::Database(db),
        other => {
            tracing::warn!(error = %other, "Spreadsheet not reachable");
            AppError::BadRequest(format!("Could not access spreadsheet: {other}"))
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/google-sheets-sync
pub async fn sync(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Option<AppJson<SyncRequest>>,
) -> AppResult<Json<SyncResponse>> {
    let input = body.map(|AppJson(input)| input).unwrap_or_default();
    let exporter = &state.exporter;

    let response = match input.feedback_id {
        Some(feedback_id) => {
            exporter.sync_one(feedback_id).await?;
            SyncResponse {
                message: "Feedback synchronized successfully".into(),
                success_count: None,
                total_count: None,
                spreadsheet_url: exporter.spreadsheet_url().await?,
            }
        }
        None => {
            let summary = exporter.sync_all().await?;
            SyncResponse {
                message: format!(
                    "{} of {} feedbacks synchronized",
                    summary.success_count, summary.total_count
                ),
                success_count: Some(summary.success_count),
                total_count: Some(summary.total_count),
                spreadsheet_url: exporter.spreadsheet_url().await?,
            }
        }
    };

    tracing::info!(user_id = auth.user_id, feedback_id = ?input.feedback_id, "Export requested");
    Ok(Json(response))
}

/// GET /api/google-sheets/config
pub async fn get_config(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<ConfigResponse>> {
    let exporter = &state.exporter;
    let spreadsheet_id = exporter.spreadsheet_id().await?;
    Ok(Json(ConfigResponse {
        spreadsheet_url: spreadsheet_id.as_deref().map(spreadsheet_url),
        spreadsheet_id,
        credentials_file: exporter.credentials_file().to_string(),
        authenticated: exporter.is_authenticated().await,
    }))
}

/// POST /api/google-sheets/config
///
/// Store the target spreadsheet, then check it can be reached.
pub async fn set_config(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    AppJson(input): AppJson<ConfigRequest>,
) -> AppResult<Json<SpreadsheetResponse>> {
    let spreadsheet_id = required_text("spreadsheet_id", input.spreadsheet_id.as_deref())?;
    state
        .exporter
        .configure(&spreadsheet_id)
        .await
        .map_err(config_error)?;

    tracing::info!(spreadsheet_id = %spreadsheet_id, user_id = admin.user_id, "Spreadsheet configured");
    Ok(Json(SpreadsheetResponse {
        message: "Spreadsheet configured successfully".into(),
        spreadsheet_url: spreadsheet_url(&spreadsheet_id),
        spreadsheet_id,
    }))
}

/// POST /api/google-sheets/create
pub async fn create_spreadsheet(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    body: Option<AppJson<CreateSpreadsheetRequest>>,
) -> AppResult<(StatusCode, Json<SpreadsheetResponse>)> {
    let input = body.map(|AppJson(input)| input).unwrap_or_default();
    let title = input
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_SPREADSHEET_TITLE);

    let spreadsheet_id = state.exporter.create_spreadsheet(title).await?;
    Ok((
        StatusCode::CREATED,
        Json(SpreadsheetResponse {
            message: "Spreadsheet created successfully".into(),
            spreadsheet_url: spreadsheet_url(&spreadsheet_id),
            spreadsheet_id,
        }),
    ))
}

/// POST /api/google-sheets/test
pub async fn test_connection(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<SpreadsheetResponse>> {
    let exporter = &state.exporter;
    let spreadsheet_id = exporter
        .spreadsheet_id()
        .await?
        .ok_or_else(|| CoreError::Validation("No spreadsheet configured".into()))?;
    exporter.test_connection().await.map_err(config_error)?;

    Ok(Json(SpreadsheetResponse {
        message: "Connection to the spreadsheet is working".into(),
        spreadsheet_url: spreadsheet_url(&spreadsheet_id),
        spreadsheet_id,
    }))
}

/// GET /api/google-sheets/status
pub async fn status(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> AppResult<Json<ExportStatus>> {
    Ok(Json(state.exporter.status().await?))
}
