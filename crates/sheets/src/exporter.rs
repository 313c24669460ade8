//! Export synchronizer.
//!
//! Pushes feedback records into the `Feedbacks` worksheet, one row per
//! record keyed by its id in column A. Each sync first reconciles the
//! header row against the current union of department attributes.
//! Synchronization is always caller-triggered.

use std::sync::Arc;

use serde::Serialize;
use sqlx::PgPool;
use feedfort_core::export::{
    attribute_union, build_row, header_row, spreadsheet_url, WORKSHEET_TITLE,
};
use feedfort_core::types::DbId;
use feedfort_db::models::feedback::SyncCounts;
use feedfort_db::repositories::{DepartmentRepo, FeedbackRepo, SheetsSettingsRepo};

use crate::error::SheetsError;
use crate::store::{reconcile_header, upsert_row, SheetStore};

/// Result of a batch sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub success_count: usize,
    pub total_count: usize,
}

/// Export progress plus where the rows go.
#[derive(Debug, Clone, Serialize)]
pub struct ExportStatus {
    #[serde(flatten)]
    pub counts: SyncCounts,
    pub spreadsheet_url: Option<String>,
}

/// Drives exports through an injected [`SheetStore`].
///
/// Built once at start-up and shared through the application state; it
/// holds no mutable state of its own.
pub struct SheetsExporter {
    pool: PgPool,
    store: Arc<dyn SheetStore>,
    credentials_file: String,
    default_spreadsheet_id: Option<String>,
}

impl SheetsExporter {
    pub fn new(
        pool: PgPool,
        store: Arc<dyn SheetStore>,
        credentials_file: impl Into<String>,
        default_spreadsheet_id: Option<String>,
    ) -> Self {
        Self {
            pool,
            store,
            credentials_file: credentials_file.into(),
            default_spreadsheet_id: default_spreadsheet_id.filter(|s| !s.is_empty()),
        }
    }

    pub fn credentials_file(&self) -> &str {
        &self.credentials_file
    }

    /// The configured spreadsheet id, if any.
    pub async fn spreadsheet_id(&self) -> Result<Option<String>, SheetsError> {
        let settings =
            SheetsSettingsRepo::get_or_init(&self.pool, self.default_spreadsheet_id.as_deref())
                .await?;
        Ok(settings.spreadsheet_id.filter(|s| !s.is_empty()))
    }

    pub async fn spreadsheet_url(&self) -> Result<Option<String>, SheetsError> {
        Ok(self.spreadsheet_id().await?.map(|id| spreadsheet_url(&id)))
    }

    async fn require_spreadsheet_id(&self) -> Result<String, SheetsError> {
        self.spreadsheet_id().await?.ok_or(SheetsError::NotConfigured)
    }

    /// Whether the credentials currently yield an access token.
    pub async fn is_authenticated(&self) -> bool {
        self.store.authenticate().await.is_ok()
    }

    /// Current attribute union, with the header row reconciled against it.
    async fn prepare(&self, spreadsheet_id: &str) -> Result<Vec<String>, SheetsError> {
        let lists = DepartmentRepo::all_attribute_lists(&self.pool).await?;
        let attributes = attribute_union(lists.iter().map(Vec::as_slice));
        let headers = header_row(&attributes);
        if reconcile_header(self.store.as_ref(), spreadsheet_id, WORKSHEET_TITLE, &headers).await? {
            tracing::info!(spreadsheet_id, columns = headers.len(), "Export header updated");
        }
        Ok(attributes)
    }

    /// Export one record, overwriting its existing row if there is one.
    ///
    /// On success the record is marked synced. On failure its sync state
    /// is left as it was.
    pub async fn sync_one(&self, feedback_id: DbId) -> Result<(), SheetsError> {
        let spreadsheet_id = self.require_spreadsheet_id().await?;
        let attributes = self.prepare(&spreadsheet_id).await?;

        let feedback = FeedbackRepo::find_by_id(&self.pool, feedback_id)
            .await?
            .ok_or(SheetsError::FeedbackNotFound(feedback_id))?;
        let record = feedback.export_record().ok_or_else(|| {
            SheetsError::MalformedResponse(format!(
                "feedback {feedback_id} has unknown type '{}'",
                feedback.tipo
            ))
        })?;
        let row = build_row(&record, &attributes);

        upsert_row(
            self.store.as_ref(),
            &spreadsheet_id,
            WORKSHEET_TITLE,
            feedback_id,
            &row,
        )
        .await?;
        if !FeedbackRepo::mark_synced(&self.pool, feedback_id, feedback.updated_at).await? {
            return Err(SheetsError::ChangedDuringExport(feedback_id));
        }

        tracing::info!(feedback_id, "Feedback exported");
        Ok(())
    }

    /// Export every unsynced record. One record failing does not stop the
    /// rest; the summary reports how many succeeded.
    pub async fn sync_all(&self) -> Result<SyncSummary, SheetsError> {
        let ids = FeedbackRepo::unsynced_ids(&self.pool).await?;
        let mut summary = SyncSummary {
            success_count: 0,
            total_count: ids.len(),
        };
        for id in ids {
            match self.sync_one(id).await {
                Ok(()) => summary.success_count += 1,
                Err(e) => tracing::warn!(feedback_id = id, error = %e, "Feedback export failed"),
            }
        }
        tracing::info!(
            success = summary.success_count,
            total = summary.total_count,
            "Batch export finished"
        );
        Ok(summary)
    }

    /// Persist a new target spreadsheet, then verify it is reachable.
    pub async fn configure(&self, spreadsheet_id: &str) -> Result<(), SheetsError> {
        SheetsSettingsRepo::set_spreadsheet_id(&self.pool, spreadsheet_id).await?;
        self.store.check_access(spreadsheet_id).await
    }

    /// Create a new spreadsheet, make it the target and lay out its header.
    pub async fn create_spreadsheet(&self, title: &str) -> Result<String, SheetsError> {
        let spreadsheet_id = self.store.create_spreadsheet(title, WORKSHEET_TITLE).await?;
        SheetsSettingsRepo::set_spreadsheet_id(&self.pool, &spreadsheet_id).await?;
        self.prepare(&spreadsheet_id).await?;
        tracing::info!(spreadsheet_id = %spreadsheet_id, "Spreadsheet created");
        Ok(spreadsheet_id)
    }

    /// Check credentials, and the configured spreadsheet when there is one.
    pub async fn test_connection(&self) -> Result<(), SheetsError> {
        self.store.authenticate().await?;
        if let Some(spreadsheet_id) = self.spreadsheet_id().await? {
            self.store.check_access(&spreadsheet_id).await?;
        }
        Ok(())
    }

    pub async fn status(&self) -> Result<ExportStatus, SheetsError> {
        Ok(ExportStatus {
            counts: FeedbackRepo::sync_counts(&self.pool).await?,
            spreadsheet_url: self.spreadsheet_url().await?,
        })
    }
}
