//! Repository for the single-row `sheets_settings` table.

use sqlx::PgPool;

use crate::models::sheets_settings::SheetsSettings;

pub struct SheetsSettingsRepo;

impl SheetsSettingsRepo {
    /// Read the settings row, creating it from `default_spreadsheet_id` on
    /// first access.
    pub async fn get_or_init(
        pool: &PgPool,
        default_spreadsheet_id: Option<&str>,
    ) -> Result<SheetsSettings, sqlx::Error> {
        sqlx::query(
            "INSERT INTO sheets_settings (id, spreadsheet_id) VALUES (1, $1)
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(default_spreadsheet_id.filter(|s| !s.is_empty()))
        .execute(pool)
        .await?;

        sqlx::query_as::<_, SheetsSettings>(
            "SELECT spreadsheet_id, updated_at FROM sheets_settings WHERE id = 1",
        )
        .fetch_one(pool)
        .await
    }

    /// Point the export at a different spreadsheet.
    pub async fn set_spreadsheet_id(
        pool: &PgPool,
        spreadsheet_id: &str,
    ) -> Result<SheetsSettings, sqlx::Error> {
        sqlx::query_as::<_, SheetsSettings>(
            "INSERT INTO sheets_settings (id, spreadsheet_id) VALUES (1, $1)
             ON CONFLICT (id) DO UPDATE SET spreadsheet_id = EXCLUDED.spreadsheet_id
             RETURNING spreadsheet_id, updated_at",
        )
        .bind(spreadsheet_id)
        .fetch_one(pool)
        .await
    }
}
