use feedfort_core::types::DbId;

/// Errors from the spreadsheet export layer.
#[derive(Debug, thiserror::Error)]
pub enum SheetsError {
    /// The service-account credential file is missing or unreadable.
    #[error("Failed to load credentials from {path}: {message}")]
    Credentials { path: String, message: String },

    /// Signing the assertion or exchanging it for an access token failed.
    #[error("Google authentication failed: {0}")]
    Auth(String),

    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Google returned a non-2xx status code.
    #[error("Google Sheets API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("No spreadsheet configured")]
    NotConfigured,

    /// The id column holds the same feedback id more than once.
    #[error("Feedback {id} appears in {count} rows of the export sheet")]
    AmbiguousRow { id: DbId, count: usize },

    #[error("Unexpected response from Google Sheets: {0}")]
    MalformedResponse(String),

    #[error("Feedback {0} not found")]
    FeedbackNotFound(DbId),

    /// The record was edited or deleted after it was read for export.
    #[error("Feedback {0} changed while it was being exported")]
    ChangedDuringExport(DbId),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
