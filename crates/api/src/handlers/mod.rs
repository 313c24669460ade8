pub mod auth;
pub mod departments;
pub mod employees;
pub mod feedback;
pub mod sheets;
pub mod users;

use serde::Serialize;

/// `{ "message": ... }` body for operations that return nothing else.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Trim a required text field, rejecting it when missing or blank.
pub(crate) fn required_text(
    field: &str,
    value: Option<&str>,
) -> Result<String, feedfort_core::error::CoreError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            feedfort_core::error::CoreError::Validation(format!("Field '{field}' is required"))
        })
}
