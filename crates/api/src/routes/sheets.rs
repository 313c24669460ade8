use axum::routing::{get, post};
use axum::Router;

use crate::handlers::sheets;
use crate::state::AppState;

/// ```text
/// POST   /google-sheets-sync      -> sync
/// GET    /google-sheets/config    -> get_config
/// POST   /google-sheets/config    -> set_config
/// POST   /google-sheets/create    -> create_spreadsheet
/// POST   /google-sheets/test      -> test_connection
/// GET    /google-sheets/status    -> status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/google-sheets-sync", post(sheets::sync))
        .route(
            "/google-sheets/config",
            get(sheets::get_config).post(sheets::set_config),
        )
        .route("/google-sheets/create", post(sheets::create_spreadsheet))
        .route("/google-sheets/test", post(sheets::test_connection))
        .route("/google-sheets/status", get(sheets::status))
}
