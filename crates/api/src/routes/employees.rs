use axum::routing::get;
use axum::Router;

use crate::handlers::employees;
use crate::state::AppState;

/// ```text
/// GET    /funcionarios        -> list
/// POST   /funcionarios        -> create
/// GET    /funcionarios/{id}   -> get_by_id
/// PUT    /funcionarios/{id}   -> update
/// DELETE /funcionarios/{id}   -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/funcionarios", get(employees::list).post(employees::create))
        .route(
            "/funcionarios/{id}",
            get(employees::get_by_id)
                .put(employees::update)
                .delete(employees::delete),
        )
}
