use axum::routing::get;
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

/// ```text
/// GET    /usuarios        -> list
/// POST   /usuarios        -> create
/// GET    /usuarios/{id}   -> get_by_id
/// PUT    /usuarios/{id}   -> update
/// DELETE /usuarios/{id}   -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/usuarios", get(users::list).post(users::create))
        .route(
            "/usuarios/{id}",
            get(users::get_by_id)
                .put(users::update)
                .delete(users::delete),
        )
}
