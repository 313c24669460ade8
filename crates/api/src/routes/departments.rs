use axum::routing::{get, post};
use axum::Router;

use crate::handlers::departments;
use crate::state::AppState;

/// ```text
/// GET    /setores                  -> list
/// POST   /setores                  -> create
/// GET    /setores/{id}             -> get_by_id
/// PUT    /setores/{id}             -> update
/// DELETE /setores/{id}             -> delete
/// POST   /setores/{id}/atributos   -> add_attribute
/// DELETE /setores/{id}/atributos   -> remove_attribute
/// GET    /atributos                -> attributes
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/setores", get(departments::list).post(departments::create))
        .route(
            "/setores/{id}",
            get(departments::get_by_id)
                .put(departments::update)
                .delete(departments::delete),
        )
        .route(
            "/setores/{id}/atributos",
            post(departments::add_attribute).delete(departments::remove_attribute),
        )
        .route("/atributos", get(departments::attributes))
}
