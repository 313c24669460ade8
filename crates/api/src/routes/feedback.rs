use axum::routing::get;
use axum::Router;

use crate::handlers::feedback;
use crate::state::AppState;

/// ```text
/// GET    /feedback                          -> list
/// POST   /feedback                          -> create
/// GET    /feedback/stats                    -> stats
/// GET    /feedback/stats/daily_evolution    -> daily_evolution
/// GET    /feedback/{id}                     -> get_by_id
/// PUT    /feedback/{id}                     -> update
/// DELETE /feedback/{id}                     -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/feedback", get(feedback::list).post(feedback::create))
        .route("/feedback/stats", get(feedback::stats))
        .route(
            "/feedback/stats/daily_evolution",
            get(feedback::daily_evolution),
        )
        .route(
            "/feedback/{id}",
            get(feedback::get_by_id)
                .put(feedback::update)
                .delete(feedback::delete),
        )
}
