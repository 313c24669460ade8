pub mod auth;
pub mod departments;
pub mod employees;
pub mod feedback;
pub mod health;
pub mod sheets;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /login                                  login (public)
/// /usuario/tipo                           caller identity
///
/// /usuarios                               list, create (admin)
/// /usuarios/{id}                          get, update (self or admin), delete (admin)
///
/// /setores                                list, create (admin)
/// /setores/{id}                           get, update, delete (admin)
/// /setores/{id}/atributos                 add, remove attribute (admin)
/// /atributos                              attribute lookup by department
///
/// /funcionarios                           list, create (admin)
/// /funcionarios/{id}                      get, update, delete (admin)
///
/// /feedback                               list, create
/// /feedback/stats                         aggregate counts
/// /feedback/stats/daily_evolution         probation score evolution (admin)
/// /feedback/{id}                          get, update, delete (author or admin)
///
/// /google-sheets-sync                     export one or all records
/// /google-sheets/config                   get, set target spreadsheet (admin)
/// /google-sheets/create                   create target spreadsheet (admin)
/// /google-sheets/test                     check access (admin)
/// /google-sheets/status                   export progress
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(users::router())
        .merge(departments::router())
        .merge(employees::router())
        .merge(feedback::router())
        .merge(sheets::router())
}
