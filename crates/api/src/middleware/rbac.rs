//! Role-based access control extractors.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use feedfort_core::guard::Access;

use super::auth::{resolve, AuthUser};
use crate::error::AppError;
use crate::state::AppState;

/// Requires the `admin` role. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn admin_only(RequireAdmin(user): RequireAdmin) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = resolve(parts, state, Access::Admin).await?;
        Ok(RequireAdmin(identity.into()))
    }
}
