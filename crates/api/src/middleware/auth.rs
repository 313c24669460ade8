//! JWT-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use feedfort_core::error::CoreError;
use feedfort_core::guard::{admit, bearer_token, Access, Identity, Rejection as Refusal};
use feedfort_core::roles::Role;
use feedfort_core::types::DbId;
use feedfort_db::repositories::UserRepo;

use crate::auth::jwt::validate_token;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Authenticated caller, resolved from the `Authorization: Bearer` header
/// and the current user record.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, role = %user.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: DbId,
    /// Role as currently stored, not as issued in the token.
    pub role: Role,
}

impl AuthUser {
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.user_id,
            role: self.role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl From<Identity> for AuthUser {
    fn from(identity: Identity) -> Self {
        Self {
            user_id: identity.user_id,
            role: identity.role,
        }
    }
}

/// Run the guard contract for one request at the given access level.
pub(crate) async fn resolve(parts: &Parts, state: &AppState, access: Access) -> AppResult<Identity> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .map(|v| v.to_str())
        .transpose()
        .map_err(|_| CoreError::from(Refusal::MalformedCredential))?;
    let token = bearer_token(header).map_err(CoreError::from)?;

    let claims = validate_token(token, &state.config.jwt)
        .map_err(|_| CoreError::from(Refusal::InvalidToken))?;

    let resolved = UserRepo::find_by_id(&state.pool, claims.sub)
        .await?
        .map(|user| (user.id, user.role(), user.is_active));

    Ok(admit(resolved, access).into_result()?)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve(parts, state, Access::Authenticated)
            .await
            .map(AuthUser::from)
    }
}
