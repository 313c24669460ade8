//! Handlers for login and the caller's own identity.

use axum::extract::State;
use axum::Json;
use feedfort_core::error::CoreError;
use feedfort_core::types::DbId;
use feedfort_db::repositories::UserRepo;
use serde::{Deserialize, Serialize};

use crate::auth::jwt::generate_token;
use crate::auth::password::verify_password;
use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Same message for unknown usernames and wrong passwords.
const INVALID_CREDENTIALS: &str = "Invalid credentials";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub token: String,
    pub user: SessionUser,
}

/// Public identity of the logged-in user.
#[derive(Debug, Serialize)]
pub struct SessionUser {
    pub id: DbId,
    pub username: String,
    pub user_type: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/login
///
/// Exchange username and password for a session token.
pub async fn login(
    State(state): State<AppState>,
    AppJson(input): AppJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let username = input.username.as_deref().map(str::trim).filter(|u| !u.is_empty());
    let password = input.password.as_deref().filter(|p| !p.is_empty());
    let (Some(username), Some(password)) = (username, password) else {
        return Err(CoreError::Validation("Username and password are required".into()).into());
    };

    let user = UserRepo::find_by_username(&state.pool, username)
        .await?
        .ok_or_else(|| CoreError::Unauthorized(INVALID_CREDENTIALS.into()))?;

    let password_valid = verify_password(password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        tracing::info!(username = %username, "Login rejected");
        return Err(CoreError::Unauthorized(INVALID_CREDENTIALS.into()).into());
    }

    if !user.is_active {
        return Err(CoreError::Unauthorized("User is inactive".into()).into());
    }

    let token = generate_token(user.id, user.role(), &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    tracing::info!(user_id = user.id, "User logged in");
    Ok(Json(LoginResponse {
        message: "Login successful",
        token,
        user: SessionUser {
            id: user.id,
            username: user.username,
            user_type: user.user_type,
        },
    }))
}

/// GET /api/usuario/tipo
///
/// Role and name of the caller.
pub async fn user_type(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<SessionUser>> {
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        })?;

    Ok(Json(SessionUser {
        id: user.id,
        username: user.username,
        user_type: auth.role.as_str().to_string(),
    }))
}
