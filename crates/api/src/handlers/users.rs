//! Handlers for the `/usuarios` resource.
//!
//! Listing, creating and deleting are admin-only. Reading and editing are
//! open to admins for any account and to everyone else for their own.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use feedfort_core::error::CoreError;
use feedfort_core::roles::Role;
use feedfort_core::types::DbId;
use feedfort_db::models::user::{CreateUser, UpdateUser, UserResponse};
use feedfort_db::models::Removal;
use feedfort_db::repositories::UserRepo;
use serde::Deserialize;
use validator::{Validate, ValidationErrors};

use super::{required_text, MessageResponse};
use crate::auth::password::hash_password;
use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /usuarios`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(max = 80, message = "Field 'username' is too long"))]
    pub username: Option<String>,
    #[validate(email(message = "Field 'email' must be a valid email address"))]
    pub email: Option<String>,
    pub password: Option<String>,
    pub user_type: Option<String>,
}

/// Request body for `PUT /usuarios/{id}`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 80, message = "Field 'username' must not be empty"))]
    pub username: Option<String>,
    #[validate(email(message = "Field 'email' must be a valid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 1, message = "Field 'password' must not be empty"))]
    pub password: Option<String>,
    pub user_type: Option<String>,
    pub is_active: Option<bool>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// First validation message, in field order, as a domain error.
fn validation_error(errors: ValidationErrors) -> CoreError {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    let message = fields
        .first()
        .and_then(|(field, errs)| {
            errs.first().map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Field '{field}' is invalid"))
            })
        })
        .unwrap_or_else(|| "Invalid request".to_string());
    CoreError::Validation(message)
}

fn parse_role(raw: &str) -> Result<Role, CoreError> {
    Role::parse(raw.trim()).ok_or_else(|| {
        CoreError::Validation("Field 'user_type' must be 'comum' or 'admin'".into())
    })
}

fn hash(password: &str) -> AppResult<String> {
    hash_password(password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))
}

/// Non-admins may only touch their own account.
fn ensure_self_or_admin(auth: &AuthUser, id: DbId) -> Result<(), CoreError> {
    if auth.is_admin() || auth.user_id == id {
        Ok(())
    } else {
        Err(CoreError::Forbidden("Access denied".into()))
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/usuarios
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<Vec<UserResponse>>> {
    let users = UserRepo::list(&state.pool).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// POST /api/usuarios
///
/// Create an account. Username and email must be unused; the password is
/// stored as an Argon2id hash.
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    AppJson(input): AppJson<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let username = required_text("username", input.username.as_deref())?;
    let email = required_text("email", input.email.as_deref())?;
    let password = input
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| CoreError::Validation("Field 'password' is required".into()))?;
    input.validate().map_err(validation_error)?;
    let user_type = input
        .user_type
        .as_deref()
        .map(parse_role)
        .transpose()?
        .unwrap_or(Role::Comum);

    if UserRepo::username_taken(&state.pool, &username, None).await? {
        return Err(CoreError::Conflict("Username already exists".into()).into());
    }
    if UserRepo::email_taken(&state.pool, &email, None).await? {
        return Err(CoreError::Conflict("Email already exists".into()).into());
    }

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            username,
            email,
            password_hash: hash(password)?,
            user_type,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, created_by = admin.user_id, "User created");
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// GET /api/usuarios/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<UserResponse>> {
    ensure_self_or_admin(&auth, id)?;
    let user = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound { entity: "User", id })?;
    Ok(Json(user.into()))
}

/// PUT /api/usuarios/{id}
///
/// Role and active flag are only applied when the caller is an admin.
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    AppJson(input): AppJson<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    ensure_self_or_admin(&auth, id)?;
    UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound { entity: "User", id })?;
    input.validate().map_err(validation_error)?;

    let username = input
        .username
        .as_deref()
        .map(|u| required_text("username", Some(u)))
        .transpose()?;
    if let Some(username) = &username {
        if UserRepo::username_taken(&state.pool, username, Some(id)).await? {
            return Err(CoreError::Conflict("Username already exists".into()).into());
        }
    }
    let email = input.email.as_deref().map(|e| e.trim().to_string());
    if let Some(email) = &email {
        if UserRepo::email_taken(&state.pool, email, Some(id)).await? {
            return Err(CoreError::Conflict("Email already exists".into()).into());
        }
    }

    let (user_type, is_active) = if auth.is_admin() {
        (
            input.user_type.as_deref().map(parse_role).transpose()?,
            input.is_active,
        )
    } else {
        (None, None)
    };

    let changes = UpdateUser {
        username,
        email,
        password_hash: input.password.as_deref().map(hash).transpose()?,
        user_type,
        is_active,
    };

    let user = UserRepo::update(&state.pool, id, &changes)
        .await?
        .ok_or(CoreError::NotFound { entity: "User", id })?;

    tracing::info!(user_id = id, updated_by = auth.user_id, "User updated");
    Ok(Json(user.into()))
}

/// DELETE /api/usuarios/{id}
///
/// Accounts that authored feedback are deactivated instead of removed.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Response> {
    if admin.user_id == id {
        return Err(CoreError::Validation("You cannot delete your own account".into()).into());
    }

    match UserRepo::delete_or_deactivate(&state.pool, id).await? {
        Removal::Deleted => {
            tracing::info!(user_id = id, "User deleted");
            Ok(StatusCode::NO_CONTENT.into_response())
        }
        Removal::Deactivated => {
            tracing::info!(user_id = id, "User deactivated instead of deleted");
            Ok(Json(MessageResponse::new(
                "User has feedback records and was deactivated instead of deleted",
            ))
            .into_response())
        }
        Removal::NotFound => Err(CoreError::NotFound { entity: "User", id }.into()),
    }
}
