//! Handlers for the `/setores` resource and the `/atributos` lookup.
//!
//! Reads are open to any authenticated user; mutations require an admin.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use feedfort_core::department::{normalize_attributes, validate_name};
use feedfort_core::error::CoreError;
use feedfort_core::types::DbId;
use feedfort_db::models::department::{CreateDepartment, Department, UpdateDepartment};
use feedfort_db::repositories::department_repo::DepartmentDeletion;
use feedfort_db::repositories::DepartmentRepo;
use serde::{Deserialize, Serialize};

use super::required_text;
use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateDepartmentRequest {
    pub nome: Option<String>,
    pub descricao: Option<String>,
    pub atributos_avaliacao: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDepartmentRequest {
    pub nome: Option<String>,
    pub descricao: Option<String>,
    pub atributos_avaliacao: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct AttributeRequest {
    pub atributo: Option<String>,
}

/// `GET /atributos` selects the department by name or id.
#[derive(Debug, Deserialize)]
pub struct AttributesQuery {
    pub setor: Option<String>,
    pub setor_id: Option<DbId>,
}

#[derive(Debug, Serialize)]
pub struct AttributesResponse {
    pub setor_id: DbId,
    pub setor_nome: String,
    pub atributos: Vec<String>,
}

async fn ensure_name_free(
    state: &AppState,
    nome: &str,
    exclude_id: Option<DbId>,
) -> AppResult<()> {
    if DepartmentRepo::name_taken(&state.pool, nome, exclude_id).await? {
        return Err(CoreError::Conflict("Department already exists".into()).into());
    }
    Ok(())
}

/// Look a department up by name, for query-string filters.
pub(crate) async fn find_by_name(state: &AppState, nome: &str) -> AppResult<Department> {
    DepartmentRepo::find_by_name(&state.pool, nome.trim())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Department '{}' not found", nome.trim())))
}

/// GET /api/setores
pub async fn list(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> AppResult<Json<Vec<Department>>> {
    Ok(Json(DepartmentRepo::list(&state.pool).await?))
}

/// GET /api/setores/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<Department>> {
    let department = DepartmentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Department",
            id,
        })?;
    Ok(Json(department))
}

/// POST /api/setores
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    AppJson(input): AppJson<CreateDepartmentRequest>,
) -> AppResult<(StatusCode, Json<Department>)> {
    let nome = validate_name(input.nome.as_deref().unwrap_or_default())?;
    ensure_name_free(&state, &nome, None).await?;

    let department = DepartmentRepo::create(
        &state.pool,
        &CreateDepartment {
            nome,
            descricao: Some(input.descricao.unwrap_or_default()),
            atributos_avaliacao: normalize_attributes(input.atributos_avaliacao.unwrap_or_default()),
        },
    )
    .await?;

    tracing::info!(setor_id = department.id, "Department created");
    Ok((StatusCode::CREATED, Json(department)))
}

/// PUT /api/setores/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    AppJson(input): AppJson<UpdateDepartmentRequest>,
) -> AppResult<Json<Department>> {
    let nome = input.nome.as_deref().map(validate_name).transpose()?;
    if let Some(nome) = &nome {
        ensure_name_free(&state, nome, Some(id)).await?;
    }

    let changes = UpdateDepartment {
        nome,
        descricao: input.descricao,
        atributos_avaliacao: input.atributos_avaliacao.map(normalize_attributes),
    };
    let department = DepartmentRepo::update(&state.pool, id, &changes)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Department",
            id,
        })?;

    tracing::info!(setor_id = id, "Department updated");
    Ok(Json(department))
}

/// DELETE /api/setores/{id}
///
/// Refused while any employee, active or not, belongs to the department.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    match DepartmentRepo::delete(&state.pool, id).await? {
        DepartmentDeletion::Deleted => {
            tracing::info!(setor_id = id, "Department deleted");
            Ok(StatusCode::NO_CONTENT)
        }
        DepartmentDeletion::InUse => Err(CoreError::Conflict(
            "Cannot delete a department that has employees".into(),
        )
        .into()),
        DepartmentDeletion::NotFound => Err(CoreError::NotFound {
            entity: "Department",
            id,
        }
        .into()),
    }
}

async fn edit_attribute(
    state: &AppState,
    id: DbId,
    input: AttributeRequest,
    add: bool,
) -> AppResult<Json<Department>> {
    let atributo = required_text("atributo", input.atributo.as_deref())?;
    let department = DepartmentRepo::edit_attribute(&state.pool, id, &atributo, add)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Department",
            id,
        })?;
    tracing::debug!(setor_id = id, atributo = %atributo, add, "Department attribute edited");
    Ok(Json(department))
}

/// POST /api/setores/{id}/atributos
///
/// Adding an attribute that is already present succeeds without change.
pub async fn add_attribute(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    AppJson(input): AppJson<AttributeRequest>,
) -> AppResult<Json<Department>> {
    edit_attribute(&state, id, input, true).await
}

/// DELETE /api/setores/{id}/atributos
///
/// Removing an absent attribute succeeds without change.
pub async fn remove_attribute(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    AppJson(input): AppJson<AttributeRequest>,
) -> AppResult<Json<Department>> {
    edit_attribute(&state, id, input, false).await
}

/// GET /api/atributos?setor=<nome>|setor_id=<id>
pub async fn attributes(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<AttributesQuery>,
) -> AppResult<Json<AttributesResponse>> {
    let department = match (query.setor_id, query.setor.as_deref()) {
        (Some(id), _) => DepartmentRepo::find_by_id(&state.pool, id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Department",
                id,
            })?,
        (None, Some(nome)) if !nome.trim().is_empty() => find_by_name(&state, nome).await?,
        _ => {
            return Err(CoreError::Validation(
                "Query parameter 'setor' or 'setor_id' is required".into(),
            )
            .into())
        }
    };

    Ok(Json(AttributesResponse {
        setor_id: department.id,
        atributos: department.attributes().to_vec(),
        setor_nome: department.nome,
    }))
}
