//! Handlers for the `/funcionarios` resource.
//!
//! Reads are open to any authenticated user; mutations require an admin.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{NaiveDate, Utc};
use feedfort_core::employee::{days_remaining, parse_date, resolve_probation_end, validate_name};
use feedfort_core::error::CoreError;
use feedfort_core::types::DbId;
use feedfort_db::models::employee::{CreateEmployee, Employee, EmployeeFilter, UpdateEmployee};
use feedfort_db::models::Removal;
use feedfort_db::repositories::{DepartmentRepo, EmployeeRepo};
use serde::{Deserialize, Serialize};

use super::departments::find_by_name;
use super::MessageResponse;
use crate::error::AppResult;
use crate::extract::AppJson;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct EmployeeListQuery {
    /// Department name.
    pub setor: Option<String>,
    pub setor_id: Option<DbId>,
    /// `true` keeps only employees whose probation is still running.
    pub em_experiencia: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateEmployeeRequest {
    pub nome: Option<String>,
    pub setor_id: Option<DbId>,
    pub cargo: Option<String>,
    /// `YYYY-MM-DD`, defaults to today.
    pub data_admissao: Option<String>,
    pub em_experiencia: Option<bool>,
    pub data_fim_experiencia: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEmployeeRequest {
    pub nome: Option<String>,
    pub setor_id: Option<DbId>,
    pub cargo: Option<String>,
    pub data_admissao: Option<String>,
    pub em_experiencia: Option<bool>,
    pub data_fim_experiencia: Option<String>,
    pub is_active: Option<bool>,
}

/// An employee plus the days left in their probation period.
#[derive(Debug, Serialize)]
pub struct EmployeeResponse {
    #[serde(flatten)]
    pub employee: Employee,
    pub dias_restantes_experiencia: Option<i64>,
}

impl EmployeeResponse {
    fn new(employee: Employee, today: NaiveDate) -> Self {
        let dias_restantes_experiencia = if employee.em_experiencia {
            days_remaining(employee.data_fim_experiencia, today)
        } else {
            None
        };
        Self {
            employee,
            dias_restantes_experiencia,
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn parse_optional_date(field: &str, raw: Option<&str>) -> Result<Option<NaiveDate>, CoreError> {
    raw.map(str::trim)
        .filter(|r| !r.is_empty())
        .map(|r| parse_date(field, r))
        .transpose()
}

async fn ensure_department_exists(state: &AppState, setor_id: DbId) -> AppResult<()> {
    DepartmentRepo::find_by_id(&state.pool, setor_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Department",
            id: setor_id,
        })?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/funcionarios
///
/// Active employees, optionally narrowed to a department or to those
/// still on probation.
pub async fn list(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<EmployeeListQuery>,
) -> AppResult<Json<Vec<EmployeeResponse>>> {
    let today = today();
    let setor_id = match (query.setor_id, query.setor.as_deref()) {
        (Some(id), _) => Some(id),
        (None, Some(nome)) if !nome.trim().is_empty() => Some(find_by_name(&state, nome).await?.id),
        _ => None,
    };
    let filter = EmployeeFilter {
        setor_id,
        in_probation_on: query.em_experiencia.unwrap_or(false).then_some(today),
    };

    let employees = EmployeeRepo::list_active(&state.pool, &filter).await?;
    Ok(Json(
        employees
            .into_iter()
            .map(|e| EmployeeResponse::new(e, today))
            .collect(),
    ))
}

/// GET /api/funcionarios/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<EmployeeResponse>> {
    let employee = EmployeeRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Employee",
            id,
        })?;
    Ok(Json(EmployeeResponse::new(employee, today())))
}

/// POST /api/funcionarios
///
/// Enabling probation without an explicit end date derives it from the
/// admission date.
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    AppJson(input): AppJson<CreateEmployeeRequest>,
) -> AppResult<(StatusCode, Json<EmployeeResponse>)> {
    let nome = validate_name(input.nome.as_deref().unwrap_or_default())?;
    let setor_id = input
        .setor_id
        .ok_or_else(|| CoreError::Validation("Field 'setor_id' is required".into()))?;
    let today = today();
    let data_admissao =
        parse_optional_date("data_admissao", input.data_admissao.as_deref())?.unwrap_or(today);
    let explicit_end =
        parse_optional_date("data_fim_experiencia", input.data_fim_experiencia.as_deref())?;
    let em_experiencia = input.em_experiencia.unwrap_or(false);

    ensure_department_exists(&state, setor_id).await?;

    let employee = EmployeeRepo::create(
        &state.pool,
        &CreateEmployee {
            nome,
            setor_id,
            cargo: Some(input.cargo.unwrap_or_default()),
            data_admissao,
            em_experiencia,
            data_fim_experiencia: resolve_probation_end(em_experiencia, data_admissao, explicit_end),
        },
    )
    .await?;

    tracing::info!(funcionario_id = employee.id, setor_id, "Employee created");
    Ok((StatusCode::CREATED, Json(EmployeeResponse::new(employee, today))))
}

/// PUT /api/funcionarios/{id}
///
/// Fields left out keep their stored value. Turning probation on derives
/// the end date unless one is given; turning it off clears it.
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    AppJson(input): AppJson<UpdateEmployeeRequest>,
) -> AppResult<Json<EmployeeResponse>> {
    let current = EmployeeRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Employee",
            id,
        })?;

    let nome = match input.nome.as_deref() {
        Some(nome) => validate_name(nome)?,
        None => current.nome,
    };
    let setor_id = match input.setor_id {
        Some(setor_id) => {
            ensure_department_exists(&state, setor_id).await?;
            setor_id
        }
        None => current.setor_id,
    };
    let data_admissao = parse_optional_date("data_admissao", input.data_admissao.as_deref())?
        .unwrap_or(current.data_admissao);
    let explicit_end =
        parse_optional_date("data_fim_experiencia", input.data_fim_experiencia.as_deref())?;

    let (em_experiencia, data_fim_experiencia) = match input.em_experiencia {
        Some(flag) => (flag, resolve_probation_end(flag, data_admissao, explicit_end)),
        None => (
            current.em_experiencia,
            explicit_end.or(current.data_fim_experiencia),
        ),
    };

    let changes = UpdateEmployee {
        nome,
        setor_id,
        cargo: input.cargo.or(current.cargo),
        is_active: input.is_active.unwrap_or(current.is_active),
        data_admissao,
        em_experiencia,
        data_fim_experiencia,
    };
    let employee = EmployeeRepo::update(&state.pool, id, &changes)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Employee",
            id,
        })?;

    tracing::info!(funcionario_id = id, "Employee updated");
    Ok(Json(EmployeeResponse::new(employee, today())))
}

/// DELETE /api/funcionarios/{id}
///
/// Employees with feedback are marked inactive instead of removed.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Response> {
    match EmployeeRepo::delete_or_deactivate(&state.pool, id).await? {
        Removal::Deleted => {
            tracing::info!(funcionario_id = id, "Employee deleted");
            Ok(StatusCode::NO_CONTENT.into_response())
        }
        Removal::Deactivated => {
            tracing::info!(funcionario_id = id, "Employee deactivated instead of deleted");
            Ok(Json(MessageResponse::new(
                "Employee has feedback records and was marked inactive",
            ))
            .into_response())
        }
        Removal::NotFound => Err(CoreError::NotFound {
            entity: "Employee",
            id,
        }
        .into()),
    }
}
