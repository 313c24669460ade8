//! Handlers for the `/feedback` resource.
//!
//! Every record is owned by its author. Non-admin callers only ever see,
//! edit or delete their own records; admins act on all of them.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use feedfort_core::error::CoreError;
use feedfort_core::feedback::{
    effective_author_filter, ensure_can_access, format_evolution_day, normalize_text,
    parse_create_type, parse_range_bound, parse_type_filter, parse_update_type,
    validate_new_payload, validate_updated_description, validate_updated_ratings,
    FeedbackPayload,
};
use feedfort_core::guard::Identity;
use feedfort_core::types::DbId;
use feedfort_db::models::employee::Employee;
use feedfort_db::models::feedback::{
    CreateFeedback, DepartmentCounts, Feedback, FeedbackCounts, FeedbackFilter, UpdateFeedback,
};
use feedfort_db::repositories::{DepartmentRepo, EmployeeRepo, FeedbackRepo};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateFeedbackRequest {
    pub tipo: Option<String>,
    pub funcionario_id: Option<DbId>,
    #[serde(flatten)]
    pub payload: FeedbackPayload,
}

/// Only these fields of a record can change after creation.
#[derive(Debug, Deserialize)]
pub struct UpdateFeedbackRequest {
    pub tipo: Option<String>,
    pub funcionario_id: Option<DbId>,
    pub avaliacoes: Option<Map<String, Value>>,
    pub descricao: Option<String>,
}

/// Filters shared by the list and stats endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct FeedbackListQuery {
    pub funcionario_id: Option<DbId>,
    pub setor_id: Option<DbId>,
    pub tipo: Option<String>,
    /// Honoured for admins only.
    pub autor_id: Option<DbId>,
    pub data_inicio: Option<String>,
    pub data_fim: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub counts: FeedbackCounts,
    /// Per-department breakdown, empty for non-admins.
    pub stats_por_setor: Vec<DepartmentCounts>,
}

#[derive(Debug, Serialize)]
pub struct DailyEvolutionResponse {
    pub dates: Vec<String>,
    pub averages: Vec<f64>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

impl FeedbackListQuery {
    /// Build the repository filter, pinning non-admins to their own records.
    fn into_filter(self, identity: &Identity) -> Result<FeedbackFilter, CoreError> {
        Ok(FeedbackFilter {
            funcionario_id: self.funcionario_id,
            setor_id: self.setor_id,
            tipo: parse_type_filter(self.tipo.as_deref())?,
            autor_id: effective_author_filter(identity, self.autor_id),
            data_inicio: parse_range_bound("data_inicio", self.data_inicio.as_deref())?,
            data_fim: parse_range_bound("data_fim", self.data_fim.as_deref())?,
        })
    }
}

/// The employee a record is about. Must exist and be active.
async fn active_employee(state: &AppState, id: DbId) -> AppResult<Employee> {
    EmployeeRepo::find_by_id(&state.pool, id)
        .await?
        .filter(|e| e.is_active)
        .ok_or_else(|| {
            CoreError::NotFound {
                entity: "Employee",
                id,
            }
            .into()
        })
}

async fn department_attributes(state: &AppState, setor_id: DbId) -> AppResult<Vec<String>> {
    Ok(DepartmentRepo::find_by_id(&state.pool, setor_id)
        .await?
        .map(|d| d.attributes().to_vec())
        .unwrap_or_default())
}

/// Load a record and apply the ownership rule.
async fn owned_feedback(state: &AppState, auth: &AuthUser, id: DbId) -> AppResult<Feedback> {
    let feedback = FeedbackRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Feedback",
            id,
        })?;
    ensure_can_access(&auth.identity(), feedback.autor_id)?;
    Ok(feedback)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/feedback
///
/// The caller becomes the author. The payload is validated against the
/// record type and, for daily ratings, the employee's department.
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(input): AppJson<CreateFeedbackRequest>,
) -> AppResult<(StatusCode, Json<Feedback>)> {
    let tipo = parse_create_type(input.tipo.as_deref())?;
    let funcionario_id = input
        .funcionario_id
        .ok_or_else(|| CoreError::Validation("Field 'funcionario_id' is required".into()))?;

    let employee = active_employee(&state, funcionario_id).await?;
    let attributes = department_attributes(&state, employee.setor_id).await?;
    validate_new_payload(tipo, &input.payload, &attributes)?;

    let payload = input.payload;
    let new = CreateFeedback {
        tipo,
        funcionario_id,
        autor_id: auth.user_id,
        avaliacoes: payload.avaliacoes,
        descricao: normalize_text(payload.descricao.as_deref()),
        detalhes: normalize_text(payload.detalhes.as_deref()),
        recomenda_efetivacao: payload.recomenda_efetivacao,
    };

    // `None` means the employee was deactivated between the check and the insert.
    let feedback = FeedbackRepo::create(&state.pool, &new)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Employee",
            id: funcionario_id,
        })?;

    tracing::info!(
        feedback_id = feedback.id,
        tipo = %tipo,
        funcionario_id,
        autor_id = auth.user_id,
        "Feedback created"
    );
    Ok((StatusCode::CREATED, Json(feedback)))
}

/// GET /api/feedback
///
/// Most recent first.
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<FeedbackListQuery>,
) -> AppResult<Json<Vec<Feedback>>> {
    let filter = query.into_filter(&auth.identity())?;
    Ok(Json(FeedbackRepo::list(&state.pool, &filter).await?))
}

/// GET /api/feedback/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<Feedback>> {
    Ok(Json(owned_feedback(&state, &auth, id).await?))
}

/// PUT /api/feedback/{id}
///
/// Any successful edit clears the record's export state.
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    AppJson(input): AppJson<UpdateFeedbackRequest>,
) -> AppResult<Json<Feedback>> {
    let current = owned_feedback(&state, &auth, id).await?;

    let tipo = input.tipo.as_deref().map(parse_update_type).transpose()?;
    let resulting_type = match tipo {
        Some(tipo) => tipo,
        None => current.kind().ok_or_else(|| {
            AppError::InternalError(format!("Feedback {id} has unknown type '{}'", current.tipo))
        })?,
    };

    let setor_id = match input.funcionario_id {
        Some(funcionario_id) => active_employee(&state, funcionario_id).await?.setor_id,
        None => current.setor_id,
    };
    let attributes = department_attributes(&state, setor_id).await?;
    validate_updated_ratings(resulting_type, input.avaliacoes.as_ref(), &attributes)?;
    let descricao = validate_updated_description(
        resulting_type,
        input.descricao.as_deref(),
        current.descricao.as_deref(),
    )?;

    let changes = UpdateFeedback {
        tipo,
        funcionario_id: input.funcionario_id,
        avaliacoes: input.avaliacoes,
        descricao,
    };
    let feedback = FeedbackRepo::update(&state.pool, id, &changes)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Feedback",
            id,
        })?;

    tracing::info!(feedback_id = id, updated_by = auth.user_id, "Feedback updated");
    Ok(Json(feedback))
}

/// DELETE /api/feedback/{id}
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    owned_feedback(&state, &auth, id).await?;
    if !FeedbackRepo::delete(&state.pool, id).await? {
        return Err(CoreError::NotFound {
            entity: "Feedback",
            id,
        }
        .into());
    }
    tracing::info!(feedback_id = id, deleted_by = auth.user_id, "Feedback deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/feedback/stats
///
/// Counts over the same visibility and filters as the list. Admins also
/// get one row per department.
pub async fn stats(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<FeedbackListQuery>,
) -> AppResult<Json<StatsResponse>> {
    let filter = query.into_filter(&auth.identity())?;
    let counts = FeedbackRepo::counts(&state.pool, &filter).await?;
    let stats_por_setor = if auth.is_admin() {
        FeedbackRepo::counts_by_department(&state.pool, &filter).await?
    } else {
        Vec::new()
    };
    Ok(Json(StatsResponse {
        counts,
        stats_por_setor,
    }))
}

/// GET /api/feedback/stats/daily_evolution
///
/// Mean `nota` of probation daily feedback per calendar day, oldest first.
pub async fn daily_evolution(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<DailyEvolutionResponse>> {
    let days = FeedbackRepo::daily_evolution(&state.pool).await?;
    let (dates, averages) = days
        .into_iter()
        .map(|d| (format_evolution_day(d.dia), d.media))
        .unzip();
    Ok(Json(DailyEvolutionResponse { dates, averages }))
}
