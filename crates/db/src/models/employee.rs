//! Employee (funcionario) entity model and DTOs.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;
use feedfort_core::types::{DbId, Timestamp};

/// An employee row joined with its department name.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Employee {
    pub id: DbId,
    pub nome: String,
    pub setor_id: DbId,
    pub setor_nome: String,
    pub cargo: Option<String>,
    pub is_active: bool,
    pub data_admissao: NaiveDate,
    pub em_experiencia: bool,
    pub data_fim_experiencia: Option<NaiveDate>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateEmployee {
    pub nome: String,
    pub setor_id: DbId,
    pub cargo: Option<String>,
    pub data_admissao: NaiveDate,
    pub em_experiencia: bool,
    pub data_fim_experiencia: Option<NaiveDate>,
}

/// Full replacement of the mutable employee fields.
///
/// The caller merges the patch over the current row and resolves the
/// probation end date before writing.
#[derive(Debug, Clone)]
pub struct UpdateEmployee {
    pub nome: String,
    pub setor_id: DbId,
    pub cargo: Option<String>,
    pub is_active: bool,
    pub data_admissao: NaiveDate,
    pub em_experiencia: bool,
    pub data_fim_experiencia: Option<NaiveDate>,
}

/// List filters. `None` means "no restriction".
#[derive(Debug, Clone, Default)]
pub struct EmployeeFilter {
    pub setor_id: Option<DbId>,
    /// When set, only employees whose probation is still running on this date.
    pub in_probation_on: Option<NaiveDate>,
}
