//! Feedback record model, DTOs and aggregate shapes.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::FromRow;
use feedfort_core::export::ExportRecord;
use feedfort_core::feedback::FeedbackType;
use feedfort_core::types::{DbId, Timestamp};

/// A feedback row joined with employee, department and author names.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Feedback {
    pub id: DbId,
    pub tipo: String,
    pub funcionario_id: DbId,
    pub funcionario_nome: String,
    pub setor_id: DbId,
    pub setor_nome: String,
    pub autor_id: DbId,
    pub autor_username: String,
    pub data_feedback: Timestamp,
    pub avaliacoes: Option<Json<Map<String, Value>>>,
    pub descricao: Option<String>,
    pub detalhes: Option<String>,
    pub recomenda_efetivacao: Option<bool>,
    pub sincronizado_sheets: bool,
    pub data_sincronizacao: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Feedback {
    pub fn kind(&self) -> Option<FeedbackType> {
        FeedbackType::parse(&self.tipo)
    }

    /// Row data for the spreadsheet export. `None` if the stored type is
    /// outside the known vocabulary.
    pub fn export_record(&self) -> Option<ExportRecord> {
        Some(ExportRecord {
            id: self.id,
            tipo: self.kind()?,
            data_feedback: self.data_feedback,
            setor_nome: Some(self.setor_nome.clone()),
            funcionario_nome: Some(self.funcionario_nome.clone()),
            autor_username: Some(self.autor_username.clone()),
            avaliacoes: self.avaliacoes.as_ref().map(|j| j.0.clone()),
            descricao: self.descricao.clone(),
            detalhes: self.detalhes.clone(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct CreateFeedback {
    pub tipo: FeedbackType,
    pub funcionario_id: DbId,
    pub autor_id: DbId,
    pub avaliacoes: Option<Map<String, Value>>,
    pub descricao: Option<String>,
    pub detalhes: Option<String>,
    pub recomenda_efetivacao: Option<bool>,
}

/// Mutable fields of a feedback record. The author is never editable.
#[derive(Debug, Clone, Default)]
pub struct UpdateFeedback {
    pub tipo: Option<FeedbackType>,
    pub funcionario_id: Option<DbId>,
    pub avaliacoes: Option<Map<String, Value>>,
    pub descricao: Option<String>,
}

/// List and stats filters. `None` means "no restriction"; range bounds
/// are inclusive.
#[derive(Debug, Clone, Default)]
pub struct FeedbackFilter {
    pub funcionario_id: Option<DbId>,
    pub setor_id: Option<DbId>,
    pub tipo: Option<FeedbackType>,
    pub autor_id: Option<DbId>,
    pub data_inicio: Option<Timestamp>,
    pub data_fim: Option<Timestamp>,
}

/// Per-type record counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize)]
pub struct FeedbackCounts {
    pub total_feedbacks: i64,
    pub feedbacks_diarios: i64,
    pub feedbacks_positivos: i64,
    pub feedbacks_negativos: i64,
    pub feedbacks_experiencia: i64,
    pub feedbacks_diario_experiencia: i64,
    pub feedbacks_final_experiencia: i64,
}

/// [`FeedbackCounts`] scoped to one department's employees.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DepartmentCounts {
    pub setor_id: DbId,
    pub setor_nome: String,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub counts: FeedbackCounts,
}

/// Mean probation score for one calendar day.
#[derive(Debug, Clone, FromRow)]
pub struct DailyAverage {
    pub dia: NaiveDate,
    pub media: f64,
}

/// Export progress across all records.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct SyncCounts {
    pub total_feedbacks: i64,
    pub sincronizados: i64,
    pub nao_sincronizados: i64,
}
