//! Department (setor) entity model and DTOs.

use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;
use feedfort_core::types::{DbId, Timestamp};

/// A row from the `departments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Department {
    pub id: DbId,
    pub nome: String,
    pub descricao: Option<String>,
    /// Attribute names evaluated by daily feedback in this department.
    pub atributos_avaliacao: Json<Vec<String>>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Department {
    pub fn attributes(&self) -> &[String] {
        &self.atributos_avaliacao.0
    }
}

#[derive(Debug, Clone)]
pub struct CreateDepartment {
    pub nome: String,
    pub descricao: Option<String>,
    pub atributos_avaliacao: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateDepartment {
    pub nome: Option<String>,
    pub descricao: Option<String>,
    pub atributos_avaliacao: Option<Vec<String>>,
}
