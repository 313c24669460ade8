//! Repository for the `departments` table.

use sqlx::types::Json;
use sqlx::PgPool;
use feedfort_core::department;
use feedfort_core::types::DbId;

use crate::models::department::{CreateDepartment, Department, UpdateDepartment};

const COLUMNS: &str = "id, nome, descricao, atributos_avaliacao, created_at, updated_at";

/// Outcome of a department delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepartmentDeletion {
    Deleted,
    /// Employees (active or not) still reference the department.
    InUse,
    NotFound,
}

/// Provides CRUD operations for departments.
pub struct DepartmentRepo;

impl DepartmentRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateDepartment,
    ) -> Result<Department, sqlx::Error> {
        let query = format!(
            "INSERT INTO departments (nome, descricao, atributos_avaliacao)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Department>(&query)
            .bind(&input.nome)
            .bind(&input.descricao)
            .bind(Json(&input.atributos_avaliacao))
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Department>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM departments WHERE id = $1");
        sqlx::query_as::<_, Department>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_name(
        pool: &PgPool,
        nome: &str,
    ) -> Result<Option<Department>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM departments WHERE nome = $1");
        sqlx::query_as::<_, Department>(&query)
            .bind(nome)
            .fetch_optional(pool)
            .await
    }

    /// List all departments ordered by name.
    pub async fn list(pool: &PgPool) -> Result<Vec<Department>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM departments ORDER BY nome");
        sqlx::query_as::<_, Department>(&query).fetch_all(pool).await
    }

    /// Whether `nome` belongs to a department other than `exclude_id`.
    pub async fn name_taken(
        pool: &PgPool,
        nome: &str,
        exclude_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS(
                SELECT 1 FROM departments
                WHERE nome = $1 AND ($2::BIGINT IS NULL OR id <> $2)
             )",
        )
        .bind(nome)
        .bind(exclude_id)
        .fetch_one(pool)
        .await
    }

    /// Update a department. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateDepartment,
    ) -> Result<Option<Department>, sqlx::Error> {
        let query = format!(
            "UPDATE departments SET
                nome = COALESCE($2, nome),
                descricao = COALESCE($3, descricao),
                atributos_avaliacao = COALESCE($4, atributos_avaliacao)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Department>(&query)
            .bind(id)
            .bind(&input.nome)
            .bind(&input.descricao)
            .bind(input.atributos_avaliacao.as_ref().map(Json))
            .fetch_optional(pool)
            .await
    }

    /// Add (`add = true`) or remove one attribute name.
    ///
    /// Read-modify-write under a row lock. Adding a present attribute or
    /// removing an absent one leaves the row unchanged.
    pub async fn edit_attribute(
        pool: &PgPool,
        id: DbId,
        atributo: &str,
        add: bool,
    ) -> Result<Option<Department>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!("SELECT {COLUMNS} FROM departments WHERE id = $1 FOR UPDATE");
        let Some(current) = sqlx::query_as::<_, Department>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let mut attributes = current.atributos_avaliacao.0.clone();
        let changed = if add {
            // Blank names are rejected before reaching the repository.
            department::add_attribute(&mut attributes, atributo).unwrap_or(false)
        } else {
            department::remove_attribute(&mut attributes, atributo)
        };

        if !changed {
            tx.commit().await?;
            return Ok(Some(current));
        }

        let query = format!(
            "UPDATE departments SET atributos_avaliacao = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Department>(&query)
            .bind(id)
            .bind(Json(&attributes))
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    /// Delete a department unless any employee references it.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<DepartmentDeletion, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let exists: Option<DbId> =
            sqlx::query_scalar("SELECT id FROM departments WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Ok(DepartmentDeletion::NotFound);
        }

        let in_use: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM employees WHERE setor_id = $1)")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if in_use {
            return Ok(DepartmentDeletion::InUse);
        }

        sqlx::query("DELETE FROM departments WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(DepartmentDeletion::Deleted)
    }

    /// Attribute lists of every department, for the export header.
    pub async fn all_attribute_lists(pool: &PgPool) -> Result<Vec<Vec<String>>, sqlx::Error> {
        let rows: Vec<Json<Vec<String>>> =
            sqlx::query_scalar("SELECT atributos_avaliacao FROM departments ORDER BY id")
                .fetch_all(pool)
                .await?;
        Ok(rows.into_iter().map(|j| j.0).collect())
    }
}
