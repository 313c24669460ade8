//! Repository for the `employees` table.
//!
//! Every read joins the owning department so responses carry `setor_nome`.

use sqlx::PgPool;
use feedfort_core::types::DbId;

use crate::models::employee::{CreateEmployee, Employee, EmployeeFilter, UpdateEmployee};
use crate::models::Removal;

const FIELDS: &str = "e.id, e.nome, e.setor_id, d.nome AS setor_nome, e.cargo, e.is_active, \
                       e.data_admissao, e.em_experiencia, e.data_fim_experiencia, \
                       e.created_at, e.updated_at";

const JOIN: &str = "JOIN departments d ON d.id = e.setor_id";

/// Provides CRUD operations for employees.
pub struct EmployeeRepo;

impl EmployeeRepo {
    /// Insert a new employee. The department must exist (foreign key).
    pub async fn create(pool: &PgPool, input: &CreateEmployee) -> Result<Employee, sqlx::Error> {
        let query = format!(
            "WITH e AS (
                INSERT INTO employees
                    (nome, setor_id, cargo, data_admissao, em_experiencia, data_fim_experiencia)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
             )
             SELECT {FIELDS} FROM e {JOIN}"
        );
        sqlx::query_as::<_, Employee>(&query)
            .bind(&input.nome)
            .bind(input.setor_id)
            .bind(&input.cargo)
            .bind(input.data_admissao)
            .bind(input.em_experiencia)
            .bind(input.data_fim_experiencia)
            .fetch_one(pool)
            .await
    }

    /// Find an employee by ID, active or not.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Employee>, sqlx::Error> {
        let query = format!("SELECT {FIELDS} FROM employees e {JOIN} WHERE e.id = $1");
        sqlx::query_as::<_, Employee>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List active employees ordered by name.
    pub async fn list_active(
        pool: &PgPool,
        filter: &EmployeeFilter,
    ) -> Result<Vec<Employee>, sqlx::Error> {
        let query = format!(
            "SELECT {FIELDS} FROM employees e {JOIN}
             WHERE e.is_active = true
               AND ($1::BIGINT IS NULL OR e.setor_id = $1)
               AND ($2::DATE IS NULL
                    OR (e.em_experiencia = true AND e.data_fim_experiencia >= $2))
             ORDER BY e.nome, e.id"
        );
        sqlx::query_as::<_, Employee>(&query)
            .bind(filter.setor_id)
            .bind(filter.in_probation_on)
            .fetch_all(pool)
            .await
    }

    /// Overwrite the mutable fields of an employee.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateEmployee,
    ) -> Result<Option<Employee>, sqlx::Error> {
        let query = format!(
            "WITH e AS (
                UPDATE employees SET
                    nome = $2,
                    setor_id = $3,
                    cargo = $4,
                    is_active = $5,
                    data_admissao = $6,
                    em_experiencia = $7,
                    data_fim_experiencia = $8
                WHERE id = $1
                RETURNING *
             )
             SELECT {FIELDS} FROM e {JOIN}"
        );
        sqlx::query_as::<_, Employee>(&query)
            .bind(id)
            .bind(&input.nome)
            .bind(input.setor_id)
            .bind(&input.cargo)
            .bind(input.is_active)
            .bind(input.data_admissao)
            .bind(input.em_experiencia)
            .bind(input.data_fim_experiencia)
            .fetch_optional(pool)
            .await
    }

    /// Hard-delete an employee, or mark them inactive when feedback
    /// references them.
    pub async fn delete_or_deactivate(pool: &PgPool, id: DbId) -> Result<Removal, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let exists: Option<DbId> =
            sqlx::query_scalar("SELECT id FROM employees WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Ok(Removal::NotFound);
        }

        let referenced: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM feedback WHERE funcionario_id = $1)",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        let outcome = if referenced {
            sqlx::query("UPDATE employees SET is_active = false WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            Removal::Deactivated
        } else {
            sqlx::query("DELETE FROM employees WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            Removal::Deleted
        };

        tx.commit().await?;
        Ok(outcome)
    }
}
