//! Repository for the `feedback` table.
//!
//! Reads join the employee, department and author so callers never need a
//! second round-trip to render a record.

use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres};
use feedfort_core::feedback::EVOLUTION_SCORE_KEY;
use feedfort_core::types::{DbId, Timestamp};

use crate::models::feedback::{
    CreateFeedback, DailyAverage, DepartmentCounts, Feedback, FeedbackCounts, FeedbackFilter,
    SyncCounts, UpdateFeedback,
};

const FIELDS: &str = "f.id, f.tipo, f.funcionario_id, e.nome AS funcionario_nome, \
                       e.setor_id, d.nome AS setor_nome, f.autor_id, \
                       u.username AS autor_username, f.data_feedback, f.avaliacoes, \
                       f.descricao, f.detalhes, f.recomenda_efetivacao, \
                       f.sincronizado_sheets, f.data_sincronizacao, f.created_at, f.updated_at";

const JOINS: &str = "JOIN employees e ON e.id = f.funcionario_id \
                     JOIN departments d ON d.id = e.setor_id \
                     JOIN users u ON u.id = f.autor_id";

/// Filter predicate over `f` (feedback) and `e` (employee), bound by
/// [`bind_filter`] as `$1..$6`.
const FILTER: &str = "($1::BIGINT IS NULL OR f.funcionario_id = $1) \
                      AND ($2::BIGINT IS NULL OR e.setor_id = $2) \
                      AND ($3::TEXT IS NULL OR f.tipo = $3) \
                      AND ($4::BIGINT IS NULL OR f.autor_id = $4) \
                      AND ($5::TIMESTAMPTZ IS NULL OR f.data_feedback >= $5) \
                      AND ($6::TIMESTAMPTZ IS NULL OR f.data_feedback <= $6)";

/// Per-type counters over whatever rows `f` ranges over.
const COUNTERS: &str = "COUNT(f.id) AS total_feedbacks, \
     COUNT(f.id) FILTER (WHERE f.tipo = 'diario') AS feedbacks_diarios, \
     COUNT(f.id) FILTER (WHERE f.tipo = 'positiva') AS feedbacks_positivos, \
     COUNT(f.id) FILTER (WHERE f.tipo = 'negativa') AS feedbacks_negativos, \
     COUNT(f.id) FILTER (WHERE f.tipo = 'experiencia') AS feedbacks_experiencia, \
     COUNT(f.id) FILTER (WHERE f.tipo = 'diario_experiencia') AS feedbacks_diario_experiencia, \
     COUNT(f.id) FILTER (WHERE f.tipo = 'final_experiencia') AS feedbacks_final_experiencia";

fn bind_filter<'q, O>(
    query: QueryAs<'q, Postgres, O, PgArguments>,
    filter: &FeedbackFilter,
) -> QueryAs<'q, Postgres, O, PgArguments> {
    query
        .bind(filter.funcionario_id)
        .bind(filter.setor_id)
        .bind(filter.tipo.map(|t| t.as_str()))
        .bind(filter.autor_id)
        .bind(filter.data_inicio)
        .bind(filter.data_fim)
}

/// Provides CRUD, aggregate and export-state queries for feedback.
pub struct FeedbackRepo;

impl FeedbackRepo {
    /// Insert a new record for an active employee.
    ///
    /// The active check and the insert are one statement; returns `None`
    /// when the employee is missing or inactive.
    pub async fn create(
        pool: &PgPool,
        input: &CreateFeedback,
    ) -> Result<Option<Feedback>, sqlx::Error> {
        let query = format!(
            "WITH f AS (
                INSERT INTO feedback
                    (tipo, funcionario_id, autor_id, avaliacoes, descricao, detalhes,
                     recomenda_efetivacao)
                SELECT $1::TEXT, $2::BIGINT, $3::BIGINT, $4::JSONB, $5::TEXT, $6::TEXT,
                       $7::BOOLEAN
                WHERE EXISTS (SELECT 1 FROM employees WHERE id = $2 AND is_active = true)
                RETURNING *
             )
             SELECT {FIELDS} FROM f {JOINS}"
        );
        sqlx::query_as::<_, Feedback>(&query)
            .bind(input.tipo.as_str())
            .bind(input.funcionario_id)
            .bind(input.autor_id)
            .bind(input.avaliacoes.as_ref().map(Json))
            .bind(&input.descricao)
            .bind(&input.detalhes)
            .bind(input.recomenda_efetivacao)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Feedback>, sqlx::Error> {
        let query = format!("SELECT {FIELDS} FROM feedback f {JOINS} WHERE f.id = $1");
        sqlx::query_as::<_, Feedback>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List records matching `filter`, most recent first.
    pub async fn list(
        pool: &PgPool,
        filter: &FeedbackFilter,
    ) -> Result<Vec<Feedback>, sqlx::Error> {
        let query = format!(
            "SELECT {FIELDS} FROM feedback f {JOINS}
             WHERE {FILTER}
             ORDER BY f.data_feedback DESC, f.id DESC"
        );
        bind_filter(sqlx::query_as::<_, Feedback>(&query), filter)
            .fetch_all(pool)
            .await
    }

    /// Apply an edit. Any edit clears the export state.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateFeedback,
    ) -> Result<Option<Feedback>, sqlx::Error> {
        let query = format!(
            "WITH f AS (
                UPDATE feedback SET
                    tipo = COALESCE($2, tipo),
                    funcionario_id = COALESCE($3, funcionario_id),
                    avaliacoes = COALESCE($4, avaliacoes),
                    descricao = COALESCE($5, descricao),
                    sincronizado_sheets = false,
                    data_sincronizacao = NULL
                WHERE id = $1
                RETURNING *
             )
             SELECT {FIELDS} FROM f {JOINS}"
        );
        sqlx::query_as::<_, Feedback>(&query)
            .bind(id)
            .bind(input.tipo.map(|t| t.as_str()))
            .bind(input.funcionario_id)
            .bind(input.avaliacoes.as_ref().map(Json))
            .bind(&input.descricao)
            .fetch_optional(pool)
            .await
    }

    /// Hard-delete a record. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM feedback WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Per-type counts over the records matching `filter`.
    pub async fn counts(
        pool: &PgPool,
        filter: &FeedbackFilter,
    ) -> Result<FeedbackCounts, sqlx::Error> {
        let query = format!(
            "SELECT {COUNTERS}
             FROM feedback f JOIN employees e ON e.id = f.funcionario_id
             WHERE {FILTER}"
        );
        bind_filter(sqlx::query_as::<_, FeedbackCounts>(&query), filter)
            .fetch_one(pool)
            .await
    }

    /// The same counts broken down by department. Every department is
    /// listed, with zero counts where nothing matches.
    pub async fn counts_by_department(
        pool: &PgPool,
        filter: &FeedbackFilter,
    ) -> Result<Vec<DepartmentCounts>, sqlx::Error> {
        let query = format!(
            "SELECT d.id AS setor_id, d.nome AS setor_nome, {COUNTERS}
             FROM departments d
             LEFT JOIN employees e ON e.setor_id = d.id
             LEFT JOIN feedback f ON f.funcionario_id = e.id AND {FILTER}
             GROUP BY d.id, d.nome
             ORDER BY d.nome"
        );
        bind_filter(sqlx::query_as::<_, DepartmentCounts>(&query), filter)
            .fetch_all(pool)
            .await
    }

    /// Mean of the numeric `nota` sub-field of probation daily ratings,
    /// per UTC calendar day, oldest first. Records without a numeric
    /// `nota` are left out.
    pub async fn daily_evolution(pool: &PgPool) -> Result<Vec<DailyAverage>, sqlx::Error> {
        sqlx::query_as::<_, DailyAverage>(
            "SELECT (f.data_feedback AT TIME ZONE 'UTC')::DATE AS dia,
                    AVG((f.avaliacoes ->> $1::TEXT)::FLOAT8) AS media
             FROM feedback f
             WHERE f.tipo = 'diario_experiencia'
               AND jsonb_typeof(f.avaliacoes -> $1::TEXT) = 'number'
             GROUP BY dia
             ORDER BY dia",
        )
        .bind(EVOLUTION_SCORE_KEY)
        .fetch_all(pool)
        .await
    }

    /// IDs of every record not yet exported, oldest first.
    pub async fn unsynced_ids(pool: &PgPool) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT id FROM feedback WHERE sincronizado_sheets = false ORDER BY id",
        )
        .fetch_all(pool)
        .await
    }

    /// Record a successful export of the version last modified at `exported_at`.
    ///
    /// Returns `false` when the row is gone or was edited since that read,
    /// in which case it stays unsynced.
    pub async fn mark_synced(
        pool: &PgPool,
        id: DbId,
        exported_at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE feedback SET sincronizado_sheets = true, data_sincronizacao = NOW()
             WHERE id = $1 AND updated_at = $2",
        )
        .bind(id)
        .bind(exported_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn sync_counts(pool: &PgPool) -> Result<SyncCounts, sqlx::Error> {
        sqlx::query_as::<_, SyncCounts>(
            "SELECT COUNT(*) AS total_feedbacks,
                    COUNT(*) FILTER (WHERE sincronizado_sheets) AS sincronizados,
                    COUNT(*) FILTER (WHERE NOT sincronizado_sheets) AS nao_sincronizados
             FROM feedback",
        )
        .fetch_one(pool)
        .await
    }
}
