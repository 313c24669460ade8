//! Idempotent bootstrap of default users and departments.
//!
//! Existing rows (matched by username / department name) are never
//! modified, so this is safe to run on every start.

use sqlx::types::Json;
use sqlx::PgPool;
use feedfort_core::roles::Role;

/// A user to create when absent. The password hash is computed by the
/// caller so this crate stays free of hashing concerns.
#[derive(Debug, Clone)]
pub struct SeedUser {
    pub username: &'static str,
    pub email: &'static str,
    pub password_hash: String,
    pub role: Role,
}

/// Default departments and the attributes their daily feedback rates.
pub const DEFAULT_DEPARTMENTS: [(&str, &str, &[&str]); 6] = [
    (
        "Açougue",
        "Setor responsável pelo corte e venda de carnes",
        &["Limpeza", "Qualidade do Corte", "Atendimento", "Organização", "Pontualidade"],
    ),
    (
        "Padaria",
        "Setor responsável pela produção e venda de pães e doces",
        &["Limpeza", "Qualidade dos Produtos", "Atendimento", "Organização", "Pontualidade"],
    ),
    (
        "Frente de Loja",
        "Setor responsável pelo atendimento ao cliente e caixas",
        &["Limpeza", "Atendimento", "Controle de Sacolas", "Vendas", "Pontualidade"],
    ),
    (
        "Mercearia",
        "Setor responsável pelos produtos de mercearia e abastecimento",
        &["Limpeza", "Abastecimento", "Pontualidade", "Atendimento", "Apoio"],
    ),
    (
        "Administrativo",
        "Setor responsável pelas atividades administrativas",
        &["Organização", "Pontualidade", "Comunicação", "Eficiência", "Apoio"],
    ),
    (
        "Lanchonete",
        "Setor responsável pela preparação e venda de lanches",
        &["Limpeza", "Qualidade dos Produtos", "Atendimento", "Agilidade", "Pontualidade"],
    ),
];

/// Counts of rows actually inserted by [`seed_defaults`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users_created: u64,
    pub departments_created: u64,
}

/// Insert the given users and the default departments where missing.
pub async fn seed_defaults(pool: &PgPool, users: &[SeedUser]) -> Result<SeedReport, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut report = SeedReport::default();

    for user in users {
        let result = sqlx::query(
            "INSERT INTO users (username, email, password_hash, user_type)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT DO NOTHING",
        )
        .bind(user.username)
        .bind(user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .execute(&mut *tx)
        .await?;
        report.users_created += result.rows_affected();
    }

    for (nome, descricao, atributos) in DEFAULT_DEPARTMENTS {
        let result = sqlx::query(
            "INSERT INTO departments (nome, descricao, atributos_avaliacao)
             VALUES ($1, $2, $3)
             ON CONFLICT (nome) DO NOTHING",
        )
        .bind(nome)
        .bind(descricao)
        .bind(Json(atributos))
        .execute(&mut *tx)
        .await?;
        report.departments_created += result.rows_affected();
    }

    tx.commit().await?;

    if report != SeedReport::default() {
        tracing::info!(
            users = report.users_created,
            departments = report.departments_created,
            "Seeded default data"
        );
    }
    Ok(report)
}
