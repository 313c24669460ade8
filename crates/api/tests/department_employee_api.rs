//! HTTP-level tests for departments, their attribute vocabularies and
//! employees.

mod common;

use axum::http::StatusCode;
use common::{
    delete_auth, delete_json_auth, expect_json, get_auth, post_json_auth, put_json_auth,
    user_with_token,
};
use feedfort_core::roles::Role;
use serde_json::{json, Value};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn admin_token(pool: &PgPool) -> String {
    user_with_token(pool, "admin", Role::Admin).await.1
}

async fn create_department(pool: &PgPool, token: &str, nome: &str, attrs: &[&str]) -> Value {
    let app = common::build_test_app(pool.clone());
    let body = json!({ "nome": nome, "atributos_avaliacao": attrs });
    expect_json(
        post_json_auth(app, "/api/setores", body, token).await,
        StatusCode::CREATED,
    )
    .await
}

async fn create_employee(pool: &PgPool, token: &str, body: Value) -> Value {
    let app = common::build_test_app(pool.clone());
    expect_json(
        post_json_auth(app, "/api/funcionarios", body, token).await,
        StatusCode::CREATED,
    )
    .await
}

// ---------------------------------------------------------------------------
// Departments
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_department_normalizes_attributes(pool: PgPool) {
    let token = admin_token(&pool).await;

    let json = create_department(
        &pool,
        &token,
        "Padaria",
        &["Limpeza", " Atendimento ", "", "Limpeza"],
    )
    .await;

    assert_eq!(json["nome"], "Padaria");
    assert_eq!(json["descricao"], "");
    assert_eq!(json["atributos_avaliacao"], json!(["Limpeza", "Atendimento"]));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_department_names_are_unique(pool: PgPool) {
    let token = admin_token(&pool).await;
    let first = create_department(&pool, &token, "Padaria", &[]).await;
    create_department(&pool, &token, "Açougue", &[]).await;
    let app = common::build_test_app(pool);

    let response =
        post_json_auth(app.clone(), "/api/setores", json!({ "nome": "Padaria" }), &token).await;
    let json = expect_json(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(json["code"], "CONFLICT");
    assert_eq!(json["error"], "Department already exists");

    let response = put_json_auth(
        app.clone(),
        &format!("/api/setores/{}", first["id"]),
        json!({ "nome": "Açougue" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Renaming to its own name is not a conflict.
    let response = put_json_auth(
        app,
        &format!("/api/setores/{}", first["id"]),
        json!({ "nome": "Padaria", "descricao": "Pães e bolos" }),
        &token,
    )
    .await;
    let json = expect_json(response, StatusCode::OK).await;
    assert_eq!(json["descricao"], "Pães e bolos");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_department_mutations_require_admin(pool: PgPool) {
    let (_user, token) = user_with_token(&pool, "ana", Role::Comum).await;
    let app = common::build_test_app(pool);

    let response =
        post_json_auth(app.clone(), "/api/setores", json!({ "nome": "Padaria" }), &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get_auth(app, "/api/setores", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_attribute_edits_are_idempotent(pool: PgPool) {
    let token = admin_token(&pool).await;
    let setor = create_department(&pool, &token, "Padaria", &["Limpeza"]).await;
    let uri = format!("/api/setores/{}/atributos", setor["id"]);
    let app = common::build_test_app(pool);

    for _ in 0..2 {
        let response =
            post_json_auth(app.clone(), &uri, json!({ "atributo": "Vendas" }), &token).await;
        let json = expect_json(response, StatusCode::OK).await;
        assert_eq!(json["atributos_avaliacao"], json!(["Limpeza", "Vendas"]));
    }

    for _ in 0..2 {
        let response =
            delete_json_auth(app.clone(), &uri, json!({ "atributo": "Limpeza" }), &token).await;
        let json = expect_json(response, StatusCode::OK).await;
        assert_eq!(json["atributos_avaliacao"], json!(["Vendas"]));
    }

    let response = post_json_auth(app, &uri, json!({ "atributo": "  " }), &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_attribute_lookup_by_name_or_id(pool: PgPool) {
    let token = admin_token(&pool).await;
    let setor = create_department(&pool, &token, "Padaria", &["Limpeza", "Atendimento"]).await;
    let app = common::build_test_app(pool);

    let json = expect_json(
        get_auth(app.clone(), "/api/atributos?setor=Padaria", &token).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(json["setor_id"], setor["id"]);
    assert_eq!(json["setor_nome"], "Padaria");
    assert_eq!(json["atributos"], json!(["Limpeza", "Atendimento"]));

    let uri = format!("/api/atributos?setor_id={}", setor["id"]);
    let json = expect_json(get_auth(app.clone(), &uri, &token).await, StatusCode::OK).await;
    assert_eq!(json["setor_nome"], "Padaria");

    let response = get_auth(app.clone(), "/api/atributos?setor=Inexistente", &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get_auth(app, "/api/atributos", &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_department_with_employees_cannot_be_deleted(pool: PgPool) {
    let token = admin_token(&pool).await;
    let setor = create_department(&pool, &token, "Padaria", &[]).await;
    let vazio = create_department(&pool, &token, "Vazio", &[]).await;
    let funcionario = create_employee(
        &pool,
        &token,
        json!({ "nome": "Carla", "setor_id": setor["id"] }),
    )
    .await;
    let app = common::build_test_app(pool.clone());

    let uri = format!("/api/setores/{}", setor["id"]);
    let json = expect_json(delete_auth(app.clone(), &uri, &token).await, StatusCode::BAD_REQUEST).await;
    assert_eq!(json["code"], "CONFLICT");

    // Inactive employees still block the delete.
    put_json_auth(
        app.clone(),
        &format!("/api/funcionarios/{}", funcionario["id"]),
        json!({ "is_active": false }),
        &token,
    )
    .await;
    let response = delete_auth(app.clone(), &uri, &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let uri = format!("/api/setores/{}", vazio["id"]);
    let response = delete_auth(app.clone(), &uri, &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = get_auth(app, &uri, &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Employees
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_probation_end_is_derived_from_admission(pool: PgPool) {
    let token = admin_token(&pool).await;
    let setor = create_department(&pool, &token, "Padaria", &[]).await;

    let json = create_employee(
        &pool,
        &token,
        json!({
            "nome": "Carla",
            "setor_id": setor["id"],
            "data_admissao": "2024-01-01",
            "em_experiencia": true
        }),
    )
    .await;

    assert_eq!(json["data_admissao"], "2024-01-01");
    assert_eq!(json["data_fim_experiencia"], "2024-02-15");
    assert_eq!(json["setor_nome"], "Padaria");
    assert_eq!(json["cargo"], "");
    assert_eq!(json["is_active"], true);
    // Probation ended long ago.
    assert_eq!(json["dias_restantes_experiencia"], 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_explicit_probation_end_wins(pool: PgPool) {
    let token = admin_token(&pool).await;
    let setor = create_department(&pool, &token, "Padaria", &[]).await;

    let json = create_employee(
        &pool,
        &token,
        json!({
            "nome": "Carla",
            "setor_id": setor["id"],
            "data_admissao": "2024-01-01",
            "em_experiencia": true,
            "data_fim_experiencia": "2024-03-01"
        }),
    )
    .await;
    assert_eq!(json["data_fim_experiencia"], "2024-03-01");

    let json = create_employee(
        &pool,
        &token,
        json!({
            "nome": "Davi",
            "setor_id": setor["id"],
            "data_admissao": "2024-01-01",
            "data_fim_experiencia": "2024-03-01"
        }),
    )
    .await;
    assert!(json["data_fim_experiencia"].is_null());
    assert!(json["dias_restantes_experiencia"].is_null());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_employee_validation(pool: PgPool) {
    let token = admin_token(&pool).await;
    let setor = create_department(&pool, &token, "Padaria", &[]).await;
    let app = common::build_test_app(pool);

    for body in [
        json!({ "setor_id": setor["id"] }),
        json!({ "nome": "   ", "setor_id": setor["id"] }),
        json!({ "nome": "Carla" }),
        json!({ "nome": "Carla", "setor_id": setor["id"], "data_admissao": "01/01/2024" }),
    ] {
        let response =
            post_json_auth(app.clone(), "/api/funcionarios", body.clone(), &token).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
    }

    let response = post_json_auth(
        app,
        "/api/funcionarios",
        json!({ "nome": "Carla", "setor_id": 999_999 }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_employee_toggles_probation(pool: PgPool) {
    let token = admin_token(&pool).await;
    let setor = create_department(&pool, &token, "Padaria", &[]).await;
    let funcionario = create_employee(
        &pool,
        &token,
        json!({ "nome": "Carla", "setor_id": setor["id"], "data_admissao": "2024-01-01" }),
    )
    .await;
    let uri = format!("/api/funcionarios/{}", funcionario["id"]);
    let app = common::build_test_app(pool);

    let json = expect_json(
        put_json_auth(app.clone(), &uri, json!({ "em_experiencia": true }), &token).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(json["em_experiencia"], true);
    assert_eq!(json["data_fim_experiencia"], "2024-02-15");

    let json = expect_json(
        put_json_auth(app.clone(), &uri, json!({ "cargo": "Padeira" }), &token).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(json["cargo"], "Padeira");
    assert_eq!(json["data_fim_experiencia"], "2024-02-15");
    assert_eq!(json["nome"], "Carla");

    let json = expect_json(
        put_json_auth(app, &uri, json!({ "em_experiencia": false }), &token).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(json["em_experiencia"], false);
    assert!(json["data_fim_experiencia"].is_null());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_employees_filters(pool: PgPool) {
    let token = admin_token(&pool).await;
    let padaria = create_department(&pool, &token, "Padaria", &[]).await;
    let caixa = create_department(&pool, &token, "Caixa", &[]).await;
    let today = chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string();

    create_employee(
        &pool,
        &token,
        json!({
            "nome": "Carla",
            "setor_id": padaria["id"],
            "data_admissao": today,
            "em_experiencia": true
        }),
    )
    .await;
    create_employee(
        &pool,
        &token,
        json!({
            "nome": "Davi",
            "setor_id": padaria["id"],
            "data_admissao": "2020-01-01",
            "em_experiencia": true
        }),
    )
    .await;
    create_employee(&pool, &token, json!({ "nome": "Eva", "setor_id": caixa["id"] })).await;
    let app = common::build_test_app(pool);

    let all = expect_json(get_auth(app.clone(), "/api/funcionarios", &token).await, StatusCode::OK).await;
    assert_eq!(all.as_array().unwrap().len(), 3);

    let json = expect_json(
        get_auth(app.clone(), "/api/funcionarios?setor=Padaria", &token).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(json.as_array().unwrap().len(), 2);

    let uri = format!("/api/funcionarios?setor_id={}", caixa["id"]);
    let json = expect_json(get_auth(app.clone(), &uri, &token).await, StatusCode::OK).await;
    assert_eq!(json[0]["nome"], "Eva");

    let json = expect_json(
        get_auth(app.clone(), "/api/funcionarios?em_experiencia=true", &token).await,
        StatusCode::OK,
    )
    .await;
    let in_probation = json.as_array().unwrap();
    assert_eq!(in_probation.len(), 1);
    assert_eq!(in_probation[0]["nome"], "Carla");
    assert_eq!(in_probation[0]["dias_restantes_experiencia"], 45);

    let response = get_auth(app, "/api/funcionarios?setor=Inexistente", &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_employee_with_feedback_is_deactivated_not_deleted(pool: PgPool) {
    let token = admin_token(&pool).await;
    let setor = create_department(&pool, &token, "Padaria", &[]).await;
    let carla = create_employee(&pool, &token, json!({ "nome": "Carla", "setor_id": setor["id"] })).await;
    let davi = create_employee(&pool, &token, json!({ "nome": "Davi", "setor_id": setor["id"] })).await;
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app.clone(),
        "/api/feedback",
        json!({ "tipo": "positiva", "funcionario_id": carla["id"], "descricao": "Ótima" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let uri = format!("/api/funcionarios/{}", carla["id"]);
    let json = expect_json(delete_auth(app.clone(), &uri, &token).await, StatusCode::OK).await;
    assert_eq!(json["message"], "Employee has feedback records and was marked inactive");

    let json = expect_json(get_auth(app.clone(), &uri, &token).await, StatusCode::OK).await;
    assert_eq!(json["is_active"], false);

    let list = expect_json(get_auth(app.clone(), "/api/funcionarios", &token).await, StatusCode::OK).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let uri = format!("/api/funcionarios/{}", davi["id"]);
    let response = delete_auth(app.clone(), &uri, &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = get_auth(app, &uri, &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
