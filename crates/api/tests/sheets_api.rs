//! HTTP-level tests for the spreadsheet export endpoints, run against the
//! in-memory store.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use common::{
    build_test_app_with_store, expect_json, get_auth, post_auth, post_json_auth, user_with_token,
};
use feedfort_core::roles::Role;
use feedfort_db::models::department::CreateDepartment;
use feedfort_db::models::employee::CreateEmployee;
use feedfort_db::repositories::{DepartmentRepo, EmployeeRepo};
use feedfort_sheets::MemorySheetStore;
use serde_json::{json, Value};
use sqlx::PgPool;

const SHEET: &str = "planilha-teste";
const WORKSHEET: &str = "Feedbacks";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Department "Padaria" with one employee; returns the employee id.
async fn employee_id(pool: &PgPool) -> i64 {
    let setor = DepartmentRepo::create(
        pool,
        &CreateDepartment {
            nome: "Padaria".to_string(),
            descricao: None,
            atributos_avaliacao: vec!["Limpeza".to_string(), "Atendimento".to_string()],
        },
    )
    .await
    .unwrap();
    EmployeeRepo::create(
        pool,
        &CreateEmployee {
            nome: "Carla".to_string(),
            setor_id: setor.id,
            cargo: None,
            data_admissao: chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            em_experiencia: false,
            data_fim_experiencia: None,
        },
    )
    .await
    .unwrap()
    .id
}

async fn create_feedback(app: axum::Router, token: &str, body: Value) -> i64 {
    let json = expect_json(
        post_json_auth(app, "/api/feedback", body, token).await,
        StatusCode::CREATED,
    )
    .await;
    json["id"].as_i64().unwrap()
}

fn ids_in(rows: &[Vec<Value>]) -> Vec<Value> {
    rows.iter().skip(1).map(|r| r[0].clone()).collect()
}

// ---------------------------------------------------------------------------
// Sync
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_sync_one_writes_header_and_row(pool: PgPool) {
    let (_user, token) = user_with_token(&pool, "ana", Role::Comum).await;
    let funcionario_id = employee_id(&pool).await;
    let store = Arc::new(MemorySheetStore::with_spreadsheet(SHEET));
    let app = build_test_app_with_store(pool, store.clone(), Some(SHEET));

    let id = create_feedback(
        app.clone(),
        &token,
        json!({
            "tipo": "diario",
            "funcionario_id": funcionario_id,
            "avaliacoes": { "Limpeza": 4, "Atendimento": 5 }
        }),
    )
    .await;

    let json = expect_json(
        post_json_auth(
            app.clone(),
            "/api/google-sheets-sync",
            json!({ "feedback_id": id }),
            &token,
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(json["message"], "Feedback synchronized successfully");
    assert_eq!(
        json["spreadsheet_url"],
        format!("https://docs.google.com/spreadsheets/d/{SHEET}")
    );
    assert!(json.get("success_count").is_none());

    let rows = store.rows(SHEET, WORKSHEET);
    assert_eq!(rows.len(), 2);
    assert_eq!(
        rows[0],
        vec![
            json!("ID"),
            json!("Data/Hora"),
            json!("Tipo Feedback"),
            json!("Setor"),
            json!("Funcionário"),
            json!("Autor"),
            json!("Atendimento"),
            json!("Limpeza"),
            json!("Descrição"),
        ]
    );
    assert_eq!(rows[1][0], json!(id));
    assert_eq!(rows[1][2], json!("Diario"));
    assert_eq!(rows[1][3], json!("Padaria"));
    assert_eq!(rows[1][6], json!(5));
    assert_eq!(rows[1][7], json!(4));

    let json = expect_json(
        get_auth(app, &format!("/api/feedback/{id}"), &token).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(json["sincronizado_sheets"], true);
    assert!(json["data_sincronizacao"].is_string());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_resync_after_edit_overwrites_the_same_row(pool: PgPool) {
    let (_user, token) = user_with_token(&pool, "ana", Role::Comum).await;
    let funcionario_id = employee_id(&pool).await;
    let store = Arc::new(MemorySheetStore::with_spreadsheet(SHEET));
    let app = build_test_app_with_store(pool, store.clone(), Some(SHEET));

    let id = create_feedback(
        app.clone(),
        &token,
        json!({ "tipo": "negativa", "funcionario_id": funcionario_id, "descricao": "Atraso" }),
    )
    .await;
    let sync = json!({ "feedback_id": id });
    post_json_auth(app.clone(), "/api/google-sheets-sync", sync.clone(), &token).await;

    let response = common::put_json_auth(
        app.clone(),
        &format!("/api/feedback/{id}"),
        json!({ "descricao": "Atraso de 30 minutos" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    post_json_auth(app, "/api/google-sheets-sync", sync, &token).await;

    let rows = store.rows(SHEET, WORKSHEET);
    assert_eq!(ids_in(&rows), vec![json!(id)]);
    assert_eq!(rows[1].last(), Some(&json!("Atraso de 30 minutos")));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_sync_all_reports_counts(pool: PgPool) {
    let (_user, token) = user_with_token(&pool, "ana", Role::Comum).await;
    let funcionario_id = employee_id(&pool).await;
    let store = Arc::new(MemorySheetStore::with_spreadsheet(SHEET));
    let app = build_test_app_with_store(pool, store.clone(), Some(SHEET));

    let mut ids = Vec::new();
    for descricao in ["Um", "Dois", "Três"] {
        let body = json!({ "tipo": "positiva", "funcionario_id": funcionario_id, "descricao": descricao });
        ids.push(create_feedback(app.clone(), &token, body).await);
    }

    let json = expect_json(
        post_auth(app.clone(), "/api/google-sheets-sync", &token).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(json["message"], "3 of 3 feedbacks synchronized");
    assert_eq!(json["success_count"], 3);
    assert_eq!(json["total_count"], 3);
    assert_eq!(
        ids_in(&store.rows(SHEET, WORKSHEET)),
        ids.iter().map(|id| json!(id)).collect::<Vec<_>>()
    );

    // Nothing left to export.
    let json = expect_json(
        post_auth(app.clone(), "/api/google-sheets-sync", &token).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(json["total_count"], 0);

    let json = expect_json(
        get_auth(app, "/api/google-sheets/status", &token).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(json["total_feedbacks"], 3);
    assert_eq!(json["sincronizados"], 3);
    assert_eq!(json["nao_sincronizados"], 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_failed_sync_leaves_records_unsynced(pool: PgPool) {
    let (_user, token) = user_with_token(&pool, "ana", Role::Comum).await;
    let funcionario_id = employee_id(&pool).await;
    let store = Arc::new(MemorySheetStore::with_spreadsheet(SHEET));
    let app = build_test_app_with_store(pool, store.clone(), Some(SHEET));

    let id = create_feedback(
        app.clone(),
        &token,
        json!({ "tipo": "experiencia", "funcionario_id": funcionario_id }),
    )
    .await;
    store.set_unavailable(true);

    let response = post_json_auth(
        app.clone(),
        "/api/google-sheets-sync",
        json!({ "feedback_id": id }),
        &token,
    )
    .await;
    let json = expect_json(response, StatusCode::INTERNAL_SERVER_ERROR).await;
    assert_eq!(json["code"], "EXTERNAL_SERVICE_ERROR");

    let json = expect_json(
        post_auth(app.clone(), "/api/google-sheets-sync", &token).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(json["success_count"], 0);
    assert_eq!(json["total_count"], 1);

    let json = expect_json(
        get_auth(app, "/api/google-sheets/status", &token).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(json["nao_sincronizados"], 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_sync_unknown_feedback_is_not_found(pool: PgPool) {
    let (_user, token) = user_with_token(&pool, "ana", Role::Comum).await;
    let store = Arc::new(MemorySheetStore::with_spreadsheet(SHEET));
    let app = build_test_app_with_store(pool, store, Some(SHEET));

    let response = post_json_auth(
        app,
        "/api/google-sheets-sync",
        json!({ "feedback_id": 424_242 }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_config_round_trip(pool: PgPool) {
    let (_admin, token) = user_with_token(&pool, "admin", Role::Admin).await;
    let store = Arc::new(MemorySheetStore::with_spreadsheet(SHEET));
    let app = build_test_app_with_store(pool, store, None);

    let json = expect_json(
        get_auth(app.clone(), "/api/google-sheets/config", &token).await,
        StatusCode::OK,
    )
    .await;
    assert!(json["spreadsheet_id"].is_null());
    assert_eq!(json["credentials_file"], "credentials.json");
    assert_eq!(json["authenticated"], true);

    let json = expect_json(
        post_json_auth(
            app.clone(),
            "/api/google-sheets/config",
            json!({ "spreadsheet_id": SHEET }),
            &token,
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(json["spreadsheet_id"], SHEET);

    let json = expect_json(
        get_auth(app.clone(), "/api/google-sheets/config", &token).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(json["spreadsheet_id"], SHEET);

    let json = expect_json(
        post_auth(app, "/api/google-sheets/test", &token).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(json["message"], "Connection to the spreadsheet is working");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_config_with_unreachable_spreadsheet_is_bad_request(pool: PgPool) {
    let (_admin, token) = user_with_token(&pool, "admin", Role::Admin).await;
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app.clone(),
        "/api/google-sheets/config",
        json!({ "spreadsheet_id": "nao-existe" }),
        &token,
    )
    .await;
    let json = expect_json(response, StatusCode::BAD_REQUEST).await;
    assert!(json["error"]
        .as_str()
        .unwrap()
        .starts_with("Could not access spreadsheet"));

    let response = post_json_auth(app, "/api/google-sheets/config", json!({}), &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_connection_without_spreadsheet_is_bad_request(pool: PgPool) {
    let (_admin, token) = user_with_token(&pool, "admin", Role::Admin).await;
    let app = common::build_test_app(pool);

    let response = post_auth(app, "/api/google-sheets/test", &token).await;
    let json = expect_json(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(json["error"], "No spreadsheet configured");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_spreadsheet_becomes_the_target(pool: PgPool) {
    let (_admin, token) = user_with_token(&pool, "admin", Role::Admin).await;
    employee_id(&pool).await;
    let store = Arc::new(MemorySheetStore::new());
    let app = build_test_app_with_store(pool, store.clone(), None);

    let json = expect_json(
        post_json_auth(
            app.clone(),
            "/api/google-sheets/create",
            json!({ "title": "Feedback 2024" }),
            &token,
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    let id = json["spreadsheet_id"].as_str().unwrap().to_string();
    assert!(json["spreadsheet_url"].as_str().unwrap().ends_with(&id));

    let rows = store.rows(&id, WORKSHEET);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0], json!("ID"));

    let json = expect_json(
        get_auth(app, "/api/google-sheets/status", &token).await,
        StatusCode::OK,
    )
    .await;
    assert!(json["spreadsheet_url"].as_str().unwrap().ends_with(&id));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_spreadsheet_management_requires_admin(pool: PgPool) {
    let (_user, token) = user_with_token(&pool, "ana", Role::Comum).await;
    let app = common::build_test_app(pool);

    let response = get_auth(app.clone(), "/api/google-sheets/config", &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let response = post_auth(app.clone(), "/api/google-sheets/create", &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let response = post_auth(app.clone(), "/api/google-sheets/test", &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get_auth(app, "/api/google-sheets/status", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
}
