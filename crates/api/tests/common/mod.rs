#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

use feedfort_api::auth::jwt::{generate_token, JwtConfig};
use feedfort_api::auth::password::hash_password;
use feedfort_api::config::{BootstrapConfig, ServerConfig, SheetsConfig};
use feedfort_api::router::build_app_router;
use feedfort_api::state::AppState;
use feedfort_core::roles::Role;
use feedfort_db::models::user::{CreateUser, User};
use feedfort_db::repositories::UserRepo;
use feedfort_sheets::{MemorySheetStore, SheetsExporter};

pub const TEST_PASSWORD: &str = "senha-de-teste";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            expiry_hours: 24,
        },
        sheets: SheetsConfig {
            credentials_file: "credentials.json".to_string(),
            spreadsheet_id: None,
        },
        bootstrap: BootstrapConfig {
            enabled: false,
            admin_password: "admin123".to_string(),
            user_password: "usuario123".to_string(),
        },
    }
}

/// Full application router over an in-memory spreadsheet store with no
/// spreadsheet configured.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_store(pool, Arc::new(MemorySheetStore::new()), None)
}

/// Full application router over the given in-memory store, targeting
/// `spreadsheet_id` when set.
pub fn build_test_app_with_store(
    pool: PgPool,
    store: Arc<MemorySheetStore>,
    spreadsheet_id: Option<&str>,
) -> Router {
    let config = test_config();
    let exporter = SheetsExporter::new(
        pool.clone(),
        store,
        config.sheets.credentials_file.clone(),
        spreadsheet_id.map(str::to_string),
    );
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        exporter: Arc::new(exporter),
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Insert a user with [`TEST_PASSWORD`].
pub async fn create_user(pool: &PgPool, username: &str, role: Role) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            email: format!("{username}@test.com"),
            password_hash: hash_password(TEST_PASSWORD).expect("hashing should succeed"),
            user_type: role,
        },
    )
    .await
    .expect("user creation should succeed")
}

/// A valid session token for `user`, signed with the test secret.
pub fn token_for(user: &User) -> String {
    generate_token(user.id, user.role(), &test_config().jwt).expect("token generation should succeed")
}

/// Create a user and return it with a session token.
pub async fn user_with_token(pool: &PgPool, username: &str, role: Role) -> (User, String) {
    let user = create_user(pool, username, role).await;
    let token = token_for(&user);
    (user, token)
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn body_json(response: Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.expect("request should complete")
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, request("GET", uri, None, None)).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, request("GET", uri, Some(token), None)).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    send(app, request("POST", uri, None, Some(body))).await
}

pub async fn post_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response {
    send(app, request("POST", uri, Some(token), Some(body))).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, request("POST", uri, Some(token), None)).await
}

pub async fn put_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response {
    send(app, request("PUT", uri, Some(token), Some(body))).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, request("DELETE", uri, Some(token), None)).await
}

pub async fn delete_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response {
    send(app, request("DELETE", uri, Some(token), Some(body))).await
}

/// POST an arbitrary body with the given content type.
pub async fn post_raw_auth(
    app: Router,
    uri: &str,
    content_type: &str,
    body: &str,
    token: &str,
) -> Response {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", content_type)
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// Assert the status and return the JSON body.
pub async fn expect_json(response: Response, status: StatusCode) -> Value {
    assert_eq!(response.status(), status);
    body_json(response).await
}
