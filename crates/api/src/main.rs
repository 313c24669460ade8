use std::net::SocketAddr;
use std::sync::Arc;

use feedfort_core::roles::Role;
use feedfort_db::seed::{seed_defaults, SeedUser};
use feedfort_sheets::{GoogleSheetsClient, SheetsExporter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feedfort_api::auth::password::hash_password;
use feedfort_api::config::ServerConfig;
use feedfort_api::router::build_app_router;
use feedfort_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "feedfort_api=debug,feedfort_sheets=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = feedfort_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    feedfort_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    feedfort_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Default data ---
    if config.bootstrap.enabled {
        let users = [
            SeedUser {
                username: "admin",
                email: "admin@feedback.com",
                password_hash: hash_password(&config.bootstrap.admin_password)
                    .expect("Failed to hash bootstrap admin password"),
                role: Role::Admin,
            },
            SeedUser {
                username: "usuario",
                email: "usuario@feedback.com",
                password_hash: hash_password(&config.bootstrap.user_password)
                    .expect("Failed to hash bootstrap user password"),
                role: Role::Comum,
            },
        ];
        let report = seed_defaults(&pool, &users)
            .await
            .expect("Failed to seed default data");
        tracing::info!(
            users_created = report.users_created,
            departments_created = report.departments_created,
            "Default data ensured"
        );
    }

    // --- Spreadsheet export ---
    let sheets_client = Arc::new(GoogleSheetsClient::new(
        config.sheets.credentials_file.clone(),
    ));
    let exporter = Arc::new(SheetsExporter::new(
        pool.clone(),
        sheets_client,
        config.sheets.credentials_file.clone(),
        config.sheets.spreadsheet_id.clone(),
    ));
    tracing::info!(
        credentials_file = %config.sheets.credentials_file,
        "Spreadsheet export configured"
    );

    // --- App state ---
    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config.clone()),
        exporter,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    pool.close().await;
    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
