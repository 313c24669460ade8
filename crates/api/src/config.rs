use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development,
/// except `JWT_SECRET` and `DATABASE_URL` which must be provided.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `5000`).
    pub port: u16,
    /// Allowed CORS origins. A single `*` allows any origin.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    pub jwt: JwtConfig,
    pub sheets: SheetsConfig,
    pub bootstrap: BootstrapConfig,
}

/// Where the spreadsheet export authenticates and writes.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    /// Path to the service-account JSON key.
    pub credentials_file: String,
    /// Spreadsheet used until one is configured through the API.
    pub spreadsheet_id: Option<String>,
}

/// Default data seeded on start.
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    pub enabled: bool,
    pub admin_password: String,
    pub user_password: String,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                          | Default            |
    /// |----------------------------------|--------------------|
    /// | `HOST`                           | `0.0.0.0`          |
    /// | `PORT`                           | `5000`             |
    /// | `CORS_ORIGINS`                   | `*`                |
    /// | `REQUEST_TIMEOUT_SECS`           | `30`               |
    /// | `GOOGLE_SHEETS_CREDENTIALS_FILE` | `credentials.json` |
    /// | `GOOGLE_SHEETS_SPREADSHEET_ID`   | (none)             |
    /// | `BOOTSTRAP_DEFAULT_DATA`         | `true`             |
    /// | `BOOTSTRAP_ADMIN_PASSWORD`       | `admin123`         |
    /// | `BOOTSTRAP_USER_PASSWORD`        | `usuario123`       |
    ///
    /// JWT settings are documented on [`JwtConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "5000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let sheets = SheetsConfig {
            credentials_file: std::env::var("GOOGLE_SHEETS_CREDENTIALS_FILE")
                .unwrap_or_else(|_| "credentials.json".into()),
            spreadsheet_id: std::env::var("GOOGLE_SHEETS_SPREADSHEET_ID")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        };

        let bootstrap = BootstrapConfig {
            enabled: std::env::var("BOOTSTRAP_DEFAULT_DATA")
                .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "false" | "0" | "no"))
                .unwrap_or(true),
            admin_password: std::env::var("BOOTSTRAP_ADMIN_PASSWORD")
                .unwrap_or_else(|_| "admin123".into()),
            user_password: std::env::var("BOOTSTRAP_USER_PASSWORD")
                .unwrap_or_else(|_| "usuario123".into()),
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig::from_env(),
            sheets,
            bootstrap,
        }
    }

    /// Whether CORS is configured to accept any origin.
    pub fn cors_allows_any(&self) -> bool {
        self.cors_origins.is_empty() || self.cors_origins.iter().any(|o| o == "*")
    }
}
