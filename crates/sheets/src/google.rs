//! Google Sheets v4 REST client authenticated as a service account.
//!
//! Access tokens are obtained with the OAuth 2.0 JWT-bearer grant: an
//! RS256 assertion signed with the service account's private key is
//! exchanged at the account's `token_uri`. Tokens are cached until shortly
//! before they expire.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use feedfort_core::export::column_letter;

use crate::error::SheetsError;
use crate::store::{cell_text, SheetStore};

const SHEETS_API_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const SCOPES: &str =
    "https://www.googleapis.com/auth/spreadsheets https://www.googleapis.com/auth/drive";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for each signed assertion.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Refresh a cached token this long before it actually expires.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// The fields of a service-account JSON key file that we use.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedSpreadsheet {
    spreadsheet_id: String,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetSheets {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// HTTP client for the Google Sheets API.
///
/// The credential file is read on every token refresh, so replacing it
/// takes effect without a restart.
pub struct GoogleSheetsClient {
    client: reqwest::Client,
    credentials_file: String,
    token: Mutex<Option<CachedToken>>,
}

impl GoogleSheetsClient {
    pub fn new(credentials_file: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), credentials_file)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, credentials_file: impl Into<String>) -> Self {
        Self {
            client,
            credentials_file: credentials_file.into(),
            token: Mutex::new(None),
        }
    }

    pub fn credentials_file(&self) -> &str {
        &self.credentials_file
    }

    async fn load_key(&self) -> Result<ServiceAccountKey, SheetsError> {
        let credentials = |message: String| SheetsError::Credentials {
            path: self.credentials_file.clone(),
            message,
        };
        let raw = tokio::fs::read_to_string(&self.credentials_file)
            .await
            .map_err(|e| credentials(e.to_string()))?;
        serde_json::from_str(&raw).map_err(|e| credentials(e.to_string()))
    }

    /// Return a valid access token, exchanging a fresh assertion if the
    /// cached one is missing or about to expire.
    async fn access_token(&self) -> Result<String, SheetsError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() + TOKEN_REFRESH_MARGIN {
                return Ok(token.access_token.clone());
            }
        }

        let key = self.load_key().await?;
        let now = chrono::Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &key.client_email,
            scope: SCOPES,
            aud: &key.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| SheetsError::Auth(format!("invalid private key: {e}")))?;
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &signing_key)
            .map_err(|e| SheetsError::Auth(e.to_string()))?;

        let response = self
            .client
            .post(&key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;
        let token: TokenResponse = Self::parse_response(response).await.map_err(|e| match e {
            SheetsError::Api { status, body } => {
                SheetsError::Auth(format!("token endpoint returned {status}: {body}"))
            }
            other => other,
        })?;

        tracing::debug!(expires_in = token.expires_in, "Obtained Google access token");
        *cached = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });
        Ok(token.access_token)
    }

    /// Build `{base}/{segments...}` with each segment percent-encoded.
    fn url(segments: &[&str]) -> Result<Url, SheetsError> {
        let mut url =
            Url::parse(SHEETS_API_URL).map_err(|e| SheetsError::MalformedResponse(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| SheetsError::MalformedResponse("base URL cannot have a path".into()))?
            .extend(segments);
        Ok(url)
    }

    async fn get_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        major_dimension: &str,
    ) -> Result<Vec<Vec<Value>>, SheetsError> {
        let url = Self::url(&[spreadsheet_id, "values", range])?;
        let token = self.access_token().await?;
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(&[("majorDimension", major_dimension)])
            .send()
            .await?;
        let body: ValueRange = Self::parse_response(response).await?;
        Ok(body.values)
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, SheetsError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(SheetsError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, SheetsError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// Assert the response has a success status code, discarding the body.
    async fn check_status(response: reqwest::Response) -> Result<(), SheetsError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

/// A1 notation scoped to a worksheet, e.g. `'Feedbacks'!A1:H1`.
pub fn a1_range(worksheet: &str, range: &str) -> String {
    format!("'{}'!{}", worksheet.replace('\'', "''"), range)
}

#[async_trait]
impl SheetStore for GoogleSheetsClient {
    async fn authenticate(&self) -> Result<(), SheetsError> {
        self.access_token().await.map(|_| ())
    }

    async fn check_access(&self, spreadsheet_id: &str) -> Result<(), SheetsError> {
        let url = Self::url(&[spreadsheet_id])?;
        let token = self.access_token().await?;
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(&[("fields", "spreadsheetId")])
            .send()
            .await?;
        Self::check_status(response).await
    }

    async fn create_spreadsheet(
        &self,
        title: &str,
        worksheet: &str,
    ) -> Result<String, SheetsError> {
        let token = self.access_token().await?;
        let body = json!({
            "properties": { "title": title },
            "sheets": [{ "properties": { "title": worksheet } }],
        });
        let response = self
            .client
            .post(SHEETS_API_URL)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        let created: CreatedSpreadsheet = Self::parse_response(response).await?;
        Ok(created.spreadsheet_id)
    }

    async fn ensure_worksheet(
        &self,
        spreadsheet_id: &str,
        worksheet: &str,
    ) -> Result<(), SheetsError> {
        let url = Self::url(&[spreadsheet_id])?;
        let token = self.access_token().await?;
        let response = self
            .client
            .get(url)
            .bearer_auth(&token)
            .query(&[("fields", "sheets.properties.title")])
            .send()
            .await?;
        let existing: SpreadsheetSheets = Self::parse_response(response).await?;
        if existing.sheets.iter().any(|s| s.properties.title == worksheet) {
            return Ok(());
        }

        tracing::info!(spreadsheet_id, worksheet, "Creating worksheet");
        let url = Self::url(&[&format!("{spreadsheet_id}:batchUpdate")])?;
        let body = json!({
            "requests": [{ "addSheet": { "properties": { "title": worksheet } } }],
        });
        let response = self
            .client
            .post(url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await?;
        Self::check_status(response).await
    }

    async fn read_row(
        &self,
        spreadsheet_id: &str,
        worksheet: &str,
        row: usize,
    ) -> Result<Vec<String>, SheetsError> {
        let range = a1_range(worksheet, &format!("{row}:{row}"));
        let rows = self.get_values(spreadsheet_id, &range, "ROWS").await?;
        Ok(rows
            .into_iter()
            .next()
            .map(|cells| cells.iter().map(cell_text).collect())
            .unwrap_or_default())
    }

    async fn read_column(
        &self,
        spreadsheet_id: &str,
        worksheet: &str,
        column: usize,
    ) -> Result<Vec<String>, SheetsError> {
        let letter = column_letter(column);
        let range = a1_range(worksheet, &format!("{letter}:{letter}"));
        let columns = self.get_values(spreadsheet_id, &range, "COLUMNS").await?;
        Ok(columns
            .into_iter()
            .next()
            .map(|cells| cells.iter().map(cell_text).collect())
            .unwrap_or_default())
    }

    async fn write_row(
        &self,
        spreadsheet_id: &str,
        worksheet: &str,
        row: usize,
        values: &[Value],
    ) -> Result<(), SheetsError> {
        let range = a1_range(
            worksheet,
            &feedfort_core::export::row_range(row, values.len()),
        );
        let url = Self::url(&[spreadsheet_id, "values", &range])?;
        let token = self.access_token().await?;
        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": [values],
        });
        let response = self
            .client
            .put(url)
            .bearer_auth(token)
            .query(&[("valueInputOption", "USER_ENTERED")])
            .json(&body)
            .send()
            .await?;
        Self::check_status(response).await
    }

    async fn append_row(
        &self,
        spreadsheet_id: &str,
        worksheet: &str,
        values: &[Value],
    ) -> Result<(), SheetsError> {
        let range = a1_range(worksheet, "A1");
        let url = Self::url(&[spreadsheet_id, "values", &format!("{range}:append")])?;
        let token = self.access_token().await?;
        let body = json!({
            "majorDimension": "ROWS",
            "values": [values],
        });
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .query(&[
                ("valueInputOption", "USER_ENTERED"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&body)
            .send()
            .await?;
        Self::check_status(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn a1_range_quotes_worksheet_titles() {
        assert_eq!(a1_range("Feedbacks", "A1"), "'Feedbacks'!A1");
        assert_eq!(a1_range("Bob's", "1:1"), "'Bob''s'!1:1");
    }

    #[test]
    fn url_percent_encodes_ranges() {
        let url = GoogleSheetsClient::url(&["abc", "values", "'Minha Aba'!A1:H1"]).unwrap();
        assert!(url.as_str().starts_with(SHEETS_API_URL));
        assert!(url.path().contains("Minha%20Aba"));
        assert!(url.path().ends_with("A1:H1"));
    }

    #[test]
    fn key_file_defaults_token_uri() {
        let key: ServiceAccountKey = serde_json::from_str(
            r#"{"client_email": "svc@example.iam.gserviceaccount.com", "private_key": "k"}"#,
        )
        .unwrap();
        assert_eq!(key.token_uri, DEFAULT_TOKEN_URI);
    }

    #[tokio::test]
    async fn missing_credentials_file_is_reported_with_its_path() {
        let client = GoogleSheetsClient::new("/nonexistent/credentials.json");
        assert_matches!(
            client.authenticate().await,
            Err(SheetsError::Credentials { path, .. }) if path == "/nonexistent/credentials.json"
        );
    }
}
