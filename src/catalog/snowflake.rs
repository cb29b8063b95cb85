//! Blocking Snowflake session over the REST login and query endpoints

use std::str::FromStr;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::keypair::KeyPairCredentials;
use super::{Catalog, CatalogError, Row};
use crate::error::ManifestError;

const CLIENT_APP_ID: &str = env!("CARGO_PKG_NAME");
const CLIENT_APP_VERSION: &str = env!("CARGO_PKG_VERSION");
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Login method requested with `--authenticator`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Authenticator {
    #[default]
    Snowflake,
    SnowflakeJwt,
}

impl FromStr for Authenticator {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "snowflake" => Ok(Authenticator::Snowflake),
            "snowflake_jwt" => Ok(Authenticator::SnowflakeJwt),
            _ => Err(ManifestError::UnsupportedAuthenticator {
                name: s.to_string(),
            }),
        }
    }
}

/// Secret material used to log in
#[derive(Debug)]
pub enum Credentials {
    Password(String),
    KeyPair(KeyPairCredentials),
}

/// Everything needed to open a session
#[derive(Debug)]
pub struct ConnectionConfig {
    /// Account identifier, e.g. `myaccount` or `myaccount.us-east-1.aws`
    pub account: String,
    pub user: String,
    pub credentials: Credentials,
    pub authenticator: Authenticator,
    pub warehouse: Option<String>,
    pub database: Option<String>,
    pub schema: Option<String>,
    pub role: Option<String>,
}

impl ConnectionConfig {
    /// Account locator without region or cloud, as used in login names and tokens.
    pub fn account_name(&self) -> &str {
        self.account.split('.').next().unwrap_or(&self.account)
    }

    pub fn base_url(&self) -> String {
        format!("https://{}.snowflakecomputing.com", self.account)
    }
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    success: bool,
    message: Option<String>,
    data: Option<LoginData>,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    success: bool,
    message: Option<String>,
    code: Option<String>,
    data: Option<QueryData>,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    #[serde(default)]
    rowtype: Vec<ColumnType>,
    #[serde(default)]
    rowset: Vec<Vec<Value>>,
    #[serde(default)]
    chunks: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ColumnType {
    name: String,
}

/// A lazily opened Snowflake session.
///
/// The first [`Catalog::query`] logs in; later queries reuse the session
/// token. The session is closed by [`SnowflakeCatalog::close`] or, failing
/// that, when the catalog is dropped.
pub struct SnowflakeCatalog {
    config: ConnectionConfig,
    base_url: String,
    client: Client,
    token: Option<String>,
    sequence_id: u64,
}

impl SnowflakeCatalog {
    pub fn new(config: ConnectionConfig) -> Result<Self, CatalogError> {
        let base_url = config.base_url();
        Self::with_base_url(config, base_url)
    }

    /// Open sessions against `base_url` instead of the account's public endpoint.
    pub fn with_base_url(
        config: ConnectionConfig,
        base_url: impl Into<String>,
    ) -> Result<Self, CatalogError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            )),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CatalogError::Http {
                url: base_url.clone(),
                source: e,
            })?;

        Ok(Self {
            config,
            base_url,
            client,
            token: None,
            sequence_id: 0,
        })
    }

    pub fn is_connected(&self) -> bool {
        self.token.is_some()
    }

    /// Log in unless a session is already open.
    pub fn connect(&mut self) -> Result<(), CatalogError> {
        if self.token.is_some() {
            return Ok(());
        }

        let (authenticator, secret) = match &self.config.credentials {
            Credentials::Password(password) => {
                if self.config.authenticator == Authenticator::SnowflakeJwt {
                    return Err(CatalogError::Login {
                        message: "snowflake_jwt authenticator requires a private key".to_string(),
                    });
                }
                ("SNOWFLAKE", json!({ "PASSWORD": password }))
            }
            Credentials::KeyPair(key_pair) => {
                let token = key_pair
                    .token(self.config.account_name(), &self.config.user)
                    .map_err(|e| CatalogError::Login {
                        message: e.to_string(),
                    })?;
                ("SNOWFLAKE_JWT", json!({ "TOKEN": token }))
            }
        };

        let mut body = json!({
            "CLIENT_APP_ID": CLIENT_APP_ID,
            "CLIENT_APP_VERSION": CLIENT_APP_VERSION,
            "ACCOUNT_NAME": self.config.account_name().to_uppercase(),
            "LOGIN_NAME": self.config.user,
            "AUTHENTICATOR": authenticator,
        });
        if let (Some(fields), Value::Object(secret)) = (body.as_object_mut(), secret) {
            fields.extend(secret);
        }

        let mut params = vec![("requestId".to_string(), Uuid::new_v4().to_string())];
        for (key, value) in [
            ("warehouse", &self.config.warehouse),
            ("databaseName", &self.config.database),
            ("schemaName", &self.config.schema),
            ("roleName", &self.config.role),
        ] {
            if let Some(value) = value {
                params.push((key.to_string(), value.clone()));
            }
        }

        let url = format!("{}/session/v1/login-request", self.base_url);
        debug!("Logging in to {} as {}", self.base_url, self.config.user);
        let response: LoginResponse = self
            .client
            .post(&url)
            .query(&params)
            .json(&json!({ "data": body }))
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json())
            .map_err(|e| CatalogError::Http {
                url: url.clone(),
                source: e,
            })?;

        if !response.success {
            return Err(CatalogError::Login {
                message: response
                    .message
                    .unwrap_or_else(|| "login rejected".to_string()),
            });
        }

        let token = response
            .data
            .and_then(|d| d.token)
            .ok_or_else(|| CatalogError::MalformedResponse {
                message: "login response carries no session token".to_string(),
            })?;

        self.token = Some(token);
        info!("Successfully connected to Snowflake");
        Ok(())
    }

    /// Log out of the session, if one is open.
    pub fn close(&mut self) -> Result<(), CatalogError> {
        let Some(token) = self.token.take() else {
            return Ok(());
        };

        let url = format!("{}/session", self.base_url);
        self.client
            .post(&url)
            .query(&[("delete", "true")])
            .header(AUTHORIZATION, session_header(&token))
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| CatalogError::Http { url, source: e })?;

        info!("Snowflake connection closed");
        Ok(())
    }
}

fn session_header(token: &str) -> String {
    format!("Snowflake Token=\"{}\"", token)
}

fn cell_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

impl Catalog for SnowflakeCatalog {
    fn query(&mut self, sql: &str) -> Result<Vec<Row>, CatalogError> {
        self.connect()?;
        let token = self.token.clone().ok_or(CatalogError::NotConnected)?;

        self.sequence_id += 1;
        let url = format!("{}/queries/v1/query-request", self.base_url);
        debug!("Executing: {}", sql.trim());

        let response: QueryResponse = self
            .client
            .post(&url)
            .query(&[("requestId", Uuid::new_v4().to_string())])
            .header(AUTHORIZATION, session_header(&token))
            .json(&json!({
                "sqlText": sql,
                "sequenceId": self.sequence_id,
                "asyncExec": false,
            }))
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json())
            .map_err(|e| CatalogError::Http {
                url: url.clone(),
                source: e,
            })?;

        if !response.success {
            let message = response.message.unwrap_or_else(|| "query failed".to_string());
            return Err(CatalogError::Query {
                message: match response.code {
                    Some(code) => format!("{} ({})", message, code),
                    None => message,
                },
            });
        }

        let data = response.data.ok_or_else(|| CatalogError::MalformedResponse {
            message: "query response carries no data".to_string(),
        })?;

        if !data.chunks.is_empty() {
            // SHOW results are small; chunked result sets are not downloaded.
            warn!(
                "Result set has {} additional chunks that were not fetched",
                data.chunks.len()
            );
        }

        let columns: Vec<String> = data.rowtype.into_iter().map(|c| c.name).collect();
        let rows = data
            .rowset
            .into_iter()
            .map(|cells| {
                Row::from_pairs(
                    columns
                        .iter()
                        .zip(cells)
                        .map(|(name, cell)| (name.as_str(), cell_to_string(cell))),
                )
            })
            .collect();

        Ok(rows)
    }
}

impl Drop for SnowflakeCatalog {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Failed to close Snowflake session: {}", e);
        }
    }
}
