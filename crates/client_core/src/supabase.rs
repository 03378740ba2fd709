//! Supabase adapter: PostgREST for tables, GoTrue for accounts.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::{
    domain::Account,
    error::{ApiError, ErrorCode},
    protocol::{Filter, Table},
};
use tokio::sync::RwLock;
use tracing::{debug, info};
use url::Url;

use crate::{AuthProvider, AuthSession, Credentials, RecordStore, SignUpOutcome};

const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

pub struct SupabaseClient {
    http: Client,
    base_url: Url,
    anon_key: String,
    access_token: RwLock<Option<String>>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: Account,
}

impl TokenResponse {
    fn into_session(self) -> AuthSession {
        let expires_at = self
            .expires_at
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
            .unwrap_or_else(|| {
                Utc::now() + Duration::seconds(self.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS))
            });
        AuthSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            account: self.user,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    User(Account),
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Error bodies differ between PostgREST (`message`) and GoTrue
/// (`msg`, `error_description`, `error`).
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.message
            .or(self.msg)
            .or(self.error_description)
            .or(self.error)
            .filter(|message| !message.trim().is_empty())
    }
}

impl SupabaseClient {
    pub fn new(base_url: &str, anon_key: impl Into<String>) -> Result<Self, ApiError> {
        let mut base_url = Url::parse(base_url.trim()).map_err(|err| {
            ApiError::new(
                ErrorCode::Validation,
                format!("invalid Supabase URL '{base_url}': {err}"),
            )
        })?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http: Client::new(),
            base_url,
            anon_key: anon_key.into(),
            access_token: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn has_user_token(&self) -> bool {
        self.access_token.read().await.is_some()
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|err| ApiError::internal(format!("invalid endpoint '{path}': {err}")))
    }

    fn table_endpoint(&self, table: Table) -> Result<Url, ApiError> {
        self.endpoint(&format!("rest/v1/{}", table.as_str()))
    }

    /// Adds the project key and the bearer: the signed-in user's token when
    /// there is one, the anonymous key otherwise.
    async fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let token = self.access_token.read().await.clone();
        builder
            .header("apikey", &self.anon_key)
            .bearer_auth(token.as_deref().unwrap_or(self.anon_key.as_str()))
    }

    async fn install_token(&self, token: Option<String>) {
        *self.access_token.write().await = token;
    }

    async fn exchange_token(
        &self,
        grant_type: &str,
        body: &impl Serialize,
    ) -> Result<AuthSession, ApiError> {
        let url = self.endpoint("auth/v1/token")?;
        let response = self
            .http
            .post(url)
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.anon_key)
            .json(body)
            .send()
            .await
            .map_err(transport)?;
        let token: TokenResponse = check(response).await?.json().await.map_err(transport)?;
        let session = token.into_session();
        self.install_token(Some(session.access_token.clone())).await;
        Ok(session)
    }
}

#[async_trait]
impl RecordStore for SupabaseClient {
    async fn select(&self, table: Table, filter: &Filter) -> Result<Vec<Value>, ApiError> {
        debug!(table = table.as_str(), "store: select");
        let request = self
            .http
            .get(self.table_endpoint(table)?)
            .query(&filter_query(filter));
        let response = self.authorize(request).await.send().await.map_err(transport)?;
        check(response).await?.json().await.map_err(transport)
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value, ApiError> {
        debug!(table = table.as_str(), "store: insert");
        let request = self
            .http
            .post(self.table_endpoint(table)?)
            .header("Prefer", "return=representation")
            .json(&[row]);
        let response = self.authorize(request).await.send().await.map_err(transport)?;
        let rows: Vec<Value> = check(response).await?.json().await.map_err(transport)?;
        rows.into_iter().next().ok_or_else(|| {
            ApiError::internal(format!("insert into {} returned no row", table.as_str()))
        })
    }

    async fn update(&self, table: Table, id: i64, patch: Value) -> Result<(), ApiError> {
        debug!(table = table.as_str(), id, "store: update");
        let request = self
            .http
            .patch(self.table_endpoint(table)?)
            .query(&[("id", format!("eq.{id}"))])
            .json(&patch);
        let response = self.authorize(request).await.send().await.map_err(transport)?;
        check(response).await.map(|_| ())
    }

    async fn delete(&self, table: Table, id: i64) -> Result<(), ApiError> {
        debug!(table = table.as_str(), id, "store: delete");
        let request = self
            .http
            .delete(self.table_endpoint(table)?)
            .query(&[("id", format!("eq.{id}"))]);
        let response = self.authorize(request).await.send().await.map_err(transport)?;
        check(response).await.map(|_| ())
    }
}

#[async_trait]
impl AuthProvider for SupabaseClient {
    async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpOutcome, ApiError> {
        let url = self.endpoint("auth/v1/signup")?;
        let response = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(credentials)
            .send()
            .await
            .map_err(transport)?;
        let body: SignUpResponse = check(response).await?.json().await.map_err(transport)?;
        match body {
            SignUpResponse::Session(token) => {
                let session = token.into_session();
                self.install_token(Some(session.access_token.clone())).await;
                info!(email = %session.account.email, "auth: account created and signed in");
                Ok(SignUpOutcome::SignedIn(session))
            }
            SignUpResponse::User(account) => {
                info!(email = %account.email, "auth: account created, confirmation pending");
                Ok(SignUpOutcome::ConfirmationRequired(account))
            }
        }
    }

    async fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthSession, ApiError> {
        self.exchange_token("password", credentials).await
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, ApiError> {
        self.exchange_token("refresh_token", &RefreshRequest { refresh_token })
            .await
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), ApiError> {
        let result = async {
            let url = self.endpoint("auth/v1/logout")?;
            let response = self
                .http
                .post(url)
                .header("apikey", &self.anon_key)
                .bearer_auth(access_token)
                .send()
                .await
                .map_err(transport)?;
            check(response).await.map(|_| ())
        }
        .await;
        self.install_token(None).await;
        result
    }
}

fn filter_query(filter: &Filter) -> Vec<(String, String)> {
    let mut query = vec![("select".to_string(), "*".to_string())];
    query.extend(
        filter
            .conditions
            .iter()
            .map(|(column, value)| (column.clone(), format!("eq.{}", render_value(value)))),
    );
    if let Some(order) = &filter.order {
        let direction = if order.ascending { "asc" } else { "desc" };
        query.push(("order".to_string(), format!("{}.{direction}", order.column)));
    }
    query
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

async fn check(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(ErrorBody::into_message)
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                body.trim().to_string()
            }
        });
    debug!(status = status.as_u16(), "store: request rejected: {message}");
    Err(ApiError::new(
        ErrorCode::from_http_status(status.as_u16()),
        message,
    ))
}

fn transport(err: reqwest::Error) -> ApiError {
    if err.is_decode() {
        ApiError::internal(format!("unexpected response body: {err}"))
    } else {
        ApiError::network(format!("request failed: {err}"))
    }
}


#[cfg(test)]
#[path = "tests/supabase_tests.rs"]
mod http_tests;
