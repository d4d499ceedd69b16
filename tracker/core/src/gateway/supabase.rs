//! Supabase Gateway Implementation
//!
//! Auth and data gateways for a hosted Supabase project.
//!
//! # Supabase API
//!
//! One project URL serves two REST APIs:
//! - `/auth/v1/*` - GoTrue (sign-up, password grant, refresh, logout, user)
//! - `/rest/v1/{table}` - PostgREST (select/insert/update/delete on tables)
//!
//! Every request carries the project's anon key as `apikey`. Data requests
//! are authorized with the session's access token when signed in, so row
//! level security sees the right user.
//!
//! # Sessions
//!
//! The client caches the current session in memory, refreshes it shortly
//! before expiry, and (when given a [`SessionStore`]) persists it so the next
//! process starts signed in.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Deserialize;

use super::query::{Filter, Query};
use super::session::{now_secs, Session, SessionStore};
use super::traits::{AuthGateway, DataGateway};
use crate::error::{GatewayError, GatewayResult};
use crate::models::User;

/// Connection settings for a Supabase project
#[derive(Clone, Debug)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`
    pub url: String,
    /// Public anon key
    pub anon_key: String,
    /// Per-request timeout (`None` leaves it to the transport)
    pub request_timeout: Option<Duration>,
    /// Where to persist the session (`None` keeps it in memory only)
    pub session_path: Option<PathBuf>,
}

impl SupabaseConfig {
    /// Settings for `url` with `anon_key`, no timeout, no persistence
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: anon_key.into(),
            request_timeout: None,
            session_path: None,
        }
    }

    /// Persist the session at `path`
    pub fn with_session_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_path = Some(path.into());
        self
    }

    /// Set a per-request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

/// Supabase client implementing both gateways
///
/// Construct one per process and share it (`Arc`) between controllers.
pub struct SupabaseClient {
    /// Project URL without trailing slash
    base_url: String,
    /// Public anon key
    anon_key: String,
    /// HTTP client
    http_client: reqwest::Client,
    /// Cached session
    session: RwLock<Option<Session>>,
    /// Optional persistence for the session
    store: Option<SessionStore>,
}

/// GoTrue token grant response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: User,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        let expires_at = self
            .expires_at
            .unwrap_or_else(|| now_secs() + self.expires_in.unwrap_or(3600));
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

impl SupabaseClient {
    /// Create a client from `config`
    pub fn new(config: &SupabaseConfig) -> GatewayResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            http_client: builder.build()?,
            session: RwLock::new(None),
            store: config.session_path.clone().map(SessionStore::new),
        })
    }

    /// Project URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Auth endpoint URL
    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    /// Table endpoint URL
    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Cached session, if any
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.session.read().clone()
    }

    /// Replace the cached session and persist the change
    async fn set_session(&self, session: Option<Session>) -> GatewayResult<()> {
        *self.session.write() = session.clone();

        if let Some(store) = &self.store {
            match session {
                Some(ref s) => store.save(s).await?,
                None => store.clear().await?,
            }
        }
        Ok(())
    }

    /// Drop the session locally, logging (not returning) storage errors
    async fn discard_session(&self) {
        if let Err(e) = self.set_session(None).await {
            tracing::warn!(error = %e, "Failed to clear persisted session");
        }
    }

    /// Fail with the server's message unless `response` is a success
    async fn check(response: reqwest::Response) -> GatewayResult<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(GatewayError::from_body(status, &body))
    }

    /// Exchange a refresh token for a new session
    #[tracing::instrument(skip_all)]
    async fn refresh(&self, refresh_token: &str) -> GatewayResult<Session> {
        let response = self
            .http_client
            .post(self.auth_url("token"))
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        let data: TokenResponse = Self::check(response).await?.json().await?;
        tracing::info!("Session refreshed");
        Ok(data.into_session())
    }

    /// Current session with a usable access token
    ///
    /// Loads a persisted session on first use and refreshes an expiring one.
    /// A refresh the server rejects ends the session.
    async fn valid_session(&self) -> GatewayResult<Option<Session>> {
        let mut current = self.session();

        if current.is_none() {
            if let Some(store) = &self.store {
                current = store.load().await?;
                if current.is_some() {
                    tracing::debug!(path = %store.path().display(), "Restored persisted session");
                    *self.session.write() = current.clone();
                }
            }
        }

        let Some(session) = current else {
            return Ok(None);
        };

        if !session.needs_refresh(now_secs()) {
            return Ok(Some(session));
        }

        match self.refresh(&session.refresh_token).await {
            Ok(fresh) => {
                self.set_session(Some(fresh.clone())).await?;
                Ok(Some(fresh))
            }
            Err(GatewayError::Status { status, message }) if (400..500).contains(&status) => {
                tracing::warn!(status, %message, "Refresh rejected, ending session");
                self.discard_session().await;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Bearer token for data requests (access token, or anon key when signed out)
    async fn bearer(&self) -> GatewayResult<String> {
        Ok(self
            .valid_session()
            .await?
            .map_or_else(|| self.anon_key.clone(), |s| s.access_token))
    }

    /// Build a request with the standard Supabase headers
    async fn rest_request(
        &self,
        method: reqwest::Method,
        table: &str,
    ) -> GatewayResult<reqwest::RequestBuilder> {
        let bearer = self.bearer().await?;
        Ok(self
            .http_client
            .request(method, self.rest_url(table))
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer))
    }

    /// Fetch the user for `access_token` from the auth server
    async fn fetch_user(&self, access_token: &str) -> GatewayResult<User> {
        let response = self
            .http_client
            .get(self.auth_url("user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }
}

fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
    filters.iter().map(Filter::to_param).collect()
}

#[async_trait]
impl AuthGateway for SupabaseClient {
    fn name(&self) -> &'static str {
        "Supabase"
    }

    #[tracing::instrument(skip_all)]
    async fn sign_up(&self, email: &str, password: &str) -> GatewayResult<User> {
        let response = self
            .http_client
            .post(self.auth_url("signup"))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        let data: serde_json::Value = Self::check(response).await?.json().await?;

        // With email confirmation off the response is a full token grant;
        // otherwise it is the bare (unconfirmed) user.
        if data.get("access_token").is_some() {
            let session = serde_json::from_value::<TokenResponse>(data)?.into_session();
            let user = session.user.clone();
            self.set_session(Some(session)).await?;
            tracing::info!(user_id = %user.id, "Signed up");
            return Ok(user);
        }

        let user: User = match data.get("user") {
            Some(user) => serde_json::from_value(user.clone())?,
            None => serde_json::from_value(data)?,
        };
        tracing::info!(user_id = %user.id, "Signed up, awaiting email confirmation");
        Ok(user)
    }

    #[tracing::instrument(skip_all)]
    async fn sign_in(&self, email: &str, password: &str) -> GatewayResult<User> {
        let response = self
            .http_client
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        let session = Self::check(response)
            .await?
            .json::<TokenResponse>()
            .await?
            .into_session();
        let user = session.user.clone();
        self.set_session(Some(session)).await?;

        tracing::info!(user_id = %user.id, "Signed in");
        Ok(user)
    }

    #[tracing::instrument(skip_all)]
    async fn sign_out(&self) -> GatewayResult<()> {
        let Some(session) = self.session() else {
            self.discard_session().await;
            return Ok(());
        };

        let result: GatewayResult<()> = async {
            let response = self
                .http_client
                .post(self.auth_url("logout"))
                .header("apikey", &self.anon_key)
                .bearer_auth(&session.access_token)
                .send()
                .await?;
            Self::check(response).await.map(|_| ())
        }
        .await;

        self.discard_session().await;
        tracing::info!(user_id = %session.user.id, ok = result.is_ok(), "Signed out");
        result
    }

    async fn current_user(&self) -> GatewayResult<Option<User>> {
        let was_cached = self.session.read().is_some();
        let Some(session) = self.valid_session().await? else {
            return Ok(None);
        };

        if was_cached {
            return Ok(Some(session.user));
        }

        // Session came from disk: make sure the server still honours it.
        match self.fetch_user(&session.access_token).await {
            Ok(user) => Ok(Some(user)),
            Err(GatewayError::Status { status: 401 | 403, .. }) => {
                tracing::info!("Persisted session revoked");
                self.discard_session().await;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn current_user_id(&self) -> Option<String> {
        self.session.read().as_ref().map(|s| s.user.id.clone())
    }
}

#[async_trait]
impl DataGateway for SupabaseClient {
    #[tracing::instrument(skip_all, fields(table = %table))]
    async fn select(&self, table: &str, query: &Query) -> GatewayResult<Vec<serde_json::Value>> {
        let response = self
            .rest_request(reqwest::Method::GET, table)
            .await?
            .query(&query.to_params())
            .send()
            .await?;

        let rows: Vec<serde_json::Value> = Self::check(response).await?.json().await?;
        tracing::debug!(count = rows.len(), "Selected rows");
        Ok(rows)
    }

    #[tracing::instrument(skip_all, fields(table = %table))]
    async fn insert(&self, table: &str, row: serde_json::Value) -> GatewayResult<()> {
        let response = self
            .rest_request(reqwest::Method::POST, table)
            .await?
            .header("Prefer", "return=minimal")
            .json(&row)
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(table = %table))]
    async fn update(
        &self,
        table: &str,
        patch: serde_json::Value,
        filters: &[Filter],
    ) -> GatewayResult<usize> {
        let response = self
            .rest_request(reqwest::Method::PATCH, table)
            .await?
            .query(&filter_params(filters))
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await?;

        let rows: Vec<serde_json::Value> = Self::check(response).await?.json().await?;
        Ok(rows.len())
    }

    #[tracing::instrument(skip_all, fields(table = %table))]
    async fn delete(&self, table: &str, filters: &[Filter]) -> GatewayResult<usize> {
        let response = self
            .rest_request(reqwest::Method::DELETE, table)
            .await?
            .query(&filter_params(filters))
            .header("Prefer", "return=representation")
            .send()
            .await?;

        let rows: Vec<serde_json::Value> = Self::check(response).await?.json().await?;
        Ok(rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_strip_trailing_slash() {
        let client = SupabaseClient::new(&SupabaseConfig::new("https://xyz.supabase.co/", "anon"))
            .unwrap();
        assert_eq!(client.base_url(), "https://xyz.supabase.co");
        assert_eq!(
            client.auth_url("signup"),
            "https://xyz.supabase.co/auth/v1/signup"
        );
        assert_eq!(
            client.rest_url("tasks"),
            "https://xyz.supabase.co/rest/v1/tasks"
        );
    }

    #[test]
    fn test_token_response_prefers_absolute_expiry() {
        let data: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "a",
            "refresh_token": "r",
            "expires_in": 3600,
            "expires_at": 1_900_000_000,
            "user": {"id": "u1", "email": "a@example.com"}
        }))
        .unwrap();
        assert_eq!(data.into_session().expires_at, 1_900_000_000);
    }

    #[test]
    fn test_signed_out_client_has_no_user_id() {
        let client = SupabaseClient::new(&SupabaseConfig::new("http://localhost", "anon")).unwrap();
        assert!(client.current_user_id().is_none());
        assert!(client.session().is_none());
    }
}
