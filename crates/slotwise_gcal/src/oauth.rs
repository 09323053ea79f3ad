// --- File: crates/slotwise_gcal/src/oauth.rs ---
//! OAuth token broker for Google Calendar access.
//!
//! Access tokens are obtained per request from the tenant's stored refresh
//! token. Caching is an injectable optimisation ([`AccessTokenCache`]); the
//! default [`NoTokenCache`] refreshes every time.

use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use slotwise_common::services::{BoxFuture, CredentialStore};
use slotwise_common::{config_error, create_client};
use slotwise_config::GoogleConfig;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use crate::error::BookingError;
use crate::vault::Vault;

/// Scope needed to list events and insert bookings.
pub const CALENDAR_EVENTS_SCOPE: &str = "https://www.googleapis.com/auth/calendar.events";

/// Token endpoint response for both the refresh and the authorization-code grant.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Only present when the provider issues a new long-lived token.
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorBody {
    error: Option<String>,
    error_description: Option<String>,
}

/// Client for the provider's OAuth endpoints.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    http: Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    token_url: String,
    auth_url: String,
    timeout: std::time::Duration,
}

impl OAuthClient {
    pub fn new(config: &GoogleConfig) -> Result<Self, BookingError> {
        let http = create_client(config.request_timeout_secs, false)
            .map_err(|e| BookingError::Store(config_error(format!("HTTP client: {}", e))))?;
        Ok(Self {
            http,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            token_url: config.token_url.clone(),
            auth_url: config.auth_url.clone(),
            timeout: std::time::Duration::from_secs(config.request_timeout_secs),
        })
    }

    /// Consent URL requesting offline access, so the provider returns a refresh token.
    ///
    /// `state` is echoed back to the redirect URI unchanged.
    pub fn authorization_url(&self, state: &str) -> Result<String, BookingError> {
        let url = Url::parse_with_params(
            &self.auth_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", CALENDAR_EVENTS_SCOPE),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("state", state),
            ],
        )
        .map_err(|e| BookingError::Store(config_error(format!("invalid auth_url: {}", e))))?;
        Ok(url.into())
    }

    /// Exchange a refresh token for a short-lived access token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, BookingError> {
        self.token_request(&[
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ])
        .await
    }

    /// Exchange the authorization code from the consent redirect.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, BookingError> {
        self.token_request(&[
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ])
        .await
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenResponse, BookingError> {
        let send = self.http.post(&self.token_url).form(form).send();
        let response = tokio::time::timeout(self.timeout, send)
            .await
            .map_err(|_| BookingError::Upstream("token endpoint timed out".to_string()))?
            .map_err(|e| BookingError::Upstream(format!("token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<TokenErrorBody>(&body) {
                Ok(TokenErrorBody {
                    error: Some(error),
                    error_description,
                }) => match error_description {
                    Some(description) => format!("{}: {}", error, description),
                    None => error,
                },
                _ => body,
            };
            // Only a client error means the grant itself was refused; an
            // outage or throttling leaves the stored credential intact.
            if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                return Err(BookingError::Upstream(format!(
                    "token endpoint returned {}: {}",
                    status.as_u16(),
                    message
                )));
            }
            return Err(BookingError::TokenRefresh {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| BookingError::Upstream(format!("malformed token response: {}", e)))
    }
}

// --- Access token cache ---

/// Per-tenant access token cache. Implementations may drop entries at any time.
pub trait AccessTokenCache: Send + Sync {
    fn get(&self, tenant_id: &str, now: DateTime<Utc>) -> Option<String>;
    fn put(&self, tenant_id: &str, access_token: String, expires_at: DateTime<Utc>);
    fn invalidate(&self, tenant_id: &str);
}

/// Never caches; every request performs a refresh.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTokenCache;

impl AccessTokenCache for NoTokenCache {
    fn get(&self, _tenant_id: &str, _now: DateTime<Utc>) -> Option<String> {
        None
    }

    fn put(&self, _tenant_id: &str, _access_token: String, _expires_at: DateTime<Utc>) {}

    fn invalidate(&self, _tenant_id: &str) {}
}

/// Process-local cache keyed by tenant.
///
/// Entries are treated as expired `margin` before the provider's expiry.
#[derive(Debug)]
pub struct InMemoryTokenCache {
    entries: Mutex<HashMap<String, (String, DateTime<Utc>)>>,
    margin: Duration,
}

impl InMemoryTokenCache {
    pub fn new(margin: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            margin,
        }
    }
}

impl Default for InMemoryTokenCache {
    fn default() -> Self {
        Self::new(Duration::seconds(60))
    }
}

impl AccessTokenCache for InMemoryTokenCache {
    fn get(&self, tenant_id: &str, now: DateTime<Utc>) -> Option<String> {
        let entries = self.entries.lock().ok()?;
        entries
            .get(tenant_id)
            .filter(|(_, expires_at)| now + self.margin < *expires_at)
            .map(|(token, _)| token.clone())
    }

    fn put(&self, tenant_id: &str, access_token: String, expires_at: DateTime<Utc>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(tenant_id.to_string(), (access_token, expires_at));
        }
    }

    fn invalidate(&self, tenant_id: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(tenant_id);
        }
    }
}

// --- Broker ---

/// Source of access tokens for a tenant's calendar.
pub trait AccessTokenProvider: Send + Sync {
    fn access_token(&self, tenant_id: &str) -> BoxFuture<'_, String, BookingError>;
}

/// Resolves a tenant's access token: stored blob -> vault -> refresh grant.
pub struct TokenBroker {
    oauth: OAuthClient,
    vault: Vault,
    credentials: Arc<dyn CredentialStore>,
    cache: Arc<dyn AccessTokenCache>,
}

impl TokenBroker {
    pub fn new(oauth: OAuthClient, vault: Vault, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            oauth,
            vault,
            credentials,
            cache: Arc::new(NoTokenCache),
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn AccessTokenCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn oauth(&self) -> &OAuthClient {
        &self.oauth
    }

    /// Completes calendar consent: exchanges `code` and stores the encrypted
    /// refresh token, replacing any previous credential.
    pub async fn connect(&self, tenant_id: &str, code: &str) -> Result<(), BookingError> {
        let tokens = self.oauth.exchange_code(code).await?;
        let refresh_token = tokens.refresh_token.as_deref().ok_or_else(|| {
            BookingError::TokenRefresh {
                status: 400,
                message: "consent response carried no refresh token".to_string(),
            }
        })?;
        self.store_refresh_token(tenant_id, refresh_token).await?;
        self.cache_token(tenant_id, &tokens);
        info!(tenant_id, "Calendar connected");
        Ok(())
    }

    /// Encrypts and stores a refresh token obtained outside the consent flow.
    pub async fn store_refresh_token(
        &self,
        tenant_id: &str,
        refresh_token: &str,
    ) -> Result<(), BookingError> {
        let blob = self.vault.encrypt(refresh_token)?;
        self.credentials
            .store_encrypted_refresh_token(tenant_id, &blob)
            .await?;
        Ok(())
    }

    fn cache_token(&self, tenant_id: &str, tokens: &TokenResponse) {
        if let Some(expires_in) = tokens.expires_in {
            let expires_at = Utc::now() + Duration::seconds(expires_in);
            self.cache
                .put(tenant_id, tokens.access_token.clone(), expires_at);
        }
    }

    async fn resolve(&self, tenant_id: &str) -> Result<String, BookingError> {
        if let Some(token) = self.cache.get(tenant_id, Utc::now()) {
            debug!(tenant_id, "Using cached access token");
            return Ok(token);
        }

        let blob = self
            .credentials
            .get_encrypted_refresh_token(tenant_id)
            .await?
            .ok_or_else(|| BookingError::NotConnected(tenant_id.to_string()))?;
        let refresh_token = self.vault.decrypt(&blob)?;

        let tokens = match self.oauth.refresh(&refresh_token).await {
            Ok(tokens) => tokens,
            Err(e) => {
                self.cache.invalidate(tenant_id);
                return Err(e);
            }
        };

        if let Some(rotated) = tokens.refresh_token.as_deref() {
            if rotated != refresh_token {
                info!(tenant_id, "Provider issued a new refresh token, re-encrypting");
                if let Err(e) = self.store_refresh_token(tenant_id, rotated).await {
                    // the old token may already be revoked; surface it
                    warn!(tenant_id, error = %e, "Failed to store rotated refresh token");
                    return Err(e);
                }
            }
        }

        self.cache_token(tenant_id, &tokens);
        Ok(tokens.access_token)
    }
}

impl AccessTokenProvider for TokenBroker {
    fn access_token(&self, tenant_id: &str) -> BoxFuture<'_, String, BookingError> {
        let tenant_id = tenant_id.to_string();
        Box::pin(async move { self.resolve(&tenant_id).await })
    }
}
