// --- File: crates/slotwise_config/src/models.rs ---

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// --- General Server Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

// --- Database Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String, // e.g. sqlite://slotwise.db, overridable via SLOTWISE__DATABASE__URL
}

// --- Google OAuth / Calendar Config ---
// Holds the OAuth client registration. The client secret is normally
// "secret_from_env" in the config file and injected from GOOGLE_CLIENT_SECRET.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    /// Override for the Calendar REST root, mostly useful against a local fake.
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_busy_results")]
    pub max_busy_results: i32,
}

fn default_token_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn default_auth_url() -> String {
    "https://accounts.google.com/o/oauth2/v2/auth".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_max_busy_results() -> i32 {
    250
}

// --- Booking Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BookingConfig {
    /// Prefix of the calendar event title, followed by the booker's name.
    #[serde(default = "default_event_title_prefix")]
    pub event_title_prefix: String,
}

fn default_event_title_prefix() -> String {
    "Booking with".to_string()
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            event_title_prefix: default_event_title_prefix(),
        }
    }
}

// --- Tenant Seeds ---
// Tenants registered at startup when the store does not know them yet, keyed
// by tenant id. `refresh_token` is normally "secret_from_env", which resolves
// to TENANTS_<TENANT_ID>_REFRESH_TOKEN.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TenantSeedConfig {
    pub slug: String,
    pub display_name: String,
    pub contact_email: String,
    #[serde(default)]
    pub calendar_id: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

// --- Unified App Configuration ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    // Server config is mandatory
    pub server: ServerConfig,

    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub google: Option<GoogleConfig>,
    #[serde(default)]
    pub booking: BookingConfig,
    #[serde(default)]
    pub tenants: BTreeMap<String, TenantSeedConfig>,
}
