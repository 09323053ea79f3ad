// --- File: crates/services/slotwise_backend/src/app_state.rs ---
use slotwise_common::memory::{InMemoryBookingStore, InMemoryCredentialStore, InMemorySettingsStore};
use slotwise_common::models::TenantSettings;
use slotwise_common::services::{BookingStore, CredentialStore, LogNotificationService, SettingsStore};
use slotwise_common::{config_error, internal_error, SlotwiseError};
use slotwise_config::{AppConfig, SECRET_FROM_ENV};
use slotwise_gcal::handlers::GcalState;
use slotwise_gcal::oauth::{OAuthClient, TokenBroker};
use slotwise_gcal::service::GoogleCalendarGateway;
use slotwise_gcal::vault::Vault;
use slotwise_gcal::{BookingEngine, BookingError};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[cfg(feature = "database")]
use slotwise_db::{init_schema, DbClient, SqlBookingRepository, SqlTenantRepository};

/// Application state that is shared across all routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub gcal_state: Arc<GcalState>,
}

impl AppState {
    /// Connects the stores, registers configured tenants and wires the booking engine.
    pub async fn new(config: Arc<AppConfig>) -> Result<Self, SlotwiseError> {
        let google = config
            .google
            .as_ref()
            .ok_or_else(|| config_error("the google section is required"))?;

        let stores = Stores::connect(&config).await?;

        let oauth = OAuthClient::new(google).map_err(startup_error)?;
        let broker = TokenBroker::new(oauth, Vault::from_env(), stores.credentials.clone());
        seed_tenants(&config, &stores, &broker).await?;

        let gateway = GoogleCalendarGateway::new(google).map_err(startup_error)?;
        let engine = BookingEngine::new(
            stores.settings.clone(),
            Arc::new(broker),
            Arc::new(gateway),
            stores.bookings.clone(),
            Arc::new(LogNotificationService),
            config.booking.event_title_prefix.clone(),
        );

        Ok(Self {
            config,
            gcal_state: Arc::new(GcalState {
                engine: Arc::new(engine),
            }),
        })
    }
}

fn startup_error(err: BookingError) -> SlotwiseError {
    match err {
        BookingError::Store(inner) => inner,
        other => internal_error(other),
    }
}

/// Where tenants are registered; the store traits only read and update.
enum TenantRegistry {
    Memory(Arc<InMemorySettingsStore>),
    #[cfg(feature = "database")]
    Sql(SqlTenantRepository),
}

impl TenantRegistry {
    async fn create(&self, settings: TenantSettings) -> Result<(), SlotwiseError> {
        match self {
            TenantRegistry::Memory(store) => store.insert(settings),
            #[cfg(feature = "database")]
            TenantRegistry::Sql(repo) => repo.create_tenant(&settings).await,
        }
    }
}

/// The store implementations the engine runs on.
pub struct Stores {
    pub settings: Arc<dyn SettingsStore>,
    pub credentials: Arc<dyn CredentialStore>,
    pub bookings: Arc<dyn BookingStore>,
    registry: TenantRegistry,
}

impl Stores {
    /// SQL stores when a database is configured, in-memory stores otherwise.
    pub async fn connect(config: &AppConfig) -> Result<Self, SlotwiseError> {
        #[cfg(feature = "database")]
        {
            if let Some(db_config) = &config.database {
                let client = DbClient::from_config(db_config).await?;
                init_schema(&client).await?;
                let tenants = SqlTenantRepository::new(client.clone());
                info!("Using SQL stores");
                return Ok(Self {
                    settings: Arc::new(tenants.clone()),
                    credentials: Arc::new(tenants.clone()),
                    bookings: Arc::new(SqlBookingRepository::new(client)),
                    registry: TenantRegistry::Sql(tenants),
                });
            }
        }

        if config.database.is_some() {
            warn!("Database configured but the database feature is disabled");
        }
        warn!("No database in use, tenants and bookings are kept in memory only");
        Ok(Self::in_memory())
    }

    pub fn in_memory() -> Self {
        let settings = Arc::new(InMemorySettingsStore::new());
        Self {
            settings: settings.clone(),
            credentials: Arc::new(InMemoryCredentialStore::new()),
            bookings: Arc::new(InMemoryBookingStore::new()),
            registry: TenantRegistry::Memory(settings),
        }
    }
}

/// Registers the tenants named in the configuration that the store does not
/// know yet, and stores their initial refresh token when none is stored.
pub async fn seed_tenants(
    config: &AppConfig,
    stores: &Stores,
    broker: &TokenBroker,
) -> Result<(), SlotwiseError> {
    for (tenant_id, seed) in &config.tenants {
        if stores.settings.get(tenant_id).await?.is_some() {
            debug!(%tenant_id, "Tenant already registered");
        } else {
            let mut settings = TenantSettings::with_defaults(
                tenant_id.as_str(),
                seed.slug.as_str(),
                seed.display_name.as_str(),
                seed.contact_email.as_str(),
            );
            if let Some(calendar_id) = &seed.calendar_id {
                settings.calendar_id = calendar_id.clone();
            }
            if let Some(timezone) = &seed.timezone {
                settings.timezone = timezone.clone();
            }
            stores.registry.create(settings).await?;
            info!(%tenant_id, slug = %seed.slug, "Registered tenant from configuration");
        }

        let refresh_token = seed
            .refresh_token
            .as_deref()
            .filter(|token| !token.is_empty() && *token != SECRET_FROM_ENV);
        let Some(refresh_token) = refresh_token else {
            continue;
        };

        if stores
            .credentials
            .get_encrypted_refresh_token(tenant_id)
            .await?
            .is_some()
        {
            debug!(%tenant_id, "Keeping stored calendar credential");
            continue;
        }
        broker
            .store_refresh_token(tenant_id, refresh_token)
            .await
            .map_err(startup_error)?;
        info!(%tenant_id, "Stored calendar credential from configuration");
    }
    Ok(())
}
