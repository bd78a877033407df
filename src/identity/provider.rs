//! Identity providers: the host adapter and the local stub.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use super::model::{DEFAULT_LANGUAGE_CODE, IdentitySource, UserIdentity};
use crate::error::LocationError;
use crate::host::WebApp;
use crate::location::{Coordinate, TASHKENT};

/// Placeholder username for local runs.
pub const LOCAL_USERNAME: &str = "test_user";
/// Placeholder phone for local runs.
pub const LOCAL_PHONE: &str = "+998901234567";

/// Supplies the acting user and, where the platform has one, a location API.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Provider name, for logs.
    fn name(&self) -> &str;

    /// Signal the platform that the app is ready. Called once before lookup.
    fn prepare(&self) {}

    /// The current user, or `None` when the platform has no user context.
    fn current_user(&self) -> Option<UserIdentity>;

    /// Location written with the bootstrap record, if the provider has one.
    fn default_location(&self) -> Option<Coordinate> {
        None
    }

    /// Ask the platform for the user's location.
    async fn request_location(&self) -> Result<Coordinate, LocationError>;
}

/// Adapter over the Telegram host client.
pub struct TelegramProvider {
    host: Arc<dyn WebApp>,
    manager_ready: OnceCell<()>,
}

impl TelegramProvider {
    pub fn new(host: Arc<dyn WebApp>) -> Self {
        Self {
            host,
            manager_ready: OnceCell::new(),
        }
    }
}

#[async_trait]
impl IdentityProvider for TelegramProvider {
    fn name(&self) -> &str {
        "telegram"
    }

    fn prepare(&self) {
        self.host.ready();
        self.host.expand();
    }

    fn current_user(&self) -> Option<UserIdentity> {
        self.host.user().map(UserIdentity::from)
    }

    async fn request_location(&self) -> Result<Coordinate, LocationError> {
        let Some(manager) = self.host.location_manager() else {
            return Err(LocationError::Unsupported);
        };

        if let Err(e) = self.manager_ready.get_or_try_init(|| manager.init()).await {
            warn!(error = %e, "Host location manager failed to initialize");
            manager.open_settings();
            return Err(e);
        }

        match manager.get_location().await {
            Ok(position) => {
                debug!(lat = position.lat, lng = position.lng, "Host returned location");
                Ok(position)
            }
            Err(e) => {
                warn!(error = %e, "Host location request failed");
                manager.open_settings();
                Err(e)
            }
        }
    }
}

/// Stub provider for local development and tests.
pub struct LocalProvider {
    identity: UserIdentity,
    location: Coordinate,
}

impl LocalProvider {
    /// A local user with a random id.
    pub fn new() -> Self {
        Self::with_id(format!("local-{}", uuid::Uuid::new_v4()))
    }

    /// A local user with a fixed id.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            identity: UserIdentity {
                id: id.into(),
                username: Some(LOCAL_USERNAME.to_string()),
                first_name: None,
                last_name: None,
                phone_number: Some(LOCAL_PHONE.to_string()),
                photo_url: None,
                language_code: DEFAULT_LANGUAGE_CODE.to_string(),
                telegram_id: None,
                source: IdentitySource::Local,
            },
            location: TASHKENT,
        }
    }

    pub fn with_location(mut self, location: Coordinate) -> Self {
        self.location = location;
        self
    }
}

impl Default for LocalProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for LocalProvider {
    fn name(&self) -> &str {
        "local"
    }

    fn current_user(&self) -> Option<UserIdentity> {
        Some(self.identity.clone())
    }

    fn default_location(&self) -> Option<Coordinate> {
        Some(self.location)
    }

    async fn request_location(&self) -> Result<Coordinate, LocationError> {
        Ok(self.location)
    }
}
