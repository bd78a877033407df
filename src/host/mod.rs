//! Host client abstraction over the Telegram WebApp object and its sub-APIs.

pub mod init_data;
pub mod webapp;

use async_trait::async_trait;

use crate::error::LocationError;
use crate::identity::model::TelegramUser;
use crate::location::Coordinate;

pub use init_data::InitData;
pub use webapp::{InitDataWebApp, StaticLocationManager};

/// The host messaging client that embeds the Mini App.
pub trait WebApp: Send + Sync {
    /// Tell the host the app has loaded.
    fn ready(&self);

    /// Ask the host to expand the app to the full viewport.
    fn expand(&self);

    /// The launching user, if the host supplied one.
    fn user(&self) -> Option<TelegramUser>;

    /// Host location API, when the client version has one.
    fn location_manager(&self) -> Option<&dyn LocationManager>;

    /// Show a modal alert.
    fn show_alert(&self, message: &str);
}

/// The host's location manager sub-API.
#[async_trait]
pub trait LocationManager: Send + Sync {
    async fn init(&self) -> Result<(), LocationError>;

    async fn get_location(&self) -> Result<Coordinate, LocationError>;

    /// Open the host's location permission settings.
    fn open_settings(&self);
}
