//! Location acquisition from browser geolocation or the host's location manager.
//!
//! Both strategies sit behind [`LocationSource`] so the registration form
//! never knows which one is configured.

pub mod browser;
pub mod host;
pub mod model;

use std::str::FromStr;

use async_trait::async_trait;

use crate::error::{ConfigError, LocationError};

pub use browser::{BrowserLocator, FixedGeolocation, Geolocation, PositionError, PositionOptions};
pub use host::HostLocator;
pub use model::{BoundingBox, Coordinate, TASHKENT};

/// A one-shot location request.
#[async_trait]
pub trait LocationSource: Send + Sync {
    /// Strategy name, for logs.
    fn name(&self) -> &str;

    /// Request a single fix. Not cancellable once issued.
    async fn locate(&self) -> Result<Coordinate, LocationError>;
}

/// Which acquisition strategy the form uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocationStrategy {
    #[default]
    Browser,
    Host,
}

impl FromStr for LocationStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "browser" => Ok(Self::Browser),
            "host" | "telegram" => Ok(Self::Host),
            other => Err(ConfigError::InvalidValue {
                key: "NOVA_LOCATION_STRATEGY".into(),
                message: format!("expected `browser` or `host`, got `{other}`"),
            }),
        }
    }
}
