//! Browser-style geolocation: one high-accuracy fix with a hard timeout.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::LocationSource;
use super::model::Coordinate;
use crate::error::LocationError;

/// Default timeout for a single position request.
pub const DEFAULT_POSITION_TIMEOUT: Duration = Duration::from_secs(10);

/// Options passed with a position request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest cached reading that may be returned. Zero forbids cached fixes.
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout: DEFAULT_POSITION_TIMEOUT,
            maximum_age: Duration::ZERO,
        }
    }
}

/// Error reported by a geolocation implementation, using the W3C codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionError {
    pub code: u16,
    pub message: String,
}

impl PositionError {
    pub const PERMISSION_DENIED: u16 = 1;
    pub const POSITION_UNAVAILABLE: u16 = 2;
    pub const TIMEOUT: u16 = 3;

    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    fn classify(self) -> LocationError {
        match self.code {
            Self::PERMISSION_DENIED => LocationError::PermissionDenied,
            Self::POSITION_UNAVAILABLE => LocationError::PositionUnavailable,
            Self::TIMEOUT => LocationError::Timeout,
            _ => LocationError::Unknown(self.message),
        }
    }
}

/// The platform geolocation capability.
#[async_trait]
pub trait Geolocation: Send + Sync {
    async fn current_position(&self, options: &PositionOptions)
    -> Result<Coordinate, PositionError>;
}

/// Geolocation that answers with a configured position, or "unavailable".
///
/// Stands in for a device GPS during development.
pub struct FixedGeolocation {
    position: Option<Coordinate>,
}

impl FixedGeolocation {
    pub fn new(position: Option<Coordinate>) -> Self {
        Self { position }
    }
}

#[async_trait]
impl Geolocation for FixedGeolocation {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Coordinate, PositionError> {
        self.position.ok_or_else(|| {
            PositionError::new(
                PositionError::POSITION_UNAVAILABLE,
                "no development position configured",
            )
        })
    }
}

/// Location strategy backed by a [`Geolocation`] implementation.
pub struct BrowserLocator {
    geolocation: Option<Arc<dyn Geolocation>>,
    options: PositionOptions,
}

impl BrowserLocator {
    /// `None` models a platform without geolocation support.
    pub fn new(geolocation: Option<Arc<dyn Geolocation>>) -> Self {
        Self {
            geolocation,
            options: PositionOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PositionOptions) -> Self {
        self.options = options;
        self
    }
}

#[async_trait]
impl LocationSource for BrowserLocator {
    fn name(&self) -> &str {
        "browser"
    }

    async fn locate(&self) -> Result<Coordinate, LocationError> {
        let Some(geolocation) = self.geolocation.as_ref() else {
            return Err(LocationError::Unsupported);
        };

        let request = geolocation.current_position(&self.options);
        match tokio::time::timeout(self.options.timeout, request).await {
            Ok(Ok(position)) => {
                let position = position.rounded();
                debug!(lat = position.lat, lng = position.lng, "Got position");
                Ok(position)
            }
            Ok(Err(e)) => {
                warn!(code = e.code, message = %e.message, "Geolocation failed");
                Err(e.classify())
            }
            Err(_) => {
                warn!(timeout = ?self.options.timeout, "Geolocation timed out");
                Err(LocationError::Timeout)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ErrGeolocation(u16);

    #[async_trait]
    impl Geolocation for ErrGeolocation {
        async fn current_position(
            &self,
            _options: &PositionOptions,
        ) -> Result<Coordinate, PositionError> {
            Err(PositionError::new(self.0, "test"))
        }
    }

    struct NeverGeolocation;

    #[async_trait]
    impl Geolocation for NeverGeolocation {
        async fn current_position(
            &self,
            _options: &PositionOptions,
        ) -> Result<Coordinate, PositionError> {
            std::future::pending().await
        }
    }

    #[test]
    fn default_options() {
        let options = PositionOptions::default();
        assert!(options.enable_high_accuracy);
        assert_eq!(options.timeout, Duration::from_secs(10));
        assert_eq!(options.maximum_age, Duration::ZERO);
    }

    #[tokio::test]
    async fn success_is_rounded() {
        let geo = FixedGeolocation::new(Some(Coordinate::new(41.311_111_19, 69.240_100_04)));
        let locator = BrowserLocator::new(Some(Arc::new(geo)));
        let position = locator.locate().await.unwrap();
        assert_eq!(position, Coordinate::new(41.311111, 69.2401));
    }

    #[tokio::test]
    async fn missing_capability_is_unsupported() {
        let locator = BrowserLocator::new(None);
        assert_eq!(locator.locate().await, Err(LocationError::Unsupported));
    }

    #[tokio::test]
    async fn error_codes_are_classified() {
        let cases = [
            (1, LocationError::PermissionDenied),
            (2, LocationError::PositionUnavailable),
            (3, LocationError::Timeout),
            (7, LocationError::Unknown("test".into())),
        ];
        for (code, expected) in cases {
            let locator = BrowserLocator::new(Some(Arc::new(ErrGeolocation(code))));
            assert_eq!(locator.locate().await, Err(expected), "code {code}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn silent_geolocation_times_out_after_ten_seconds() {
        let locator = BrowserLocator::new(Some(Arc::new(NeverGeolocation)));
        let started = tokio::time::Instant::now();
        assert_eq!(locator.locate().await, Err(LocationError::Timeout));
        assert!(started.elapsed() >= Duration::from_secs(10));
    }
}
