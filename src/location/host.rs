//! Host location strategy with the national geofence.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::LocationSource;
use super::model::{BoundingBox, Coordinate};
use crate::error::LocationError;
use crate::identity::IdentityProvider;

/// Locates through the identity provider's platform API and rejects fixes
/// outside the bounding box.
pub struct HostLocator {
    provider: Arc<dyn IdentityProvider>,
    bounds: BoundingBox,
}

impl HostLocator {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            bounds: BoundingBox::UZBEKISTAN,
        }
    }

    pub fn with_bounds(mut self, bounds: BoundingBox) -> Self {
        self.bounds = bounds;
        self
    }
}

#[async_trait]
impl LocationSource for HostLocator {
    fn name(&self) -> &str {
        "host"
    }

    async fn locate(&self) -> Result<Coordinate, LocationError> {
        let position = self.provider.request_location().await?;
        if !self.bounds.contains(position) {
            warn!(lat = position.lat, lng = position.lng, "Location outside service area");
            return Err(LocationError::OutOfBounds {
                lat: position.lat,
                lng: position.lng,
            });
        }
        Ok(position)
    }
}
