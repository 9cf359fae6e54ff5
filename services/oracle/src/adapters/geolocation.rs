//! services/oracle/src/adapters/geolocation.rs
//!
//! A `GeolocationService` that serves the coordinates configured for this machine.
//! With none configured it behaves like a device whose position is unavailable.

use async_trait::async_trait;
use literary_oracle_core::{Coordinates, GeolocationError, GeolocationService};

#[derive(Debug, Clone)]
pub struct ConfiguredGeolocation {
    coordinates: Option<Coordinates>,
}

impl ConfiguredGeolocation {
    pub fn new(coordinates: Option<Coordinates>) -> Self {
        Self { coordinates }
    }
}

#[async_trait]
impl GeolocationService for ConfiguredGeolocation {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        match self.coordinates {
            Some(c)
                if (-90.0..=90.0).contains(&c.latitude)
                    && (-180.0..=180.0).contains(&c.longitude) =>
            {
                Ok(c)
            }
            Some(_) | None => Err(GeolocationError::Unavailable),
        }
    }
}
