use thiserror::Error;

use crate::geo::Coordinate;

use super::ServiceFuture;

/// A successful reverse-geocoding answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocodedAddress {
    pub formatted: String,
}

/// Why a reverse-geocoding request could not be answered.
///
/// "No address at this location" is not an error; it is `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeocodeError {
    #[error("geocoder unreachable: {0}")]
    Transport(String),
    #[error("geocoder rejected the API key (HTTP {0})")]
    Unauthorized(u16),
    #[error("geocoder answered with HTTP {0}")]
    Status(u16),
    #[error("malformed geocoder response: {0}")]
    Decode(String),
}

/// Reverse geocoding: coordinate to human-readable address.
pub trait GeocodingService: Send + Sync + 'static {
    fn reverse_geocode(
        &self,
        at: Coordinate,
    ) -> ServiceFuture<Result<Option<GeocodedAddress>, GeocodeError>>;
}
