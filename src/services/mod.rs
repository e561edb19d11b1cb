//! Interfaces of the asynchronous services the interaction controller drives.
//!
//! Both services are object-safe `Send + Sync` traits so the controller can hold them
//! as `Arc<dyn …>` and so their futures can run on Bevy's async compute pool.

mod camera;
mod geocoding;
mod yandex;

pub use camera::{CameraAnimation, CameraPosition, CameraService};
pub use geocoding::{GeocodeError, GeocodedAddress, GeocodingService};
pub use yandex::YandexGeocoder;

/// Future returned by service queries.
pub type ServiceFuture<T> = futures_lite::future::Boxed<T>;
