//! Geographic coordinates and the Web-Mercator projection used by the map camera.
//!
//! World space is a square of `WORLD_SIZE` units centered on (0°, 0°), x growing
//! eastwards and y growing northwards, so Bevy's 2D camera can look at it directly.

use std::f64::consts::PI;

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

/// Side length of the projected world, in world units.
///
/// Large enough that f32 transforms stay sub-pixel accurate up to `MAX_ZOOM`.
pub const WORLD_SIZE: f64 = 256.0 * 65_536.0;

/// Latitude limit of the square Web-Mercator world.
pub const MAX_LATITUDE: f64 = 85.051_128_78;

/// Mean equatorial circumference of the earth in meters.
const EARTH_CIRCUMFERENCE_M: f64 = 40_075_016.686;

/// A (latitude, longitude) pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Project into world space.
    pub fn to_world(self) -> Vec2 {
        let lat = self.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
        let x = self.lon / 360.0 * WORLD_SIZE;
        let y = (PI / 4.0 + lat / 2.0).tan().ln() / (2.0 * PI) * WORLD_SIZE;
        Vec2::new(x as f32, y as f32)
    }

    /// Inverse of [`Coordinate::to_world`].
    pub fn from_world(point: Vec2) -> Self {
        let lon = point.x as f64 / WORLD_SIZE * 360.0;
        let lat = (point.y as f64 / WORLD_SIZE * 2.0 * PI).sinh().atan().to_degrees();
        Self { lat, lon }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// World units covered by one screen pixel at a given map zoom level.
///
/// Zoom follows the slippy-map convention: at zoom `z` the world is `256 * 2^z` pixels wide.
pub fn zoom_to_scale(zoom: f64) -> f32 {
    (WORLD_SIZE / (256.0 * 2f64.powf(zoom))) as f32
}

/// Length in world units of `meters` measured on the ground at `lat`.
pub fn meters_to_world(meters: f64, lat: f64) -> f32 {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    (meters / (EARTH_CIRCUMFERENCE_M * lat.cos()) * WORLD_SIZE) as f32
}
