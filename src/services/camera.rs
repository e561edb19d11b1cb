use crate::geo::Coordinate;

use super::ServiceFuture;

/// Snapshot of the map camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPosition {
    pub zoom: f64,
    pub target: Coordinate,
    pub tilt: f64,
    pub bearing: f64,
}

/// Easing used when the camera animates to a new center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraAnimation {
    #[default]
    Smooth,
    Linear,
}

impl CameraAnimation {
    /// Map linear progress `t` in `[0, 1]` to eased progress.
    pub fn ease(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            CameraAnimation::Smooth => t * t * (3.0 - 2.0 * t),
            CameraAnimation::Linear => t,
        }
    }
}

/// Camera/viewport control of the map surface.
pub trait CameraService: Send + Sync + 'static {
    /// Current camera position, or `None` when no camera surface is attached.
    fn get_position(&self) -> ServiceFuture<Option<CameraPosition>>;

    /// Animate to a new zoom level. Fire-and-forget.
    fn set_zoom(&self, level: f64, animation_duration_secs: f32);

    /// Animate to a new center. Fire-and-forget.
    fn set_center(
        &self,
        target: Coordinate,
        zoom: f64,
        tilt_deg: f64,
        bearing_deg: f64,
        animation_duration_secs: f32,
        animation: CameraAnimation,
    );
}
