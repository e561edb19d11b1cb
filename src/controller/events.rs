//! Input events consumed by the interaction controller.

use bevy::prelude::*;

use crate::geo::Coordinate;

/// A map gesture or control activation.
///
/// Gestures and button presses share one message type so the controller sees them
/// in the exact order they arrived.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub enum InteractionEvent {
    /// Place the point of interest and look up its address
    LongPressAt(Coordinate),
    /// Tap on the map background: add an area outline vertex
    TapAt(Coordinate),
    /// Tap on the marker: remove it
    TapMarker,
    ZoomIn,
    ZoomOut,
    /// Move the camera to the marker
    Recenter,
    ToggleNightMode,
    /// Remove every annotation and return to the initial state
    ClearAll,
}
