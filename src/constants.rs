//! Centralized constants used across the application.
//!
//! This module contains magic numbers and configuration values that are used
//! in multiple places or would benefit from being named constants.

/// Default window width in pixels
pub const DEFAULT_WINDOW_WIDTH: f32 = 1280.0;

/// Default window height in pixels
pub const DEFAULT_WINDOW_HEIGHT: f32 = 800.0;

// ============================================================================
// Camera commands issued by the interaction controller
// ============================================================================

/// Multiplier applied to the current zoom level by the zoom-in control
pub const ZOOM_IN_FACTOR: f64 = 1.1;

/// Multiplier applied to the current zoom level by the zoom-out control
pub const ZOOM_OUT_FACTOR: f64 = 0.9;

/// Animation length of the zoom controls, in seconds
pub const ZOOM_ANIMATION_SECS: f32 = 0.1;

/// Zoom level the camera moves to when recentering on the marker
pub const RECENTER_ZOOM: f64 = 14.0;

/// Animation length of the recenter control, in seconds
pub const RECENTER_ANIMATION_SECS: f32 = 0.4;

// ============================================================================
// Map surface
// ============================================================================

/// Lowest zoom level the map camera accepts
pub const MIN_ZOOM: f64 = 1.0;

/// Highest zoom level the map camera accepts
pub const MAX_ZOOM: f64 = 19.0;

/// Zoom levels per wheel "line" when zooming with the mouse wheel
pub const WHEEL_ZOOM_STEP: f64 = 0.25;

/// Radius of the highlight circle drawn around the marker, in meters
pub const MARKER_RADIUS_METERS: f64 = 300.0;

// ============================================================================
// Gesture recognition
// ============================================================================

/// How long the left button must stay down before a press becomes a long press
pub const LONG_PRESS_SECS: f32 = 0.5;

/// Cursor travel (screen pixels) after which a press no longer counts as a tap
pub const TAP_SLOP_PX: f32 = 6.0;

/// Screen distance from the marker within which a tap hits the marker
pub const MARKER_HIT_RADIUS_PX: f32 = 24.0;
