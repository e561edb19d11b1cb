//! Centralized color theme for the map and its controls.
//!
//! Every map color comes in a day and a night variant; [`palette`] picks one from
//! the annotation state's night flag.

use bevy::prelude::Color;

// ============================================================================
// Map Palettes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapPalette {
    /// Clear color behind the map
    pub background: Color,
    /// Latitude/longitude lines
    pub graticule: Color,
    /// Point-of-interest pin
    pub marker: Color,
    /// Circle drawn around the pin
    pub marker_radius: Color,
    /// Translucent fill inside the marker circle
    pub marker_fill: Color,
    /// Area outline and its vertices
    pub area_outline: Color,
    /// Translucent fill inside the area outline
    pub area_fill: Color,
}

pub const DAY: MapPalette = MapPalette {
    background: Color::srgb(0.93, 0.92, 0.88),
    graticule: Color::srgba(0.45, 0.45, 0.5, 0.35),
    marker: Color::srgb(0.9, 0.1, 0.1),
    marker_radius: Color::srgba(0.95, 0.75, 0.0, 0.9),
    marker_fill: Color::srgba(1.0, 0.0, 0.0, 0.5),
    area_outline: Color::srgb(0.1, 0.6, 0.2),
    area_fill: Color::srgba(0.0, 1.0, 0.0, 0.5),
};

pub const NIGHT: MapPalette = MapPalette {
    background: Color::srgb(0.07, 0.08, 0.12),
    graticule: Color::srgba(0.5, 0.55, 0.7, 0.25),
    marker: Color::srgb(1.0, 0.3, 0.3),
    marker_radius: Color::srgba(1.0, 0.85, 0.2, 0.9),
    marker_fill: Color::srgba(1.0, 0.2, 0.2, 0.4),
    area_outline: Color::srgb(0.3, 0.85, 0.4),
    area_fill: Color::srgba(0.2, 0.9, 0.3, 0.4),
};

pub fn palette(night_mode: bool) -> &'static MapPalette {
    if night_mode { &NIGHT } else { &DAY }
}

// ============================================================================
// UI Colors (egui)
// ============================================================================

pub mod ui {
    use bevy_egui::egui;

    /// Grey for the "looking up" hint
    pub const HINT_TEXT: egui::Color32 = egui::Color32::GRAY;

    /// Red for lookup failures
    pub const ERROR_TEXT: egui::Color32 = egui::Color32::from_rgb(220, 80, 80);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_follows_night_flag() {
        assert_eq!(palette(false), &DAY);
        assert_eq!(palette(true), &NIGHT);
        assert_ne!(DAY.background, NIGHT.background);
    }
}
