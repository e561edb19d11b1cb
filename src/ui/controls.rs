use bevy::prelude::*;
use bevy_egui::{EguiContexts, egui};

use crate::annotations::AnnotationState;
use crate::controller::InteractionEvent;

/// A button in the map control column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapControl {
    Recenter,
    DisplayMode,
    Clear,
    ZoomIn,
    ZoomOut,
}

impl MapControl {
    /// Top to bottom
    pub fn all() -> &'static [MapControl] {
        &[
            MapControl::Recenter,
            MapControl::DisplayMode,
            MapControl::Clear,
            MapControl::ZoomIn,
            MapControl::ZoomOut,
        ]
    }

    pub fn label(&self, night_mode: bool) -> &'static str {
        match self {
            MapControl::Recenter => "◎",
            MapControl::DisplayMode if night_mode => "☀",
            MapControl::DisplayMode => "🌙",
            MapControl::Clear => "✖",
            MapControl::ZoomIn => "+",
            MapControl::ZoomOut => "-",
        }
    }

    pub fn hover_text(&self, night_mode: bool) -> &'static str {
        match self {
            MapControl::Recenter => "Center on marker",
            MapControl::DisplayMode if night_mode => "Day mode",
            MapControl::DisplayMode => "Night mode",
            MapControl::Clear => "Clear marker and area",
            MapControl::ZoomIn => "Zoom in",
            MapControl::ZoomOut => "Zoom out",
        }
    }

    pub fn event(&self) -> InteractionEvent {
        match self {
            MapControl::Recenter => InteractionEvent::Recenter,
            MapControl::DisplayMode => InteractionEvent::ToggleNightMode,
            MapControl::Clear => InteractionEvent::ClearAll,
            MapControl::ZoomIn => InteractionEvent::ZoomIn,
            MapControl::ZoomOut => InteractionEvent::ZoomOut,
        }
    }
}

/// Controls shown for the current state. Recenter needs a marker to center on.
pub fn visible_controls(state: &AnnotationState) -> Vec<MapControl> {
    MapControl::all()
        .iter()
        .copied()
        .filter(|control| *control != MapControl::Recenter || state.marker().is_some())
        .collect()
}

pub fn map_controls_ui(
    mut contexts: EguiContexts,
    state: Res<AnnotationState>,
    mut events: MessageWriter<InteractionEvent>,
) -> Result {
    let night_mode = state.night_mode();

    egui::Area::new(egui::Id::new("map_controls"))
        .anchor(egui::Align2::RIGHT_BOTTOM, [-20.0, -40.0])
        .show(contexts.ctx_mut()?, |ui| {
            ui.spacing_mut().item_spacing.y = 6.0;

            for control in visible_controls(&state) {
                let button = egui::Button::new(
                    egui::RichText::new(control.label(night_mode)).size(20.0).strong(),
                )
                .min_size(egui::vec2(40.0, 40.0));

                if ui
                    .add(button)
                    .on_hover_text(control.hover_text(night_mode))
                    .clicked()
                {
                    events.write(control.event());
                }
            }
        });

    Ok(())
}
