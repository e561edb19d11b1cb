mod address;
mod controls;
mod notifications;

use bevy::prelude::*;
use bevy_egui::{EguiContexts, EguiPrimaryContextPass, egui};

use crate::annotations::AnnotationState;

/// System to match the egui visuals to the map's display mode
fn apply_ui_theme(mut contexts: EguiContexts, state: Res<AnnotationState>) -> Result {
    let ctx = contexts.ctx_mut()?;
    let dark = state.night_mode();

    if ctx.style().visuals.dark_mode != dark {
        ctx.set_visuals(if dark {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        });
    }

    Ok(())
}

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            EguiPrimaryContextPass,
            (
                apply_ui_theme,
                (
                    controls::map_controls_ui,
                    address::address_panel_ui,
                    notifications::config_reset_notification_ui,
                ),
            )
                .chain(),
        );
    }
}
