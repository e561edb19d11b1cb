use bevy::prelude::*;
use bevy_egui::{EguiContexts, egui};

use crate::annotations::{AnnotationState, MarkerPhase};
use crate::controller::InteractionController;
use crate::theme;

pub const LOOKING_UP_TEXT: &str = "Looking up address…";

/// What the address panel shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressLine<'a> {
    Address(&'a str),
    LookingUp,
    Failed(&'a str),
}

/// Panel content for the current state, or `None` to hide the panel.
pub fn address_line<'a>(
    state: &'a AnnotationState,
    controller: &'a InteractionController,
) -> Option<AddressLine<'a>> {
    match state.marker_phase() {
        MarkerPhase::Empty => None,
        MarkerPhase::Resolved => state.visible_address().map(AddressLine::Address),
        MarkerPhase::Pending if controller.lookup_in_flight() => Some(AddressLine::LookingUp),
        MarkerPhase::Pending => controller.last_failure().map(AddressLine::Failed),
    }
}

pub fn address_panel_ui(
    mut contexts: EguiContexts,
    state: Res<AnnotationState>,
    controller: Res<InteractionController>,
) -> Result {
    let Some(line) = address_line(&state, &controller) else {
        return Ok(());
    };

    egui::Area::new(egui::Id::new("address_panel"))
        .anchor(egui::Align2::CENTER_TOP, [0.0, 16.0])
        .show(contexts.ctx_mut()?, |ui| {
            egui::Frame::popup(ui.style())
                .inner_margin(egui::Margin::same(12))
                .show(ui, |ui| match line {
                    AddressLine::Address(address) => {
                        ui.label(egui::RichText::new(address).size(16.0).strong());
                    }
                    AddressLine::LookingUp => {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label(egui::RichText::new(LOOKING_UP_TEXT).color(theme::ui::HINT_TEXT));
                        });
                    }
                    AddressLine::Failed(reason) => {
                        ui.label(
                            egui::RichText::new("Address unavailable").color(theme::ui::ERROR_TEXT),
                        )
                        .on_hover_text(reason);
                    }
                });
        });

    Ok(())
}
