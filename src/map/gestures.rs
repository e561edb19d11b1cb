//! Left-button press recognition on the map.
//!
//! A press that stays within `TAP_SLOP_PX` of where it started is a tap when it is
//! released before `LONG_PRESS_SECS`, and a long press once it has been held that
//! long. The long press fires while the button is still down, at most once per press.
//! Presses that wander further than the slop are drags and produce nothing.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::EguiContexts;

use crate::annotations::AnnotationState;
use crate::constants::{LONG_PRESS_SECS, MARKER_HIT_RADIUS_PX, TAP_SLOP_PX};
use crate::controller::InteractionEvent;
use crate::geo::Coordinate;

use super::camera::MapCamera;

/// A recognized press, in window coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PressGesture {
    Tap(Vec2),
    LongPress(Vec2),
}

#[derive(Debug, Clone, Copy)]
struct Press {
    origin: Vec2,
    held_secs: f32,
    long_press_fired: bool,
}

#[derive(Resource, Debug, Default)]
pub struct PressTracker {
    press: Option<Press>,
}

impl PressTracker {
    pub fn begin(&mut self, at: Vec2) {
        self.press = Some(Press {
            origin: at,
            held_secs: 0.0,
            long_press_fired: false,
        });
    }

    /// Advance a held press. Returns the long press the first time it qualifies.
    pub fn hold(&mut self, at: Vec2, dt: f32) -> Option<PressGesture> {
        let press = self.press.as_mut()?;

        if press.origin.distance(at) > TAP_SLOP_PX {
            self.press = None;
            return None;
        }

        press.held_secs += dt;
        if !press.long_press_fired && press.held_secs >= LONG_PRESS_SECS {
            press.long_press_fired = true;
            return Some(PressGesture::LongPress(press.origin));
        }
        None
    }

    /// End the press. Returns a tap unless the press already became a long press.
    pub fn release(&mut self) -> Option<PressGesture> {
        let press = self.press.take()?;
        (!press.long_press_fired).then_some(PressGesture::Tap(press.origin))
    }

    pub fn cancel(&mut self) {
        self.press = None;
    }

    pub fn is_pressing(&self) -> bool {
        self.press.is_some()
    }
}

/// Whether a tap at `tap` lands on a marker drawn at `marker`, both in window coordinates.
pub fn marker_hit(marker: Vec2, tap: Vec2) -> bool {
    marker.distance(tap) <= MARKER_HIT_RADIUS_PX
}

/// Window and map camera access for converting between screen and map positions
#[derive(SystemParam)]
pub struct MapCursor<'w, 's> {
    window: Query<'w, 's, &'static Window, With<PrimaryWindow>>,
    camera: Query<'w, 's, (&'static Camera, &'static GlobalTransform), With<MapCamera>>,
}

impl MapCursor<'_, '_> {
    pub fn cursor_position(&self) -> Option<Vec2> {
        self.window.single().ok()?.cursor_position()
    }

    pub fn coordinate_at(&self, screen: Vec2) -> Option<Coordinate> {
        let (camera, transform) = self.camera.single().ok()?;
        let world = camera.viewport_to_world_2d(transform, screen).ok()?;
        Some(Coordinate::from_world(world))
    }

    pub fn screen_position_of(&self, at: Coordinate) -> Option<Vec2> {
        let (camera, transform) = self.camera.single().ok()?;
        camera
            .world_to_viewport(transform, at.to_world().extend(0.0))
            .ok()
    }
}

/// System to turn left-button presses on the map into interaction events
pub fn detect_map_gestures(
    time: Res<Time>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut tracker: ResMut<PressTracker>,
    mut contexts: EguiContexts,
    cursor: MapCursor,
    state: Res<AnnotationState>,
    mut events: MessageWriter<InteractionEvent>,
) {
    let Some(cursor_pos) = cursor.cursor_position() else {
        if tracker.is_pressing() {
            debug!("Cursor left the window; dropping press");
            tracker.cancel();
        }
        return;
    };

    if mouse_button.just_pressed(MouseButton::Left) {
        if let Ok(ctx) = contexts.ctx_mut()
            && ctx.is_pointer_over_area()
        {
            return;
        }
        tracker.begin(cursor_pos);
    }

    let gesture = if mouse_button.pressed(MouseButton::Left) {
        tracker.hold(cursor_pos, time.delta_secs())
    } else if mouse_button.just_released(MouseButton::Left) {
        tracker.release()
    } else {
        None
    };

    let event = match gesture {
        Some(PressGesture::LongPress(at)) => cursor.coordinate_at(at).map(InteractionEvent::LongPressAt),
        Some(PressGesture::Tap(at)) => {
            let on_marker = state
                .marker()
                .and_then(|marker| cursor.screen_position_of(marker))
                .is_some_and(|marker| marker_hit(marker, at));

            if on_marker {
                Some(InteractionEvent::TapMarker)
            } else {
                cursor.coordinate_at(at).map(InteractionEvent::TapAt)
            }
        }
        None => None,
    };

    if let Some(event) = event {
        events.write(event);
    }
}
