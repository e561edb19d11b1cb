mod camera;
mod fills;
mod gestures;
mod rendering;

pub use camera::CameraBridge;

use bevy::prelude::*;

use crate::annotations::AnnotationState;
use crate::config::ConfigLoaded;
use crate::controller::InteractionSet;

pub struct MapPlugin;

impl Plugin for MapPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CameraBridge>()
            .init_resource::<gestures::PressTracker>()
            .add_systems(
                Startup,
                (camera::spawn_map_camera.after(ConfigLoaded), fills::spawn_fills),
            )
            .add_systems(
                Update,
                gestures::detect_map_gestures.before(InteractionSet),
            )
            .add_systems(
                Update,
                (
                    camera::camera_pan,
                    camera::camera_wheel_zoom,
                    camera::apply_camera_commands,
                    camera::animate_camera,
                    camera::sync_camera_transform,
                    camera::publish_camera_position,
                )
                    .chain()
                    .after(InteractionSet),
            )
            .add_systems(
                Update,
                (
                    rendering::draw_graticule,
                    rendering::draw_annotations,
                    (rendering::apply_display_mode, fills::sync_fills)
                        .run_if(resource_changed::<AnnotationState>),
                ),
            );
    }
}
