//! The map camera and the [`CameraService`] adapter that drives it.
//!
//! The service half (`BevyCameraService`) can be called from anywhere, including
//! futures on the task pool: it only queues commands and reads the last published
//! position through a shared `CameraLink`. The systems half drains the queue,
//! animates the `MapCamera` component and publishes its position back every frame.

use std::sync::{Arc, Mutex};

use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use futures_lite::FutureExt;
use futures_lite::future;

use crate::config::AppConfig;
use crate::constants::{MAX_ZOOM, MIN_ZOOM, WHEEL_ZOOM_STEP};
use crate::geo::{Coordinate, zoom_to_scale};
use crate::services::{CameraAnimation, CameraPosition, CameraService, ServiceFuture};

/// What the map camera is looking at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    pub target: Coordinate,
    pub zoom: f64,
    pub tilt: f64,
    pub bearing: f64,
}

impl MapView {
    fn position(&self) -> CameraPosition {
        CameraPosition {
            zoom: self.zoom,
            target: self.target,
            tilt: self.tilt,
            bearing: self.bearing,
        }
    }

    fn clamped(self) -> Self {
        Self {
            zoom: self.zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct CameraTween {
    from: MapView,
    to: MapView,
    elapsed: f32,
    duration: f32,
    animation: CameraAnimation,
}

impl CameraTween {
    fn finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    fn sample(&self) -> MapView {
        if self.finished() {
            return self.to;
        }

        let t = self.animation.ease(self.elapsed / self.duration) as f64;
        let lerp = |a: f64, b: f64| a + (b - a) * t;
        let target = if self.from.target == self.to.target {
            self.to.target
        } else {
            let from = self.from.target.to_world();
            let to = self.to.target.to_world();
            Coordinate::from_world(from.lerp(to, t as f32))
        };

        MapView {
            target,
            zoom: lerp(self.from.zoom, self.to.zoom),
            tilt: lerp(self.from.tilt, self.to.tilt),
            bearing: lerp(self.from.bearing, self.to.bearing),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum CameraCommand {
    Zoom {
        level: f64,
        duration: f32,
    },
    Center {
        view: MapView,
        duration: f32,
        animation: CameraAnimation,
    },
}

#[derive(Component, Debug)]
pub struct MapCamera {
    pub view: MapView,
    tween: Option<CameraTween>,
}

impl MapCamera {
    pub fn new(view: MapView) -> Self {
        Self {
            view: view.clamped(),
            tween: None,
        }
    }

    pub fn is_animating(&self) -> bool {
        self.tween.is_some()
    }

    /// Start a new animation from wherever the camera is now, replacing any running one.
    fn animate_to(&mut self, to: MapView, duration: f32, animation: CameraAnimation) {
        let to = to.clamped();
        if duration <= 0.0 {
            self.view = to;
            self.tween = None;
            return;
        }

        self.tween = Some(CameraTween {
            from: self.view,
            to,
            elapsed: 0.0,
            duration,
            animation,
        });
    }

    fn apply(&mut self, command: CameraCommand) {
        match command {
            CameraCommand::Zoom { level, duration } => {
                let to = MapView {
                    zoom: level,
                    ..self.view
                };
                self.animate_to(to, duration, CameraAnimation::Smooth);
            }
            CameraCommand::Center {
                view,
                duration,
                animation,
            } => self.animate_to(view, duration, animation),
        }
    }

    fn advance(&mut self, dt: f32) {
        if let Some(tween) = &mut self.tween {
            tween.elapsed += dt;
            self.view = tween.sample();
            if tween.finished() {
                self.tween = None;
            }
        }
    }

    /// Move the view by a world-space offset. Cancels any animation.
    pub fn pan_by(&mut self, world_delta: Vec2) {
        self.tween = None;
        self.view.target = Coordinate::from_world(self.view.target.to_world() + world_delta);
    }

    /// Change the zoom level directly. Cancels any animation.
    pub fn zoom_by(&mut self, levels: f64) {
        self.tween = None;
        self.view.zoom = (self.view.zoom + levels).clamp(MIN_ZOOM, MAX_ZOOM);
    }
}

#[derive(Debug, Default)]
struct CameraLink {
    /// Last published position; `None` while no map camera exists
    position: Option<CameraPosition>,
    queued: Vec<CameraCommand>,
}

/// [`CameraService`] backed by the Bevy map camera.
#[derive(Clone, Default)]
pub struct BevyCameraService {
    link: Arc<Mutex<CameraLink>>,
}

impl BevyCameraService {
    fn enqueue(&self, command: CameraCommand) {
        match self.link.lock() {
            Ok(mut link) => link.queued.push(command),
            Err(_) => warn!("Camera link poisoned; dropping {:?}", command),
        }
    }

    fn take_commands(&self) -> Vec<CameraCommand> {
        self.link
            .lock()
            .map(|mut link| std::mem::take(&mut link.queued))
            .unwrap_or_default()
    }

    fn publish(&self, position: Option<CameraPosition>) {
        if let Ok(mut link) = self.link.lock() {
            link.position = position;
        }
    }

    fn current_position(&self) -> Option<CameraPosition> {
        self.link.lock().ok().and_then(|link| link.position)
    }
}

impl CameraService for BevyCameraService {
    fn get_position(&self) -> ServiceFuture<Option<CameraPosition>> {
        future::ready(self.current_position()).boxed()
    }

    fn set_zoom(&self, level: f64, animation_duration_secs: f32) {
        self.enqueue(CameraCommand::Zoom {
            level,
            duration: animation_duration_secs,
        });
    }

    fn set_center(
        &self,
        target: Coordinate,
        zoom: f64,
        tilt_deg: f64,
        bearing_deg: f64,
        animation_duration_secs: f32,
        animation: CameraAnimation,
    ) {
        self.enqueue(CameraCommand::Center {
            view: MapView {
                target,
                zoom,
                tilt: tilt_deg,
                bearing: bearing_deg,
            },
            duration: animation_duration_secs,
            animation,
        });
    }
}

/// Owns the camera service shared with the interaction controller
#[derive(Resource, Default)]
pub struct CameraBridge {
    service: BevyCameraService,
}

impl CameraBridge {
    pub fn service(&self) -> BevyCameraService {
        self.service.clone()
    }
}

pub fn spawn_map_camera(mut commands: Commands, config: Res<AppConfig>) {
    let start = config.data.start_view;
    let camera = MapCamera::new(MapView {
        target: start.center,
        zoom: start.zoom,
        tilt: 0.0,
        bearing: 0.0,
    });

    commands.spawn((
        Camera2d,
        Transform::from_translation(camera.view.target.to_world().extend(1000.0)),
        camera,
    ));
}

/// System to hand queued service commands to the map camera
pub fn apply_camera_commands(bridge: Res<CameraBridge>, mut cameras: Query<&mut MapCamera>) {
    let commands = bridge.service.take_commands();
    if commands.is_empty() {
        return;
    }

    let Ok(mut camera) = cameras.single_mut() else {
        debug!("No map camera; dropping {} camera commands", commands.len());
        return;
    };

    for command in commands {
        camera.apply(command);
    }
}

pub fn animate_camera(time: Res<Time>, mut cameras: Query<&mut MapCamera>) {
    for mut camera in cameras.iter_mut() {
        if camera.is_animating() {
            camera.advance(time.delta_secs());
        }
    }
}

pub fn sync_camera_transform(
    mut cameras: Query<(&MapCamera, &mut Transform, &mut Projection), Changed<MapCamera>>,
) {
    for (camera, mut transform, mut projection) in cameras.iter_mut() {
        let view = camera.view;
        transform.translation = view.target.to_world().extend(transform.translation.z);
        transform.rotation = Quat::from_rotation_z(-(view.bearing as f32).to_radians());

        if let Projection::Orthographic(ref mut ortho) = *projection {
            ortho.scale = zoom_to_scale(view.zoom);
        }
    }
}

/// System to publish the camera position for `CameraService::get_position`
pub fn publish_camera_position(bridge: Res<CameraBridge>, cameras: Query<&MapCamera>) {
    let position = cameras.single().ok().map(|camera| camera.view.position());
    bridge.service.publish(position);
}

pub fn camera_pan(
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: MessageReader<MouseMotion>,
    mut cameras: Query<&mut MapCamera>,
) {
    if !mouse_button.any_pressed([MouseButton::Middle, MouseButton::Right]) {
        mouse_motion.clear();
        return;
    }

    let Ok(mut camera) = cameras.single_mut() else {
        return;
    };

    let scale = zoom_to_scale(camera.view.zoom);
    let rotation = Vec2::from_angle(-(camera.view.bearing as f32).to_radians());

    for event in mouse_motion.read() {
        let screen_delta = Vec2::new(-event.delta.x, event.delta.y) * scale;
        camera.pan_by(rotation.rotate(screen_delta));
    }
}

pub fn camera_wheel_zoom(
    mut scroll_events: MessageReader<MouseWheel>,
    mut cameras: Query<&mut MapCamera>,
) {
    let Ok(mut camera) = cameras.single_mut() else {
        scroll_events.clear();
        return;
    };

    for event in scroll_events.read() {
        let levels = match event.unit {
            MouseScrollUnit::Line => event.y as f64 * WHEEL_ZOOM_STEP,
            MouseScrollUnit::Pixel => event.y as f64 * 0.01,
        };
        camera.zoom_by(levels);
    }
}
