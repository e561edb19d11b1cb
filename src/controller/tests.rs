//! Unit tests for the interaction controller.

use std::sync::{Arc, Mutex};

use bevy::prelude::*;
use futures_lite::{future, FutureExt};

use super::events::InteractionEvent;
use super::interaction::{Completion, Followup, InteractionController, Resolution};
use super::{FollowupTask, InteractionPlugin};
use crate::annotations::{AnnotationState, MarkerPhase};
use crate::config::AppConfig;
use crate::map::CameraBridge;
use crate::geo::Coordinate;
use crate::services::{
    CameraAnimation, CameraPosition, CameraService, GeocodeError, GeocodedAddress,
    GeocodingService, ServiceFuture,
};

const RED_SQUARE: Coordinate = Coordinate::new(55.75, 37.61);
const HERMITAGE: Coordinate = Coordinate::new(59.94, 30.31);

#[derive(Debug, Clone, PartialEq)]
enum CameraCall {
    Zoom {
        level: f64,
        duration: f32,
    },
    Center {
        target: Coordinate,
        zoom: f64,
        tilt: f64,
        bearing: f64,
        duration: f32,
        animation: CameraAnimation,
    },
}

#[derive(Default)]
struct RecordingCamera {
    position: Option<CameraPosition>,
    calls: Mutex<Vec<CameraCall>>,
}

impl RecordingCamera {
    fn at_zoom(zoom: f64) -> Self {
        Self {
            position: Some(CameraPosition {
                zoom,
                target: RED_SQUARE,
                tilt: 0.0,
                bearing: 0.0,
            }),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<CameraCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl CameraService for RecordingCamera {
    fn get_position(&self) -> ServiceFuture<Option<CameraPosition>> {
        future::ready(self.position).boxed()
    }

    fn set_zoom(&self, level: f64, animation_duration_secs: f32) {
        self.calls.lock().unwrap().push(CameraCall::Zoom {
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
        self.calls.lock().unwrap().push(CameraCall::Center {
            target,
            zoom,
            tilt: tilt_deg,
            bearing: bearing_deg,
            duration: animation_duration_secs,
            animation,
        });
    }
}

/// Answers with a fixed name per known coordinate, or with a fixed failure.
#[derive(Default)]
struct Gazetteer {
    places: Vec<(Coordinate, &'static str)>,
    failure: Option<GeocodeError>,
}

impl GeocodingService for Gazetteer {
    fn reverse_geocode(
        &self,
        at: Coordinate,
    ) -> ServiceFuture<Result<Option<GeocodedAddress>, GeocodeError>> {
        let outcome = match &self.failure {
            Some(e) => Err(e.clone()),
            None => Ok(self
                .places
                .iter()
                .find(|(place, _)| *place == at)
                .map(|(_, name)| GeocodedAddress {
                    formatted: name.to_string(),
                })),
        };
        future::ready(outcome).boxed()
    }
}

fn moscow_gazetteer() -> Gazetteer {
    Gazetteer {
        places: vec![(RED_SQUARE, "Red Square"), (HERMITAGE, "Hermitage")],
        failure: None,
    }
}

fn controller_with(geocoder: Gazetteer) -> InteractionController {
    let mut controller = InteractionController::default();
    controller.attach_geocoder(Arc::new(geocoder));
    controller
}

fn resolve(followup: Followup) -> Completion {
    future::block_on(followup.into_completion())
}

fn long_press(
    controller: &mut InteractionController,
    state: &mut AnnotationState,
    at: Coordinate,
) -> Followup {
    controller
        .handle(state, InteractionEvent::LongPressAt(at))
        .expect("long press should start a lookup")
}

#[test]
fn test_long_press_places_marker_immediately() {
    let mut controller = controller_with(moscow_gazetteer());
    let mut state = AnnotationState::default();

    let followup = long_press(&mut controller, &mut state, RED_SQUARE);

    assert_eq!(state.marker(), Some(RED_SQUARE));
    assert!(state.address().is_none());
    assert_eq!(state.marker_phase(), MarkerPhase::Pending);
    assert!(controller.lookup_in_flight());
    assert!(matches!(
        followup,
        Followup::ReverseGeocode { origin, .. } if origin == RED_SQUARE
    ));
}

#[test]
fn test_relevant_lookup_sets_address() {
    let mut controller = controller_with(moscow_gazetteer());
    let mut state = AnnotationState::default();

    let followup = long_press(&mut controller, &mut state, RED_SQUARE);
    let resolution = controller.complete(&mut state, resolve(followup));

    assert_eq!(resolution, Resolution::Applied);
    assert_eq!(state.address(), Some("Red Square"));
    assert_eq!(state.marker_phase(), MarkerPhase::Resolved);
    assert!(!controller.lookup_in_flight());
}

#[test]
fn test_slow_lookup_never_overwrites_newer_marker() {
    let mut controller = controller_with(moscow_gazetteer());
    let mut state = AnnotationState::default();

    let first = long_press(&mut controller, &mut state, RED_SQUARE);
    let second = long_press(&mut controller, &mut state, HERMITAGE);

    // First answer arrives after the second long press
    assert_eq!(
        controller.complete(&mut state, resolve(first)),
        Resolution::Stale
    );
    assert_eq!(state.marker(), Some(HERMITAGE));
    assert!(state.address().is_none());

    assert_eq!(
        controller.complete(&mut state, resolve(second)),
        Resolution::Applied
    );
    assert_eq!(state.address(), Some("Hermitage"));
}

#[test]
fn test_stale_lookup_after_newer_resolution_is_ignored() {
    let mut controller = controller_with(moscow_gazetteer());
    let mut state = AnnotationState::default();

    let first = long_press(&mut controller, &mut state, RED_SQUARE);
    let second = long_press(&mut controller, &mut state, HERMITAGE);
    controller.complete(&mut state, resolve(second));
    controller.complete(&mut state, resolve(first));

    assert_eq!(state.address(), Some("Hermitage"));
}

#[test]
fn test_lookup_after_marker_tap_is_discarded() {
    let mut controller = controller_with(moscow_gazetteer());
    let mut state = AnnotationState::default();

    let followup = long_press(&mut controller, &mut state, RED_SQUARE);
    assert!(controller
        .handle(&mut state, InteractionEvent::TapMarker)
        .is_none());
    assert!(!controller.lookup_in_flight());

    assert_eq!(
        controller.complete(&mut state, resolve(followup)),
        Resolution::Stale
    );
    assert!(state.marker().is_none());
    assert!(state.address().is_none());
}

#[test]
fn test_lookup_after_clear_all_is_discarded() {
    let mut controller = controller_with(moscow_gazetteer());
    let mut state = AnnotationState::default();

    let followup = long_press(&mut controller, &mut state, RED_SQUARE);
    controller.handle(&mut state, InteractionEvent::ClearAll);
    controller.complete(&mut state, resolve(followup));

    assert_eq!(state, AnnotationState::default());
}

#[test]
fn test_old_lookup_for_same_spot_is_discarded_after_replacing_marker() {
    let mut controller = controller_with(moscow_gazetteer());
    let mut state = AnnotationState::default();

    let old = long_press(&mut controller, &mut state, RED_SQUARE);
    controller.handle(&mut state, InteractionEvent::TapMarker);
    let current = long_press(&mut controller, &mut state, RED_SQUARE);

    assert_eq!(
        controller.complete(&mut state, resolve(old)),
        Resolution::Stale
    );
    assert!(controller.lookup_in_flight());
    assert_eq!(
        controller.complete(&mut state, resolve(current)),
        Resolution::Applied
    );
    assert_eq!(state.address(), Some("Red Square"));
}

#[test]
fn test_no_result_leaves_address_absent() {
    let mut controller = controller_with(Gazetteer::default());
    let mut state = AnnotationState::default();

    let followup = long_press(&mut controller, &mut state, RED_SQUARE);
    let resolution = controller.complete(&mut state, resolve(followup));

    assert_eq!(resolution, Resolution::NoResult);
    assert_eq!(state.marker(), Some(RED_SQUARE));
    assert!(state.address().is_none());
    assert!(!controller.lookup_in_flight());
    assert!(controller.last_failure().is_none());
}

#[test]
fn test_geocoder_failure_does_not_touch_state() {
    let mut controller = controller_with(Gazetteer {
        places: vec![],
        failure: Some(GeocodeError::Unauthorized(403)),
    });
    let mut state = AnnotationState::default();

    let followup = long_press(&mut controller, &mut state, RED_SQUARE);
    let before = state.clone();
    let resolution = controller.complete(&mut state, resolve(followup));

    assert_eq!(resolution, Resolution::Failed);
    assert_eq!(state, before);
    assert!(controller.last_failure().is_some_and(|e| e.contains("403")));
}

#[test]
fn test_long_press_without_geocoder_still_places_marker() {
    let mut controller = InteractionController::default();
    let mut state = AnnotationState::default();

    let followup = controller.handle(&mut state, InteractionEvent::LongPressAt(RED_SQUARE));

    assert!(followup.is_none());
    assert_eq!(state.marker(), Some(RED_SQUARE));
    assert!(!controller.lookup_in_flight());
}

#[test]
fn test_background_taps_accumulate_in_order() {
    let mut controller = InteractionController::default();
    let mut state = AnnotationState::default();
    let taps = [
        Coordinate::new(55.70, 37.50),
        Coordinate::new(55.80, 37.50),
        Coordinate::new(55.80, 37.70),
        Coordinate::new(55.80, 37.70),
    ];

    for tap in taps {
        assert!(controller
            .handle(&mut state, InteractionEvent::TapAt(tap))
            .is_none());
    }

    assert_eq!(state.outline_vertices(), &taps);
}

#[test]
fn test_zoom_steps_use_exact_factor_and_duration() {
    let camera = Arc::new(RecordingCamera::at_zoom(10.0));
    let mut controller = InteractionController::default();
    controller.attach_camera(camera.clone());
    let mut state = AnnotationState::default();

    let zoom_in = controller
        .handle(&mut state, InteractionEvent::ZoomIn)
        .expect("zoom in should query the camera");
    assert_eq!(
        controller.complete(&mut state, resolve(zoom_in)),
        Resolution::Applied
    );

    let zoom_out = controller
        .handle(&mut state, InteractionEvent::ZoomOut)
        .expect("zoom out should query the camera");
    controller.complete(&mut state, resolve(zoom_out));

    assert_eq!(
        camera.calls(),
        vec![
            CameraCall::Zoom {
                level: 10.0 * 1.1,
                duration: 0.1,
            },
            CameraCall::Zoom {
                level: 10.0 * 0.9,
                duration: 0.1,
            },
        ]
    );
    assert_eq!(state, AnnotationState::default());
}

#[test]
fn test_zoom_without_camera_is_noop() {
    let mut controller = InteractionController::default();
    let mut state = AnnotationState::default();

    assert!(controller
        .handle(&mut state, InteractionEvent::ZoomIn)
        .is_none());
    assert!(controller
        .handle(&mut state, InteractionEvent::ZoomOut)
        .is_none());
}

#[test]
fn test_zoom_with_detached_camera_surface_is_skipped() {
    let camera = Arc::new(RecordingCamera::default());
    let mut controller = InteractionController::default();
    controller.attach_camera(camera.clone());
    let mut state = AnnotationState::default();

    let followup = controller
        .handle(&mut state, InteractionEvent::ZoomIn)
        .expect("zoom in should query the camera");

    assert_eq!(
        controller.complete(&mut state, resolve(followup)),
        Resolution::Skipped
    );
    assert!(camera.calls().is_empty());
}

#[test]
fn test_recenter_moves_camera_to_marker() {
    let camera = Arc::new(RecordingCamera::at_zoom(5.0));
    let mut controller = controller_with(moscow_gazetteer());
    controller.attach_camera(camera.clone());
    let mut state = AnnotationState::default();

    long_press(&mut controller, &mut state, HERMITAGE);
    let before = state.clone();
    assert!(controller
        .handle(&mut state, InteractionEvent::Recenter)
        .is_none());

    assert_eq!(state, before);
    assert_eq!(
        camera.calls(),
        vec![CameraCall::Center {
            target: HERMITAGE,
            zoom: 14.0,
            tilt: 0.0,
            bearing: 0.0,
            duration: 0.4,
            animation: CameraAnimation::Smooth,
        }]
    );
}

#[test]
fn test_recenter_without_marker_is_noop() {
    let camera = Arc::new(RecordingCamera::at_zoom(5.0));
    let mut controller = InteractionController::default();
    controller.attach_camera(camera.clone());
    let mut state = AnnotationState::default();

    controller.handle(&mut state, InteractionEvent::Recenter);

    assert!(camera.calls().is_empty());
}

#[test]
fn test_clear_all_also_resets_night_mode() {
    let mut controller = InteractionController::default();
    let mut state = AnnotationState::default();

    controller.handle(&mut state, InteractionEvent::ToggleNightMode);
    assert!(state.night_mode());

    controller.handle(&mut state, InteractionEvent::ClearAll);
    controller.handle(&mut state, InteractionEvent::ClearAll);
    assert_eq!(state, AnnotationState::default());
}

#[test]
fn test_address_never_outlives_marker() {
    let mut controller = controller_with(moscow_gazetteer());
    let mut state = AnnotationState::default();
    let mut in_flight = Vec::new();

    let script = [
        InteractionEvent::LongPressAt(RED_SQUARE),
        InteractionEvent::TapAt(HERMITAGE),
        InteractionEvent::LongPressAt(HERMITAGE),
        InteractionEvent::TapMarker,
        InteractionEvent::LongPressAt(RED_SQUARE),
        InteractionEvent::ToggleNightMode,
        InteractionEvent::ClearAll,
        InteractionEvent::LongPressAt(HERMITAGE),
    ];

    for event in script {
        if let Some(followup) = controller.handle(&mut state, event) {
            in_flight.push(followup);
        }
        assert!(state.address().is_none() || state.marker().is_some());
    }

    // Answers arrive newest first
    while let Some(followup) = in_flight.pop() {
        controller.complete(&mut state, resolve(followup));
        assert!(state.address().is_none() || state.marker().is_some());
    }

    assert_eq!(state.marker(), Some(HERMITAGE));
    assert_eq!(state.address(), Some("Hermitage"));
}

#[test]
fn test_end_to_end_session() {
    let mut controller = controller_with(moscow_gazetteer());
    let mut state = AnnotationState::default();

    let followup = long_press(&mut controller, &mut state, RED_SQUARE);
    assert_eq!(state.marker(), Some(RED_SQUARE));
    assert!(state.address().is_none());

    controller.complete(&mut state, resolve(followup));
    assert_eq!(state.address(), Some("Red Square"));

    controller.handle(&mut state, InteractionEvent::TapMarker);
    assert!(state.marker().is_none());
    assert!(state.address().is_none());

    let p1 = Coordinate::new(55.70, 37.55);
    let p2 = Coordinate::new(55.72, 37.65);
    let p3 = Coordinate::new(55.76, 37.60);
    for p in [p1, p2, p3] {
        controller.handle(&mut state, InteractionEvent::TapAt(p));
    }
    assert_eq!(state.outline_vertices(), &[p1, p2, p3]);

    controller.handle(&mut state, InteractionEvent::ClearAll);
    assert_eq!(state, AnnotationState::default());
}

#[test]
fn test_lookups_run_as_io_and_zoom_queries_do_not() {
    let mut controller = controller_with(moscow_gazetteer());
    controller.attach_camera(Arc::new(RecordingCamera::at_zoom(10.0)));
    let mut state = AnnotationState::default();

    let lookup = long_press(&mut controller, &mut state, RED_SQUARE);
    assert!(lookup.performs_io());

    let zoom = controller
        .handle(&mut state, InteractionEvent::ZoomIn)
        .unwrap();
    assert!(!zoom.performs_io());
}

// The tests below run the controller systems inside an App, so messages, task
// spawning and polling are exercised the way the running application uses them.

fn interaction_app(geocoder: Gazetteer) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .init_resource::<AppConfig>()
        .init_resource::<CameraBridge>()
        .add_plugins(InteractionPlugin);

    // Startup attaches the configured services; swap in the test geocoder afterwards
    app.update();
    app.world_mut()
        .resource_mut::<InteractionController>()
        .attach_geocoder(Arc::new(geocoder));
    app
}

fn followup_count(app: &mut App) -> usize {
    let world = app.world_mut();
    world.query::<&FollowupTask>().iter(world).count()
}

/// Run frames until every followup task has been polled to completion.
fn settle(app: &mut App) {
    app.update();
    for _ in 0..500 {
        if followup_count(app) == 0 {
            return;
        }
        std::thread::sleep(std::time::Duration::from_millis(2));
        app.update();
    }
    panic!("followup tasks never finished");
}

#[test]
fn test_app_applies_only_latest_lookup() {
    let mut app = interaction_app(moscow_gazetteer());

    app.world_mut()
        .write_message(InteractionEvent::LongPressAt(RED_SQUARE));
    app.world_mut()
        .write_message(InteractionEvent::LongPressAt(HERMITAGE));
    settle(&mut app);

    let state = app.world().resource::<AnnotationState>();
    assert_eq!(state.marker(), Some(HERMITAGE));
    assert_eq!(state.address(), Some("Hermitage"));
    assert_eq!(followup_count(&mut app), 0);
    assert!(
        !app.world()
            .resource::<InteractionController>()
            .lookup_in_flight()
    );
}

#[test]
fn test_app_clear_all_discards_pending_lookup() {
    let mut app = interaction_app(moscow_gazetteer());

    app.world_mut()
        .write_message(InteractionEvent::LongPressAt(RED_SQUARE));
    app.world_mut().write_message(InteractionEvent::ClearAll);
    settle(&mut app);

    assert_eq!(
        *app.world().resource::<AnnotationState>(),
        AnnotationState::default()
    );
    assert_eq!(followup_count(&mut app), 0);
}

#[test]
fn test_app_lookup_across_frames() {
    let mut app = interaction_app(moscow_gazetteer());

    app.world_mut()
        .write_message(InteractionEvent::LongPressAt(RED_SQUARE));
    settle(&mut app);
    assert_eq!(
        app.world().resource::<AnnotationState>().address(),
        Some("Red Square")
    );

    // A later tap on the marker removes it together with its address
    app.world_mut().write_message(InteractionEvent::TapMarker);
    app.update();
    let state = app.world().resource::<AnnotationState>();
    assert!(state.marker().is_none());
    assert!(state.address().is_none());
}
