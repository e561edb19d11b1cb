use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::annotations::AnnotationState;
use crate::constants::{DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH, MARKER_RADIUS_METERS};
use crate::geo::{Coordinate, MAX_LATITUDE, meters_to_world, zoom_to_scale};
use crate::theme;

use super::camera::MapCamera;

/// Graticule spacings in degrees, coarsest first
const GRATICULE_STEPS: [f64; 10] = [30.0, 10.0, 5.0, 1.0, 0.5, 0.1, 0.05, 0.01, 0.005, 0.001];

/// Upper bound on lines per direction, in case the view is far larger than expected
const MAX_GRATICULE_LINES: i64 = 200;

/// Pin dimensions in screen pixels
const PIN_HEIGHT_PX: f32 = 22.0;
const PIN_HEAD_RADIUS_PX: f32 = 6.0;
const VERTEX_RADIUS_PX: f32 = 3.0;

/// Degrees between graticule lines at a zoom level.
///
/// Picks the coarsest step that fits inside one 256 px tile.
pub fn graticule_spacing(zoom: f64) -> f64 {
    let tile_span = 360.0 / 2f64.powf(zoom);
    GRATICULE_STEPS
        .iter()
        .copied()
        .find(|step| *step <= tile_span)
        .unwrap_or(GRATICULE_STEPS[GRATICULE_STEPS.len() - 1])
}

/// Outline points for the drawn area, closed back to the first vertex.
///
/// `None` until there are enough vertices to enclose an area.
pub fn closed_outline(vertices: &[Coordinate]) -> Option<Vec<Vec2>> {
    if vertices.len() <= 2 {
        return None;
    }

    let mut points: Vec<Vec2> = vertices.iter().map(|v| v.to_world()).collect();
    points.push(points[0]);
    Some(points)
}

pub fn draw_graticule(
    mut gizmos: Gizmos,
    state: Res<AnnotationState>,
    window: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<&MapCamera>,
) {
    let Ok(camera) = cameras.single() else {
        return;
    };

    let window_size = window
        .single()
        .map(|w| w.size())
        .unwrap_or(Vec2::new(DEFAULT_WINDOW_WIDTH, DEFAULT_WINDOW_HEIGHT));

    // Cover the diagonal so a rotated view is still filled
    let half_extent = window_size.length() / 2.0 * zoom_to_scale(camera.view.zoom);
    let center = camera.view.target.to_world();
    let south_west = Coordinate::from_world(center - Vec2::splat(half_extent));
    let north_east = Coordinate::from_world(center + Vec2::splat(half_extent));

    let step = graticule_spacing(camera.view.zoom);
    let color = theme::palette(state.night_mode()).graticule;

    let lat_min = south_west.lat.max(-MAX_LATITUDE);
    let lat_max = north_east.lat.min(MAX_LATITUDE);
    let bottom = Coordinate::new(lat_min, 0.0).to_world().y;
    let top = Coordinate::new(lat_max, 0.0).to_world().y;
    let left = center.x - half_extent;
    let right = center.x + half_extent;

    let (first, last) = line_range(south_west.lon, north_east.lon, step);
    for i in first..=last {
        let x = Coordinate::new(0.0, i as f64 * step).to_world().x;
        gizmos.line_2d(Vec2::new(x, bottom), Vec2::new(x, top), color);
    }

    let (first, last) = line_range(lat_min, lat_max, step);
    for i in first..=last {
        let y = Coordinate::new(i as f64 * step, 0.0).to_world().y;
        gizmos.line_2d(Vec2::new(left, y), Vec2::new(right, y), color);
    }
}

fn line_range(min: f64, max: f64, step: f64) -> (i64, i64) {
    let first = (min / step).ceil() as i64;
    let last = (max / step).floor() as i64;
    (first, last.min(first + MAX_GRATICULE_LINES))
}

pub fn draw_annotations(
    mut gizmos: Gizmos,
    state: Res<AnnotationState>,
    cameras: Query<&MapCamera>,
) {
    let Ok(camera) = cameras.single() else {
        return;
    };

    let palette = theme::palette(state.night_mode());
    let px = zoom_to_scale(camera.view.zoom);

    if let Some(points) = closed_outline(state.outline_vertices()) {
        gizmos.linestrip_2d(points, palette.area_outline);
    }
    for vertex in state.outline_vertices() {
        gizmos.circle_2d(vertex.to_world(), VERTEX_RADIUS_PX * px, palette.area_outline);
    }

    if let Some(marker) = state.marker() {
        let tip = marker.to_world();
        gizmos.circle_2d(
            tip,
            meters_to_world(MARKER_RADIUS_METERS, marker.lat),
            palette.marker_radius,
        );

        let head = tip + Vec2::Y * PIN_HEIGHT_PX * px;
        gizmos.line_2d(tip, head, palette.marker);
        gizmos.circle_2d(head, PIN_HEAD_RADIUS_PX * px, palette.marker);
    }
}

/// System to switch the clear color between day and night
pub fn apply_display_mode(state: Res<AnnotationState>, mut clear_color: ResMut<ClearColor>) {
    let background = theme::palette(state.night_mode()).background;
    if clear_color.0 != background {
        clear_color.0 = background;
    }
}
