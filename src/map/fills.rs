//! Translucent fills under the marker circle and the drawn area.
//!
//! Gizmos only draw lines, so each fill is a `Mesh2d` entity whose mesh, material
//! and visibility follow the annotation state.

use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;

use crate::annotations::AnnotationState;
use crate::constants::MARKER_RADIUS_METERS;
use crate::geo::{Coordinate, meters_to_world};
use crate::theme;

const AREA_FILL_Z: f32 = 0.0;
const MARKER_FILL_Z: f32 = 0.1;

#[derive(Component)]
pub struct AreaFill;

/// Unit circle scaled to the marker radius
#[derive(Component)]
pub struct MarkerFill;

/// Triangle indices covering a polygon, wound counter-clockwise.
///
/// Ear clipping, so concave outlines are covered exactly. Whatever a
/// self-intersecting outline leaves unclipped is closed with a fan.
/// Returns `None` for fewer than three points or a degenerate outline.
pub fn triangulate(points: &[Vec2]) -> Option<Vec<u32>> {
    if points.len() < 3 {
        return None;
    }

    let area = signed_area(points);
    if area.abs() <= f32::EPSILON {
        return None;
    }

    let mut remaining: Vec<usize> = (0..points.len()).collect();
    if area < 0.0 {
        remaining.reverse();
    }

    let mut indices = Vec::with_capacity((points.len() - 2) * 3);
    while remaining.len() > 3 {
        let n = remaining.len();
        let corner = |i: usize| {
            (
                remaining[(i + n - 1) % n],
                remaining[i],
                remaining[(i + 1) % n],
            )
        };

        let Some(ear) = (0..n).find(|&i| {
            let (a, b, c) = corner(i);
            is_ear(points, &remaining, a, b, c)
        }) else {
            break;
        };

        let (a, b, c) = corner(ear);
        indices.extend([a as u32, b as u32, c as u32]);
        remaining.remove(ear);
    }

    for pair in remaining[1..].windows(2) {
        indices.extend([remaining[0] as u32, pair[0] as u32, pair[1] as u32]);
    }
    Some(indices)
}

/// Positive for counter-clockwise outlines.
fn signed_area(points: &[Vec2]) -> f32 {
    let twice: f32 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.perp_dot(*b))
        .sum();
    twice / 2.0
}

fn is_ear(points: &[Vec2], remaining: &[usize], a: usize, b: usize, c: usize) -> bool {
    let (pa, pb, pc) = (points[a], points[b], points[c]);
    if (pb - pa).perp_dot(pc - pb) <= 0.0 {
        return false;
    }

    remaining
        .iter()
        .filter(|&&i| i != a && i != b && i != c)
        .all(|&i| !in_triangle(points[i], pa, pb, pc))
}

fn in_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    (b - a).perp_dot(p - a) >= 0.0 && (c - b).perp_dot(p - b) >= 0.0 && (a - c).perp_dot(p - c) >= 0.0
}

/// Fill mesh for the drawn area and the world position it is relative to.
///
/// Vertices are stored relative to the first one to keep f32 precision at high zoom.
pub fn area_fill_mesh(vertices: &[Coordinate]) -> Option<(Vec2, Mesh)> {
    let origin = vertices.first()?.to_world();
    let points: Vec<Vec2> = vertices.iter().map(|v| v.to_world() - origin).collect();
    let indices = triangulate(&points)?;

    let positions: Vec<[f32; 3]> = points.iter().map(|p| [p.x, p.y, 0.0]).collect();
    let normals = vec![[0.0, 0.0, 1.0]; points.len()];
    let uvs = vec![[0.0, 0.0]; points.len()];

    let mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
        .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, uvs)
        .with_inserted_indices(Indices::U32(indices));

    Some((origin, mesh))
}

pub fn spawn_fills(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    let palette = theme::palette(false);

    commands.spawn((
        AreaFill,
        Mesh2d(meshes.add(Rectangle::default())),
        MeshMaterial2d(materials.add(palette.area_fill)),
        Transform::from_xyz(0.0, 0.0, AREA_FILL_Z),
        Visibility::Hidden,
    ));

    commands.spawn((
        MarkerFill,
        Mesh2d(meshes.add(Circle::new(1.0))),
        MeshMaterial2d(materials.add(palette.marker_fill)),
        Transform::from_xyz(0.0, 0.0, MARKER_FILL_Z),
        Visibility::Hidden,
    ));
}

fn set_fill_color(
    materials: &mut Assets<ColorMaterial>,
    material: &mut MeshMaterial2d<ColorMaterial>,
    color: Color,
) {
    if materials.get(&material.0).map(|m| m.color) != Some(color) {
        material.0 = materials.add(color);
    }
}

/// System to rebuild the fills after the annotation state changed
#[allow(clippy::type_complexity)]
pub fn sync_fills(
    state: Res<AnnotationState>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    mut area: Query<
        (
            &mut Mesh2d,
            &mut MeshMaterial2d<ColorMaterial>,
            &mut Transform,
            &mut Visibility,
        ),
        (With<AreaFill>, Without<MarkerFill>),
    >,
    mut marker: Query<
        (
            &mut MeshMaterial2d<ColorMaterial>,
            &mut Transform,
            &mut Visibility,
        ),
        (With<MarkerFill>, Without<AreaFill>),
    >,
) {
    let palette = theme::palette(state.night_mode());

    if let Ok((mut mesh, mut material, mut transform, mut visibility)) = area.single_mut() {
        set_fill_color(&mut materials, &mut material, palette.area_fill);

        match area_fill_mesh(state.outline_vertices()) {
            Some((origin, fill)) => {
                mesh.0 = meshes.add(fill);
                transform.translation = origin.extend(AREA_FILL_Z);
                *visibility = Visibility::Inherited;
            }
            None => *visibility = Visibility::Hidden,
        }
    }

    if let Ok((mut material, mut transform, mut visibility)) = marker.single_mut() {
        set_fill_color(&mut materials, &mut material, palette.marker_fill);

        match state.marker() {
            Some(at) => {
                let radius = meters_to_world(MARKER_RADIUS_METERS, at.lat);
                transform.translation = at.to_world().extend(MARKER_FILL_Z);
                transform.scale = Vec3::new(radius, radius, 1.0);
                *visibility = Visibility::Inherited;
            }
            None => *visibility = Visibility::Hidden,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangles_area(points: &[Vec2], indices: &[u32]) -> f32 {
        indices
            .chunks(3)
            .map(|t| {
                let (a, b, c) = (
                    points[t[0] as usize],
                    points[t[1] as usize],
                    points[t[2] as usize],
                );
                (b - a).perp_dot(c - a) / 2.0
            })
            .sum()
    }

    #[test]
    fn test_triangulate_needs_three_points() {
        assert!(triangulate(&[]).is_none());
        assert!(triangulate(&[Vec2::ZERO, Vec2::X]).is_none());
    }

    #[test]
    fn test_triangulate_rejects_collinear_points() {
        assert!(triangulate(&[Vec2::ZERO, Vec2::X, Vec2::new(2.0, 0.0)]).is_none());
    }

    #[test]
    fn test_triangulate_square() {
        let square = [
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
        ];
        let indices = triangulate(&square).unwrap();

        assert_eq!(indices.len(), 6);
        assert!((triangles_area(&square, &indices) - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_triangulate_concave_outline_exactly() {
        // An L shape: a fan from the first vertex would cover the notch
        let l_shape = [
            Vec2::new(0.0, 0.0),
            Vec2::new(20.0, 0.0),
            Vec2::new(20.0, 10.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(10.0, 20.0),
            Vec2::new(0.0, 20.0),
        ];
        let indices = triangulate(&l_shape).unwrap();

        assert_eq!(indices.len(), (l_shape.len() - 2) * 3);
        assert!((triangles_area(&l_shape, &indices) - 300.0).abs() < 1e-3);
    }

    #[test]
    fn test_triangulate_clockwise_outline_winds_counter_clockwise() {
        let clockwise = [
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, 10.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(10.0, 0.0),
        ];
        let indices = triangulate(&clockwise).unwrap();

        for t in indices.chunks(3) {
            let (a, b, c) = (
                clockwise[t[0] as usize],
                clockwise[t[1] as usize],
                clockwise[t[2] as usize],
            );
            assert!((b - a).perp_dot(c - a) > 0.0);
        }
    }

    #[test]
    fn test_area_fill_mesh_is_relative_to_first_vertex() {
        let vertices = [
            Coordinate::new(55.70, 37.50),
            Coordinate::new(55.70, 37.70),
            Coordinate::new(55.80, 37.60),
        ];
        let (origin, mesh) = area_fill_mesh(&vertices).unwrap();

        assert_eq!(origin, vertices[0].to_world());
        assert_eq!(mesh.count_vertices(), 3);
        assert_eq!(mesh.indices().map(|i| i.len()), Some(3));
        assert!(area_fill_mesh(&vertices[..2]).is_none());
    }

    fn fill_app() -> App {
        let mut app = App::new();
        app.init_resource::<Assets<Mesh>>()
            .init_resource::<Assets<ColorMaterial>>()
            .init_resource::<AnnotationState>()
            .add_systems(Startup, spawn_fills)
            .add_systems(Update, sync_fills);
        app.update();
        app
    }

    fn visibility_of<T: Component>(app: &mut App) -> Visibility {
        let world = app.world_mut();
        let mut query = world.query_filtered::<&Visibility, With<T>>();
        *query.single(world).unwrap()
    }

    #[test]
    fn test_fills_follow_annotation_state() {
        let mut app = fill_app();
        assert_eq!(visibility_of::<AreaFill>(&mut app), Visibility::Hidden);
        assert_eq!(visibility_of::<MarkerFill>(&mut app), Visibility::Hidden);

        {
            let mut state = app.world_mut().resource_mut::<AnnotationState>();
            state.place_marker(Coordinate::new(55.75, 37.61));
            state.append_outline_vertex(Coordinate::new(55.70, 37.50));
            state.append_outline_vertex(Coordinate::new(55.70, 37.70));
            state.append_outline_vertex(Coordinate::new(55.80, 37.60));
        }
        app.update();
        assert_eq!(visibility_of::<AreaFill>(&mut app), Visibility::Inherited);
        assert_eq!(visibility_of::<MarkerFill>(&mut app), Visibility::Inherited);

        let world = app.world_mut();
        let mut query = world.query_filtered::<&Transform, With<MarkerFill>>();
        let scale = query.single(world).unwrap().scale.x;
        assert_eq!(scale, meters_to_world(MARKER_RADIUS_METERS, 55.75));

        app.world_mut().resource_mut::<AnnotationState>().reset();
        app.update();
        assert_eq!(visibility_of::<AreaFill>(&mut app), Visibility::Hidden);
        assert_eq!(visibility_of::<MarkerFill>(&mut app), Visibility::Hidden);
    }

    #[test]
    fn test_fill_color_follows_night_mode() {
        let mut app = fill_app();
        app.world_mut()
            .resource_mut::<AnnotationState>()
            .toggle_night_mode();
        app.update();

        let world = app.world_mut();
        let mut query = world.query_filtered::<&MeshMaterial2d<ColorMaterial>, With<AreaFill>>();
        let handle = query.single(world).unwrap().0.clone();
        let color = world
            .resource::<Assets<ColorMaterial>>()
            .get(&handle)
            .map(|m| m.color);
        assert_eq!(color, Some(theme::NIGHT.area_fill));
    }
}
