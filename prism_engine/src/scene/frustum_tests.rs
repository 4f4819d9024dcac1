use glam::{Mat4, Vec3};
use crate::scene::Aabb;
use super::*;

fn unit_cube() -> Aabb {
    Aabb::new(Vec3::splat(-0.5), Vec3::splat(0.5))
}

fn point() -> Aabb {
    Aabb::new(Vec3::ZERO, Vec3::ZERO)
}

fn frustum() -> CullingFrustum {
    CullingFrustum::new(0.1, 0.1, 0.1, 100.0).unwrap()
}

// ============================================================================
// CullingFrustum::new / from_perspective
// ============================================================================

#[test]
fn test_frustum_rejects_invalid_parameters() {
    assert!(CullingFrustum::new(0.0, 0.1, 0.1, 10.0).is_err());
    assert!(CullingFrustum::new(0.1, 0.1, -0.1, 10.0).is_err());
    assert!(CullingFrustum::new(0.1, 0.1, 1.0, 1.0).is_err());
    assert!(CullingFrustum::new(0.1, 0.1, 1.0, f32::INFINITY).is_err());
}

#[test]
fn test_frustum_from_perspective_ninety_degrees() {
    let f = CullingFrustum::from_perspective(std::f32::consts::FRAC_PI_2, 2.0, 1.0, 10.0).unwrap();
    assert!((f.half_height - 1.0).abs() < 1e-5);
    assert!((f.half_width - 2.0).abs() < 1e-5);
}

#[test]
fn test_frustum_planes_point_outward() {
    let f = frustum();
    let planes = f.planes();
    let inside = Vec3::new(0.0, 0.0, -1.0);
    for plane in planes {
        assert!(plane.truncate().dot(inside) + plane.w <= 0.0);
    }
    // A point far to the right is outside only the right plane
    let right = Vec3::new(50.0, 0.0, -1.0);
    let p = planes[PLANE_RIGHT];
    assert!(p.truncate().dot(right) + p.w > 0.0);
    let l = planes[PLANE_LEFT];
    assert!(l.truncate().dot(right) + l.w <= 0.0);
}

// ============================================================================
// Points (zero-extent boxes)
// ============================================================================

#[test]
fn test_point_at_origin_is_visible() {
    assert!(frustum().is_visible(&Mat4::IDENTITY, &point()));
}

#[test]
fn test_point_beyond_far_is_culled() {
    let view_model = Mat4::from_translation(Vec3::new(0.0, 0.0, -1000.0));
    assert!(!frustum().is_visible(&view_model, &point()));
}

#[test]
fn test_point_behind_eye_is_culled() {
    let view_model = Mat4::from_translation(Vec3::new(0.0, 0.0, 5.0));
    assert!(!frustum().is_visible(&view_model, &point()));
}

#[test]
fn test_zero_scale_transform_behaves_as_point() {
    let view_model = Mat4::from_translation(Vec3::new(0.0, 0.0, -10.0)) * Mat4::from_scale(Vec3::ZERO);
    assert!(frustum().is_visible(&view_model, &unit_cube()));

    let outside = Mat4::from_translation(Vec3::new(0.0, 0.0, -500.0)) * Mat4::from_scale(Vec3::ZERO);
    assert!(!frustum().is_visible(&outside, &unit_cube()));
}

// ============================================================================
// Boxes
// ============================================================================

#[test]
fn test_box_inside_is_visible() {
    let view_model = Mat4::from_translation(Vec3::new(0.0, 0.0, -20.0));
    assert!(frustum().is_visible(&view_model, &unit_cube()));
}

#[test]
fn test_box_left_of_frustum_is_culled() {
    // At z = -10 the frustum spans x in [-10, 10]
    let view_model = Mat4::from_translation(Vec3::new(-20.0, 0.0, -10.0));
    assert!(!frustum().is_visible(&view_model, &unit_cube()));
}

#[test]
fn test_box_straddling_far_plane_is_visible() {
    let view_model = Mat4::from_translation(Vec3::new(0.0, 0.0, -100.2));
    assert!(frustum().is_visible(&view_model, &unit_cube()));
}

#[test]
fn test_box_containing_frustum_is_visible() {
    let huge = Aabb::new(Vec3::splat(-1000.0), Vec3::splat(1000.0));
    assert!(frustum().is_visible(&Mat4::IDENTITY, &huge));
}

#[test]
fn test_rotated_slab_culled_by_box_axis() {
    // Frustum r = t = n = 1, f = 10: far corners at (+-10, +-10, -10).
    // The slab spans (8, 0, -4) to (16, 0, -20) and straddles both the
    // right and far planes, so only its own face normal separates it.
    let f = CullingFrustum::new(1.0, 1.0, 1.0, 10.0).unwrap();
    let angle = -(0.5f32).atan2(1.0);
    let view_model = Mat4::from_translation(Vec3::new(12.0, 0.0, -12.0)) * Mat4::from_rotation_y(angle);
    let slab = Aabb::new(Vec3::new(-0.1, -1.0, -8.944), Vec3::new(0.1, 1.0, 8.944));

    assert!(!f.is_visible(&view_model, &slab));

    // The same slab pushed onto the frustum boundary is visible
    let touching = Mat4::from_translation(Vec3::new(10.0, 0.0, -10.0)) * Mat4::from_rotation_y(angle);
    assert!(f.is_visible(&touching, &slab));
}

#[test]
fn test_scenario_frustum_one_visible_one_far() {
    let f = CullingFrustum::new(0.5, 0.5, 0.1, 50.0).unwrap();
    let near = Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0));
    let far = Mat4::from_translation(Vec3::new(0.0, 0.0, -500.0));

    assert!(f.is_visible(&near, &unit_cube()));
    assert!(!f.is_visible(&far, &unit_cube()));
}
