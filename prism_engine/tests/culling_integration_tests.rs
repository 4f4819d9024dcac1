//! Integration tests for bounding boxes and frustum culling
//!
//! No GPU required.
//!
//! Run with: cargo test --test culling_integration_tests

use prism_engine::glam::{Mat4, Quat, Vec3};
use prism_engine::prism::scene::{Aabb, CullingFrustum};
use prism_engine::prism::Error;

fn interleaved(positions: &[[f32; 3]], stride: usize) -> Vec<u8> {
    let mut data = vec![0u8; positions.len() * stride];
    for (i, p) in positions.iter().enumerate() {
        let bytes: &[u8] = bytemuck::cast_slice(p);
        data[i * stride..i * stride + 12].copy_from_slice(bytes);
    }
    data
}

fn unit_box() -> Aabb {
    Aabb::new(Vec3::splat(-0.5), Vec3::splat(0.5))
}

// ============================================================================
// AABB FROM VERTEX DATA
// ============================================================================

#[test]
fn test_integration_aabb_from_interleaved_vertices() {
    let data = interleaved(&[[1.0, -2.0, 3.0], [-4.0, 5.0, 0.5], [0.0, 0.0, -6.0]], 40);
    let aabb = Aabb::from_vertices(&data, 40, 0, 3).unwrap();

    assert_eq!(aabb.min, Vec3::new(-4.0, -2.0, -6.0));
    assert_eq!(aabb.max, Vec3::new(1.0, 5.0, 3.0));
}

#[test]
fn test_integration_aabb_rejects_truncated_data() {
    let data = interleaved(&[[0.0, 0.0, 0.0]], 40);
    let result = Aabb::from_vertices(&data, 40, 0, 2);
    assert!(matches!(result, Err(Error::ValidationFailed(_))));
}

// ============================================================================
// FRUSTUM VISIBILITY
// ============================================================================

#[test]
fn test_integration_box_in_front_of_camera_is_visible() {
    let frustum = CullingFrustum::from_perspective(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100.0).unwrap();
    let view_model = Mat4::from_translation(Vec3::new(0.0, 0.0, -10.0));

    assert!(frustum.is_visible(&view_model, &unit_box()));
}

#[test]
fn test_integration_box_behind_camera_is_culled() {
    let frustum = CullingFrustum::from_perspective(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100.0).unwrap();
    let view_model = Mat4::from_translation(Vec3::new(0.0, 0.0, 10.0));

    assert!(!frustum.is_visible(&view_model, &unit_box()));
}

#[test]
fn test_integration_box_beyond_far_plane_is_culled() {
    let frustum = CullingFrustum::new(1.0, 1.0, 0.1, 50.0).unwrap();
    let view_model = Mat4::from_translation(Vec3::new(0.0, 0.0, -60.0));

    assert!(!frustum.is_visible(&view_model, &unit_box()));
}

#[test]
fn test_integration_box_straddling_side_plane_is_visible() {
    let frustum = CullingFrustum::new(1.0, 1.0, 1.0, 50.0).unwrap();
    // Right plane at z=-10 sits at x=10; the box spans x 9.5..10.5
    let view_model = Mat4::from_translation(Vec3::new(10.0, 0.0, -10.0));

    assert!(frustum.is_visible(&view_model, &unit_box()));
}

#[test]
fn test_integration_rotation_is_part_of_the_test() {
    let frustum = CullingFrustum::new(1.0, 1.0, 1.0, 50.0).unwrap();
    let slab = Aabb::new(Vec3::new(-20.0, -0.1, -0.1), Vec3::new(0.0, 0.1, 0.1));
    let translation = Mat4::from_translation(Vec3::new(-25.0, 0.0, -10.0));

    // Unrotated the slab ends at x=-25, left of the frustum at x=-10
    assert!(!frustum.is_visible(&translation, &slab));

    // Rotated half a turn about Y it reaches back across the view axis
    let rotated = translation * Mat4::from_quat(Quat::from_rotation_y(std::f32::consts::PI));
    assert!(frustum.is_visible(&rotated, &slab));
}

#[test]
fn test_integration_shrunk_box_can_become_invisible() {
    let frustum = CullingFrustum::new(1.0, 1.0, 1.0, 50.0).unwrap();
    let aabb = Aabb::new(Vec3::new(-1.0, -0.5, -0.5), Vec3::new(1.0, 0.5, 0.5));
    // Box spans x 11..13 and z -12..-11; the right plane is x = -z
    let view_model = Mat4::from_translation(Vec3::new(12.0, 0.0, -11.5));

    assert!(frustum.is_visible(&view_model, &aabb));
    assert!(!frustum.is_visible(&view_model, &aabb.shrunk(0.8)));
}

#[test]
fn test_integration_invalid_frustum_is_rejected() {
    assert!(matches!(CullingFrustum::new(1.0, 1.0, 5.0, 2.0), Err(Error::ValidationFailed(_))));
    assert!(matches!(CullingFrustum::new(0.0, 1.0, 0.1, 2.0), Err(Error::ValidationFailed(_))));
}
