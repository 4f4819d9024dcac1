use glam::Vec3;
use crate::graphics_device::mock_graphics_device::MockGraphicsDevice;
use crate::graphics_device::PipelineKind;
use crate::scene::test_scenes::*;
use crate::scene::SceneKind;
use super::*;

// ============================================================================
// MeshRecord::load
// ============================================================================

#[test]
fn test_simple_mesh_uses_basic_pipeline_and_material_zero() {
    let device = MockGraphicsDevice::new();
    let mut desc = basic_cube("cube");
    desc.material = 3;
    desc.shading_id = 2;

    let record = MeshRecord::load(&device, &desc, SceneKind::Simple).unwrap();

    assert_eq!(record.pipeline, PipelineKind::Basic);
    assert_eq!(record.material, 0);
    assert_eq!(record.vertex_count, CUBE_VERTEX_COUNT);
    assert_eq!(record.layout.attributes.len(), 3);
}

#[test]
fn test_multi_material_mesh_resolves_shading_id() {
    let device = MockGraphicsDevice::new();
    let record = MeshRecord::load(&device, &extended_cube("ball", 1, 2), SceneKind::MultiMaterial).unwrap();

    assert_eq!(record.pipeline, PipelineKind::Reflective);
    assert_eq!(record.material, 1);
    assert_eq!(record.layout.attributes.len(), 5);
}

#[test]
fn test_mesh_vertices_uploaded() {
    let device = MockGraphicsDevice::new();
    let desc = basic_cube("cube");
    MeshRecord::load(&device, &desc, SceneKind::Simple).unwrap();

    let buffer = device.buffer_named("cube_vertices").unwrap();
    assert_eq!(buffer.contents(), desc.vertex_data);
}

#[test]
fn test_mesh_bounds_with_bias() {
    let device = MockGraphicsDevice::new();
    let mut desc = basic_cube("cube");
    desc.aabb_bias = 0.1;

    let record = MeshRecord::load(&device, &desc, SceneKind::Simple).unwrap();

    assert!((record.aabb.max - Vec3::splat(0.4)).length() < 1e-6);
    assert!((record.aabb.min + Vec3::splat(0.4)).length() < 1e-6);
}

#[test]
fn test_invalid_mesh_allocates_nothing() {
    let device = MockGraphicsDevice::new();
    let mut desc = basic_cube("cube");
    desc.layout.normal.format = "R64_SFLOAT".to_string();

    assert!(MeshRecord::load(&device, &desc, SceneKind::Simple).is_err());
    assert!(device.buffers.lock().unwrap().is_empty());
}

#[test]
fn test_unknown_shading_id_is_rejected() {
    let device = MockGraphicsDevice::new();
    let result = MeshRecord::load(&device, &extended_cube("x", 0, 7), SceneKind::MultiMaterial);
    assert!(result.is_err());
}
