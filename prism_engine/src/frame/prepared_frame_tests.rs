use glam::{Mat4, Vec3};
use crate::frame::InstanceUniform;
use crate::graphics_device::mock_graphics_device::MockBuffer;
use crate::resource_layout::{ResourceLayoutIndexer, SceneMode};
use crate::scene::SceneInstance;
use super::*;

fn at(mesh: usize, x: f32) -> SceneInstance {
    SceneInstance::new(mesh, Mat4::from_translation(Vec3::new(x, 0.0, 0.0)))
}

// ============================================================================
// Grouping and ordinals
// ============================================================================

#[test]
fn test_instances_grouped_stably_by_mesh() {
    let instances = [at(1, 0.0), at(0, 1.0), at(1, 2.0), at(2, 3.0), at(0, 4.0), at(1, 5.0)];
    let frame = PreparedFrame::build(&instances, 3, 16, Mat4::IDENTITY, Mat4::IDENTITY).unwrap();

    assert_eq!(
        frame.batches,
        vec![
            MeshBatch { mesh: 0, first_ordinal: 0, count: 2 },
            MeshBatch { mesh: 1, first_ordinal: 2, count: 3 },
            MeshBatch { mesh: 2, first_ordinal: 5, count: 1 },
        ]
    );
    let xs: Vec<f32> = frame.models.iter().map(|m| m.w_axis.x).collect();
    assert_eq!(xs, vec![1.0, 4.0, 0.0, 2.0, 5.0, 3.0]);
}

#[test]
fn test_meshes_without_instances_are_skipped() {
    let frame = PreparedFrame::build(&[at(2, 0.0)], 3, 16, Mat4::IDENTITY, Mat4::IDENTITY).unwrap();
    assert_eq!(frame.batches, vec![MeshBatch { mesh: 2, first_ordinal: 0, count: 1 }]);
}

#[test]
fn test_unknown_mesh_is_invalid_resource() {
    let result = PreparedFrame::build(&[at(3, 0.0)], 3, 16, Mat4::IDENTITY, Mat4::IDENTITY);
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
fn test_capacity_exceeded_is_invalid_resource() {
    let instances = vec![at(0, 0.0); 3];
    let result = PreparedFrame::build(&instances, 1, 2, Mat4::IDENTITY, Mat4::IDENTITY);
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
fn test_cull_transforms_are_view_times_model() {
    let view = Mat4::from_translation(Vec3::new(0.0, 0.0, -10.0));
    let frame = PreparedFrame::build(&[at(0, 2.0)], 1, 4, view, Mat4::IDENTITY).unwrap();

    let t = frame.cull_transforms()[0];
    assert_eq!(t.w_axis.truncate(), Vec3::new(2.0, 0.0, -10.0));
}

// ============================================================================
// Uniform upload
// ============================================================================

#[test]
fn test_write_uniforms_places_records_at_stride() {
    let indexer = ResourceLayoutIndexer::new(SceneMode::Simple, 2, InstanceUniform::SIZE, 512).unwrap();
    let buffer = MockBuffer::new(4 * 512, "ubo".to_string());
    let proj = Mat4::perspective_rh(1.0, 1.0, 0.1, 10.0);
    let frame = PreparedFrame::build(&[at(0, 1.0), at(0, 2.0)], 1, 4, Mat4::IDENTITY, proj).unwrap();

    frame.write_uniforms(&buffer, &indexer).unwrap();

    let bytes = buffer.contents();
    let second: InstanceUniform = bytemuck::pod_read_unaligned(&bytes[512..768]);
    assert_eq!(second.model.w_axis.x, 2.0);
    assert_eq!(second.proj, proj);
    // Padding between records stays zeroed
    assert!(bytes[256..512].iter().all(|b| *b == 0));
    assert_eq!(*buffer.writes.lock().unwrap(), vec![(0, 1024)]);
}

#[test]
fn test_write_uniforms_skips_empty_frame() {
    let indexer = ResourceLayoutIndexer::new(SceneMode::Simple, 2, InstanceUniform::SIZE, 256).unwrap();
    let buffer = MockBuffer::new(256, "ubo".to_string());
    let frame = PreparedFrame::build(&[], 1, 4, Mat4::IDENTITY, Mat4::IDENTITY).unwrap();

    frame.write_uniforms(&buffer, &indexer).unwrap();
    assert!(buffer.writes.lock().unwrap().is_empty());
}
