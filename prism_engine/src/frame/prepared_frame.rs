/// Per-frame instance data: grouping by mesh, global ordinals, uniform records

use glam::Mat4;
use crate::error::{Error, Result};
use crate::frame::{InstanceUniform, PushConstants};
use crate::graphics_device::Buffer;
use crate::resource_layout::ResourceLayoutIndexer;
use crate::scene::SceneInstance;

/// Instances of one mesh, occupying a contiguous ordinal range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshBatch {
    pub mesh: usize,
    pub first_ordinal: u32,
    pub count: u32,
}

impl MeshBatch {
    pub fn ordinals(&self) -> std::ops::Range<u32> {
        self.first_ordinal..self.first_ordinal + self.count
    }
}

/// One frame's instances, regrouped for recording
///
/// Instances are grouped stably by mesh in mesh load order. The global
/// ordinal of an instance is its position in that order; it indexes the
/// uniform records, culling transforms and visibility of the frame.
#[derive(Debug, Clone)]
pub struct PreparedFrame {
    pub batches: Vec<MeshBatch>,
    /// Model matrix per ordinal
    pub models: Vec<Mat4>,
    pub push_constants: PushConstants,
}

impl PreparedFrame {
    /// Group `instances` by mesh
    ///
    /// # Errors
    ///
    /// `Error::InvalidResource` when an instance names a mesh that is not
    /// loaded, or when there are more instances than `capacity`.
    pub fn build(
        instances: &[SceneInstance],
        mesh_count: usize,
        capacity: u32,
        view: Mat4,
        proj: Mat4,
    ) -> Result<Self> {
        if instances.len() > capacity as usize {
            return Err(Error::InvalidResource(format!(
                "{} instances exceed the scene capacity of {}",
                instances.len(), capacity
            )));
        }

        let mut per_mesh: Vec<Vec<Mat4>> = vec![Vec::new(); mesh_count];
        for (i, instance) in instances.iter().enumerate() {
            let bucket = per_mesh.get_mut(instance.mesh_index).ok_or_else(|| {
                Error::InvalidResource(format!(
                    "instance {} references mesh {} of {}",
                    i, instance.mesh_index, mesh_count
                ))
            })?;
            bucket.push(instance.transform);
        }

        let mut batches = Vec::new();
        let mut models = Vec::with_capacity(instances.len());
        for (mesh, transforms) in per_mesh.into_iter().enumerate() {
            if transforms.is_empty() {
                continue;
            }
            batches.push(MeshBatch {
                mesh,
                first_ordinal: models.len() as u32,
                count: transforms.len() as u32,
            });
            models.extend(transforms);
        }

        Ok(Self {
            batches,
            models,
            push_constants: PushConstants { view, proj },
        })
    }

    pub fn instance_count(&self) -> u32 {
        self.models.len() as u32
    }

    /// view * model per ordinal, the transforms the culling test consumes
    pub fn cull_transforms(&self) -> Vec<Mat4> {
        let view = self.push_constants.view;
        self.models.iter().map(|model| view * *model).collect()
    }

    /// Pack every record at its dynamic offset and upload in one write
    pub fn write_uniforms(&self, buffer: &dyn Buffer, indexer: &ResourceLayoutIndexer) -> Result<()> {
        if self.models.is_empty() {
            return Ok(());
        }
        let stride = indexer.record_stride() as usize;
        let mut bytes = vec![0u8; stride * self.models.len()];
        let PushConstants { view, proj } = self.push_constants;

        for (chunk, model) in bytes.chunks_exact_mut(stride).zip(&self.models) {
            let record = InstanceUniform::new(*model, view, proj);
            chunk[..InstanceUniform::SIZE as usize].copy_from_slice(bytemuck::bytes_of(&record));
        }

        buffer.update(0, &bytes)
    }
}

#[cfg(test)]
#[path = "prepared_frame_tests.rs"]
mod tests;
