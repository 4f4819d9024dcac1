/// Mesh Record: immutable per-mesh GPU data built at scene load

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{
    Buffer, BufferDesc, BufferUsage, GraphicsDevice, PipelineKind, VertexLayout,
};
use crate::scene::{Aabb, MeshDesc, SceneKind};

/// Static per-mesh data consulted by the frame recorder
pub struct MeshRecord {
    pub name: String,
    pub vertex_buffer: Arc<dyn Buffer>,
    pub vertex_count: u32,
    pub layout: VertexLayout,
    /// Object-space bounds (bias already applied)
    pub aabb: Aabb,
    /// Material index; always 0 in simple scenes
    pub material: u32,
    pub pipeline: PipelineKind,
}

impl MeshRecord {
    /// Validate a mesh description and upload its vertices
    ///
    /// Validation runs before any GPU allocation.
    pub fn load(device: &dyn GraphicsDevice, desc: &MeshDesc, kind: SceneKind) -> Result<Self> {
        let layout = desc.layout.resolve(kind.vertex_layout_kind())?;
        let aabb = Aabb::from_vertices(
            &desc.vertex_data,
            desc.layout.stride,
            desc.layout.position.offset,
            desc.vertex_count,
        )?
        .shrunk(desc.aabb_bias.max(0.0));

        let (material, pipeline) = match kind {
            SceneKind::Simple => (0, PipelineKind::Basic),
            SceneKind::MultiMaterial => (desc.material, PipelineKind::from_shading_id(desc.shading_id)?),
        };

        let byte_len = desc.vertex_count as u64 * desc.layout.stride as u64;
        let vertex_buffer = device.create_buffer(BufferDesc {
            size: byte_len,
            usage: BufferUsage::Vertex,
            name: format!("{}_vertices", desc.name),
        })?;
        vertex_buffer.update(0, &desc.vertex_data[..byte_len as usize])?;

        Ok(Self {
            name: desc.name.clone(),
            vertex_buffer,
            vertex_count: desc.vertex_count,
            layout,
            aabb,
            material,
            pipeline,
        })
    }
}

#[cfg(test)]
#[path = "mesh_record_tests.rs"]
mod tests;
