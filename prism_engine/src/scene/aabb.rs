/// Object-space axis-aligned bounding box built from raw vertex data

use glam::Vec3;
use crate::error::{Error, Result};

/// Size of a `R32G32B32_SFLOAT` position
const POSITION_SIZE: usize = 12;

/// Axis-Aligned Bounding Box in object space
///
/// Computed once per mesh at load time and transformed per instance at
/// culling time. A zero-extent box (single point) is valid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner (x, y, z)
    pub min: Vec3,
    /// Maximum corner (x, y, z)
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Scan `vertex_count` interleaved vertices and bound their positions
    ///
    /// # Arguments
    ///
    /// * `vertex_data` - Interleaved vertex bytes
    /// * `stride` - Bytes between consecutive vertices
    /// * `position_offset` - Byte offset of the `R32G32B32_SFLOAT` position
    /// * `vertex_count` - Number of vertices to scan
    ///
    /// # Errors
    ///
    /// `Error::ValidationFailed` for an empty mesh, a position that does not
    /// fit in the stride, or vertex data shorter than `vertex_count * stride`.
    pub fn from_vertices(
        vertex_data: &[u8],
        stride: u32,
        position_offset: u32,
        vertex_count: u32,
    ) -> Result<Self> {
        let stride = stride as usize;
        let position_offset = position_offset as usize;

        if vertex_count == 0 {
            return Err(Error::ValidationFailed("mesh has no vertices".to_string()));
        }
        if position_offset + POSITION_SIZE > stride {
            return Err(Error::ValidationFailed(format!(
                "position at offset {} does not fit in stride {}",
                position_offset, stride
            )));
        }
        let required = vertex_count as usize * stride;
        if vertex_data.len() < required {
            return Err(Error::ValidationFailed(format!(
                "vertex data is {} bytes, {} vertices of stride {} need {}",
                vertex_data.len(), vertex_count, stride, required
            )));
        }

        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        for vertex in vertex_data[..required].chunks_exact(stride) {
            let bytes = &vertex[position_offset..position_offset + POSITION_SIZE];
            let position = Vec3::from_array(bytemuck::pod_read_unaligned::<[f32; 3]>(bytes));
            min = min.min(position);
            max = max.max(position);
        }

        Ok(Self { min, max })
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Pull every face inward by `bias`
    ///
    /// Absorbs quantization noise in source positions. An axis thinner than
    /// `2 * bias` collapses to its center instead of inverting.
    pub fn shrunk(&self, bias: f32) -> Self {
        let center = self.center();
        let half = (self.half_extents() - Vec3::splat(bias)).max(Vec3::ZERO);
        Self { min: center - half, max: center + half }
    }

    /// The 8 corners, bit i of the index selecting max on axis i
    pub fn corners(&self) -> [Vec3; 8] {
        let mut corners = [Vec3::ZERO; 8];
        for (i, corner) in corners.iter_mut().enumerate() {
            *corner = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
        }
        corners
    }
}

#[cfg(test)]
#[path = "aabb_tests.rs"]
mod tests;
