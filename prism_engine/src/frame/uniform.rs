/// GPU-visible per-instance and per-frame data

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// One per-instance uniform record (binding 0, dynamic offset)
///
/// 256 bytes: a multiple of every legal `minUniformBufferOffsetAlignment`
/// (Vulkan caps it at 256).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct InstanceUniform {
    pub model: Mat4,
    pub view: Mat4,
    pub proj: Mat4,
    /// transpose(inverse(model)), for transforming normals
    pub normal: Mat4,
}

impl InstanceUniform {
    pub const SIZE: u64 = std::mem::size_of::<InstanceUniform>() as u64;

    pub fn new(model: Mat4, view: Mat4, proj: Mat4) -> Self {
        Self {
            model,
            view,
            proj,
            normal: model.inverse().transpose(),
        }
    }
}

/// Vertex-stage push constants, pushed after every pipeline bind
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PushConstants {
    pub view: Mat4,
    pub proj: Mat4,
}

impl PushConstants {
    pub const SIZE: u32 = std::mem::size_of::<PushConstants>() as u32;
}

#[cfg(test)]
#[path = "uniform_tests.rs"]
mod tests;
