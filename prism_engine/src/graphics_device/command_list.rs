/// CommandList trait - records GPU commands for one frame slot

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{BindingGroup, Buffer, Pipeline, VertexLayout};

/// Viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Full-surface viewport with a [0, 1] depth range
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// Scissor rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect2D {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Clear value for an attachment
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearValue {
    Color([f32; 4]),
    DepthStencil { depth: f32, stencil: u32 },
}

/// Command list trait
///
/// Each frame slot owns one. It is reset and re-recorded every time the slot
/// comes around, after the slot's fence guarantees the GPU is done with it.
pub trait CommandList: Send + Sync {
    /// Reset and start recording
    fn begin(&mut self) -> Result<()>;

    /// Finish recording
    fn end(&mut self) -> Result<()>;

    /// End the render pass started by `Swapchain::begin_render_pass`
    fn end_render_pass(&mut self) -> Result<()>;

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()>;

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()>;

    fn bind_pipeline(&mut self, pipeline: &Arc<dyn Pipeline>) -> Result<()>;

    /// Set the vertex input layout (dynamic vertex input state)
    fn set_vertex_input(&mut self, layout: &VertexLayout) -> Result<()>;

    fn bind_vertex_buffer(&mut self, buffer: &Arc<dyn Buffer>, offset: u64) -> Result<()>;

    /// Bind a binding group with one dynamic offset per dynamic uniform slot
    ///
    /// # Arguments
    ///
    /// * `pipeline` - Pipeline whose layout the group is compatible with
    /// * `set_index` - Descriptor set index in the pipeline layout
    /// * `group` - Binding group to bind
    /// * `dynamic_offsets` - Byte offsets into the dynamic uniform buffers
    fn bind_binding_group(
        &mut self,
        pipeline: &Arc<dyn Pipeline>,
        set_index: u32,
        group: &Arc<dyn BindingGroup>,
        dynamic_offsets: &[u32],
    ) -> Result<()>;

    /// Push constants to the currently bound pipeline (vertex stage)
    fn push_constants(&mut self, offset: u32, data: &[u8]) -> Result<()>;

    /// Non-indexed draw of one instance
    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()>;
}
