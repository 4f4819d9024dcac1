/// GraphicsDevice trait - factory and queue interface consumed by the renderer core

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{
    BindingEntry, BindingGroup, Buffer, BufferDesc, CommandList, Fence, Pipeline,
    PipelineKind, Semaphore, Texture, TextureDesc,
};

/// Device limits the core needs for uniform layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceLimits {
    /// Dynamic uniform offsets must be multiples of this
    pub min_uniform_buffer_offset_alignment: u64,
    /// Largest range a single uniform binding may cover
    pub max_uniform_buffer_range: u64,
}

impl Default for DeviceLimits {
    fn default() -> Self {
        Self {
            min_uniform_buffer_offset_alignment: 256,
            max_uniform_buffer_range: 65536,
        }
    }
}

/// Graphics device trait
///
/// Implemented by backend-specific devices (e.g., `VulkanGraphicsDevice`).
/// Bootstrap, surface creation and pipeline compilation happen in the backend
/// before the renderer core ever sees the device.
pub trait GraphicsDevice: Send + Sync {
    /// Create a host-visible, persistently mapped buffer
    fn create_buffer(&self, desc: BufferDesc) -> Result<Arc<dyn Buffer>>;

    /// Create and upload a sampled texture
    fn create_texture(&self, desc: TextureDesc) -> Result<Arc<dyn Texture>>;

    /// Create a resettable command list
    fn create_command_list(&self) -> Result<Box<dyn CommandList>>;

    /// Create a fence, optionally already signaled
    fn create_fence(&self, signaled: bool) -> Result<Arc<dyn Fence>>;

    fn create_semaphore(&self) -> Result<Arc<dyn Semaphore>>;

    /// Allocate and write a binding group in the shared layout
    fn create_binding_group(&self, entries: &[BindingEntry]) -> Result<Arc<dyn BindingGroup>>;

    /// Pre-built pipeline of the given kind
    fn pipeline(&self, kind: PipelineKind) -> Result<Arc<dyn Pipeline>>;

    /// Submit a recorded command list
    ///
    /// Execution waits on `wait` at the color-output stage, then signals
    /// `signal` and `fence`.
    fn submit(
        &self,
        cmd: &dyn CommandList,
        wait: &dyn Semaphore,
        signal: &dyn Semaphore,
        fence: &dyn Fence,
    ) -> Result<()>;

    /// Block until the device is idle
    fn wait_idle(&self) -> Result<()>;

    fn limits(&self) -> DeviceLimits;
}
