/*!
# Prism Engine - Vulkan Backend

Vulkan implementation of the `prism_engine` graphics device contracts, built on
`ash` for the API bindings and `gpu-allocator` for memory management.

```no_run
use std::sync::Arc;
use prism_engine::prism::RendererConfig;
use prism_engine_renderer_vulkan::prism::{create_frame_renderer, ShaderSet};
# fn run(window: Arc<winit::window::Window>) -> prism_engine::prism::Result<()> {
let shaders = ShaderSet::load_dir("shaders")?;
let mut renderer = create_frame_renderer(window, &shaders, RendererConfig::default())?;
renderer.shutdown()?;
# Ok(()) }
```
*/

mod debug;
mod vulkan;
mod vulkan_binding_group;
mod vulkan_buffer;
mod vulkan_command_list;
mod vulkan_config;
mod vulkan_context;
mod vulkan_pipeline;
mod vulkan_sampler;
mod vulkan_shader_set;
mod vulkan_swapchain;
mod vulkan_sync;
mod vulkan_texture;
mod window_surface;

use std::sync::Arc;
use prism_engine::prism::{FrameRenderer, RendererConfig, Result};
use winit::window::Window;

/// Device, swapchain, pipelines and surface for `window`, wired into a renderer
pub fn create_frame_renderer(
    window: Arc<Window>,
    shaders: &prism::ShaderSet,
    config: RendererConfig,
) -> Result<FrameRenderer> {
    let device = vulkan::VulkanGraphicsDevice::new(window.as_ref(), vulkan_config::VulkanConfig::from(&config))?;
    let swapchain = device.create_swapchain(window.as_ref())?;
    device.create_pipelines(&swapchain, shaders)?;
    let surface = window_surface::WindowSurface::new(window);

    FrameRenderer::new(Arc::new(device), Box::new(swapchain), Box::new(surface), config)
}

pub mod prism {
    pub use crate::create_frame_renderer;
    pub use crate::vulkan::VulkanGraphicsDevice;
    pub use crate::vulkan_swapchain::Swapchain as VulkanSwapchain;
    pub use crate::vulkan_shader_set::{parse_spirv, ShaderProgram, ShaderSet};
    pub use crate::vulkan_config::{DebugOutput, DebugSeverity, ValidationStats, VulkanConfig};
    pub use crate::window_surface::WindowSurface;
    pub use crate::debug::{get_validation_stats, print_validation_stats_report};
}
