/// Graphics device module - backend contracts consumed by the renderer core

pub mod graphics_device;
pub mod buffer;
pub mod texture;
pub mod sync;
pub mod pipeline;
pub mod binding_group;
pub mod command_list;
pub mod swapchain;

pub use graphics_device::*;
pub use buffer::*;
pub use texture::*;
pub use sync::*;
pub use pipeline::*;
pub use binding_group::*;
pub use command_list::*;
pub use swapchain::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
