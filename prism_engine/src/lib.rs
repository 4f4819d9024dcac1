/*!
# Prism Engine

Per-frame rendering core of the Prism renderer.

This crate is backend-agnostic: it drives GPU work through the traits of the
`graphics_device` module, implemented by backends such as
`prism_engine_renderer_vulkan`.

## Architecture

- **FrameScheduler**: acquire / record / submit / present state machine over N frame slots
- **FrameRecorder**: walks the scene's meshes and emits bind/draw commands
- **ResourceLayoutIndexer**: dynamic uniform offsets, binding groups, pipelines
- **CullingFrustum**: separating-axis visibility test of transformed bounding boxes
- **Aabb**: object-space bounds built from raw vertex data
- **FrameRenderer**: the public facade (`load_scene`, `render_frame`, `on_resize`, `shutdown`)
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod graphics_device;
pub mod scene;
pub mod resource_layout;
pub mod frame;
pub mod render;

// Main prism namespace module
pub mod prism {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton (logging hub)
    pub use crate::engine::Engine;

    // Renderer facade
    pub use crate::render::{FrameRenderer, RendererConfig};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{format_plain, DefaultLogger, LogEntry, LogSeverity, Logger};
    }

    // Device contracts implemented by backends
    pub mod graphics_device {
        pub use crate::graphics_device::*;
    }

    // Scene description and culling
    pub mod scene {
        pub use crate::scene::*;
    }

    // Frame scheduling and recording
    pub mod frame {
        pub use crate::frame::*;
    }

    // Binding layout
    pub mod resource_layout {
        pub use crate::resource_layout::*;
    }
}

// Re-export math library at crate root
pub use glam;
