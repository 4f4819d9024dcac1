//! Render module
//!
//! Renderer configuration, the loaded scene and the `FrameRenderer` facade.

mod config;
mod loaded_scene;
mod frame_renderer;

pub use config::{RendererConfig, DEFAULT_TIMEOUT_NS};
pub use loaded_scene::LoadedScene;
pub use frame_renderer::FrameRenderer;
