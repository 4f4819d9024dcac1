/// WindowSurface - winit implementation of graphics_device::PresentationSurface

use prism_engine::prism::graphics_device::PresentationSurface;
use std::sync::Arc;
use std::time::Duration;
use winit::window::Window;

/// Default sleep between size polls while the window is minimized
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(16);

/// Presentation surface backed by a winit window
///
/// The event loop belongs to the application, so waiting for events is a
/// short sleep; the renderer re-reads the framebuffer size afterwards.
pub struct WindowSurface {
    window: Arc<Window>,
    poll_interval: Duration,
}

impl WindowSurface {
    pub fn new(window: Arc<Window>) -> Self {
        Self::with_poll_interval(window, DEFAULT_POLL_INTERVAL)
    }

    pub fn with_poll_interval(window: Arc<Window>, poll_interval: Duration) -> Self {
        Self { window, poll_interval }
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }
}

impl PresentationSurface for WindowSurface {
    fn framebuffer_size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }

    fn wait_events(&mut self) {
        std::thread::sleep(self.poll_interval);
    }
}
