/// Swapchain and presentation surface traits

use crate::error::Result;
use crate::graphics_device::{ClearValue, CommandList, Semaphore};

/// Outcome of acquire/present that is not a fatal error
///
/// `OutOfDate` and `Suboptimal` are transient: the frame scheduler recovers
/// from them by recreating size-dependent resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceStatus {
    Optimal,
    /// Usable, but no longer matches the surface exactly
    Suboptimal,
    /// Unusable until recreated
    OutOfDate,
}

/// Presentation swapchain
///
/// Owns every size-dependent resource: color images and views, the depth
/// buffer, the render pass and one framebuffer per image.
pub trait Swapchain: Send + Sync {
    /// Acquire the next presentable image, signaling `signal` when it is ready
    ///
    /// The returned index is meaningless when the status is `OutOfDate`.
    ///
    /// # Errors
    ///
    /// `Error::SyncTimeout` if no image became available within `timeout_ns`.
    fn acquire_next_image(&mut self, signal: &dyn Semaphore, timeout_ns: u64) -> Result<(u32, SurfaceStatus)>;

    /// Queue `image_index` for presentation once `wait` is signaled
    fn present(&mut self, image_index: u32, wait: &dyn Semaphore) -> Result<SurfaceStatus>;

    /// Begin the main render pass on the framebuffer of `image_index`
    ///
    /// `clear_values` holds the color clear followed by the depth clear.
    fn begin_render_pass(
        &self,
        cmd: &mut dyn CommandList,
        image_index: u32,
        clear_values: &[ClearValue],
    ) -> Result<()>;

    /// Release and rebuild every size-dependent resource at the new size
    ///
    /// The caller guarantees the device is idle.
    fn recreate(&mut self, width: u32, height: u32) -> Result<()>;

    fn image_count(&self) -> usize;
    fn width(&self) -> u32;
    fn height(&self) -> u32;
}

/// Output surface queried while waiting out a minimized window
pub trait PresentationSurface {
    /// Current drawable size in pixels; zero while minimized
    fn framebuffer_size(&self) -> (u32, u32);

    /// Yield to the platform event pump between size polls
    fn wait_events(&mut self);
}
