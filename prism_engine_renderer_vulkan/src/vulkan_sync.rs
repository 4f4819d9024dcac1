/// Fence and Semaphore - Vulkan implementations of the sync traits

use prism_engine::prism::{Error, Result};
use prism_engine::prism::graphics_device::{Fence as GraphicsDeviceFence, Semaphore as GraphicsDeviceSemaphore};
use prism_engine::engine_err;
use ash::vk;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// CPU-GPU fence
pub struct Fence {
    ctx: Arc<GpuContext>,
    pub(crate) fence: vk::Fence,
}

impl Fence {
    pub(crate) fn new(ctx: Arc<GpuContext>, signaled: bool) -> Result<Self> {
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };
        let create_info = vk::FenceCreateInfo::default().flags(flags);
        let fence = unsafe {
            ctx.device.create_fence(&create_info, None)
                .map_err(|e| engine_err!("prism::vulkan", "Failed to create fence: {:?}", e))?
        };
        Ok(Self { ctx, fence })
    }
}

impl GraphicsDeviceFence for Fence {
    fn wait(&self, timeout_ns: u64) -> Result<()> {
        unsafe {
            match self.ctx.device.wait_for_fences(&[self.fence], true, timeout_ns) {
                Ok(()) => Ok(()),
                Err(vk::Result::TIMEOUT) => Err(Error::SyncTimeout(format!("fence not signaled within {} ns", timeout_ns))),
                Err(e) => Err(engine_err!("prism::vulkan", "Failed to wait for fence: {:?}", e)),
            }
        }
    }

    fn reset(&self) -> Result<()> {
        unsafe {
            self.ctx.device.reset_fences(&[self.fence])
                .map_err(|e| engine_err!("prism::vulkan", "Failed to reset fence: {:?}", e))
        }
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        unsafe { self.ctx.device.destroy_fence(self.fence, None); }
    }
}

/// GPU-GPU binary semaphore
pub struct Semaphore {
    ctx: Arc<GpuContext>,
    pub(crate) semaphore: vk::Semaphore,
}

impl Semaphore {
    pub(crate) fn new(ctx: Arc<GpuContext>) -> Result<Self> {
        let create_info = vk::SemaphoreCreateInfo::default();
        let semaphore = unsafe {
            ctx.device.create_semaphore(&create_info, None)
                .map_err(|e| engine_err!("prism::vulkan", "Failed to create semaphore: {:?}", e))?
        };
        Ok(Self { ctx, semaphore })
    }

    /// Borrow the Vulkan handle behind a trait object created by this backend
    pub(crate) fn raw(semaphore: &dyn GraphicsDeviceSemaphore) -> vk::Semaphore {
        unsafe {
            let vk_semaphore = semaphore as *const dyn GraphicsDeviceSemaphore as *const Semaphore;
            (*vk_semaphore).semaphore
        }
    }
}

impl GraphicsDeviceSemaphore for Semaphore {}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe { self.ctx.device.destroy_semaphore(self.semaphore, None); }
    }
}
