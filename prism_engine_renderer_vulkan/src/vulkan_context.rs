/// GpuContext - Shared GPU state for all Vulkan objects
///
/// Contains everything needed for GPU operations:
/// - Instance and device for Vulkan API calls
/// - Allocator for memory management
/// - Queues for submission and presentation
/// - Command pool for one-shot upload operations
///
/// Every resource (buffer, texture, pipeline, swapchain) holds an
/// `Arc<GpuContext>`, so the device outlives every object created from it.

use ash::vk;
use gpu_allocator::vulkan::Allocator;
use prism_engine::prism::{Error, Result};
use prism_engine::engine_err;
use std::mem::ManuallyDrop;
use std::sync::{Mutex, MutexGuard};

/// Shared GPU context for all Vulkan resources
pub struct GpuContext {
    /// Keeps the Vulkan loader alive for the instance's lifetime
    pub(crate) entry: ash::Entry,
    pub instance: ash::Instance,
    pub physical_device: vk::PhysicalDevice,
    pub device: ash::Device,

    /// GPU memory allocator
    /// Wrapped in ManuallyDrop so its pages are freed BEFORE the device is destroyed
    pub allocator: ManuallyDrop<Mutex<Allocator>>,

    pub graphics_queue: vk::Queue,
    pub graphics_queue_family: u32,
    /// May be the same queue as `graphics_queue`
    pub present_queue: vk::Queue,
    pub present_queue_family: u32,
    /// Queue access is externally synchronized
    queue_lock: Mutex<()>,

    /// Reusable command pool for one-shot upload operations
    /// (created with TRANSIENT + RESET_COMMAND_BUFFER flags)
    upload_command_pool: Mutex<vk::CommandPool>,

    pub surface_loader: ash::khr::surface::Instance,
    pub swapchain_loader: ash::khr::swapchain::Device,
    /// VK_EXT_vertex_input_dynamic_state entry points
    pub vertex_input_loader: ash::ext::vertex_input_dynamic_state::Device,

    /// Debug utils loader (for validation layers)
    debug_utils_loader: Option<ash::ext::debug_utils::Instance>,
    debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
}

/// Handles produced by device bootstrap, assembled into a `GpuContext`
pub(crate) struct GpuContextParts {
    pub entry: ash::Entry,
    pub instance: ash::Instance,
    pub physical_device: vk::PhysicalDevice,
    pub device: ash::Device,
    pub allocator: Allocator,
    pub graphics_queue: vk::Queue,
    pub graphics_queue_family: u32,
    pub present_queue: vk::Queue,
    pub present_queue_family: u32,
    pub upload_command_pool: vk::CommandPool,
    pub debug_utils_loader: Option<ash::ext::debug_utils::Instance>,
    pub debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
}

impl GpuContext {
    pub(crate) fn new(parts: GpuContextParts) -> Self {
        let surface_loader = ash::khr::surface::Instance::new(&parts.entry, &parts.instance);
        let swapchain_loader = ash::khr::swapchain::Device::new(&parts.instance, &parts.device);
        let vertex_input_loader =
            ash::ext::vertex_input_dynamic_state::Device::new(&parts.instance, &parts.device);

        Self {
            entry: parts.entry,
            instance: parts.instance,
            physical_device: parts.physical_device,
            device: parts.device,
            allocator: ManuallyDrop::new(Mutex::new(parts.allocator)),
            graphics_queue: parts.graphics_queue,
            graphics_queue_family: parts.graphics_queue_family,
            present_queue: parts.present_queue,
            present_queue_family: parts.present_queue_family,
            queue_lock: Mutex::new(()),
            upload_command_pool: Mutex::new(parts.upload_command_pool),
            surface_loader,
            swapchain_loader,
            vertex_input_loader,
            debug_utils_loader: parts.debug_utils_loader,
            debug_messenger: parts.debug_messenger,
        }
    }

    /// Lock the allocator
    pub fn allocator(&self) -> Result<MutexGuard<'_, Allocator>> {
        self.allocator
            .lock()
            .map_err(|_| engine_err!("prism::vulkan", "GPU allocator lock poisoned"))
    }

    /// Serialize access to the queues
    pub fn lock_queues(&self) -> Result<MutexGuard<'_, ()>> {
        self.queue_lock
            .lock()
            .map_err(|_| engine_err!("prism::vulkan", "Queue lock poisoned"))
    }

    /// Record `record` into a one-time command buffer, submit it and wait
    ///
    /// Used for staging uploads at load time, never on the frame path.
    pub fn one_shot<F>(&self, record: F) -> Result<()>
    where
        F: FnOnce(vk::CommandBuffer),
    {
        let pool = self
            .upload_command_pool
            .lock()
            .map_err(|_| engine_err!("prism::vulkan", "Upload command pool lock poisoned"))?;

        unsafe {
            let allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(*pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);

            let command_buffer = self
                .device
                .allocate_command_buffers(&allocate_info)
                .map_err(|e| engine_err!("prism::vulkan", "Failed to allocate upload command buffer: {:?}", e))?
                .into_iter()
                .next()
                .ok_or_else(|| Error::BackendError("No upload command buffer returned".to_string()))?;

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

            let result = self
                .device
                .begin_command_buffer(command_buffer, &begin_info)
                .map_err(|e| engine_err!("prism::vulkan", "Failed to begin upload command buffer: {:?}", e))
                .and_then(|_| {
                    record(command_buffer);
                    self.device
                        .end_command_buffer(command_buffer)
                        .map_err(|e| engine_err!("prism::vulkan", "Failed to end upload command buffer: {:?}", e))
                })
                .and_then(|_| {
                    let command_buffers = [command_buffer];
                    let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);
                    let _queue = self.lock_queues()?;
                    self.device
                        .queue_submit(self.graphics_queue, &[submit_info], vk::Fence::null())
                        .map_err(|e| engine_err!("prism::vulkan", "Failed to submit upload: {:?}", e))?;
                    self.device
                        .queue_wait_idle(self.graphics_queue)
                        .map_err(|e| engine_err!("prism::vulkan", "Failed to wait for upload: {:?}", e))
                });

            self.device.free_command_buffers(*pool, &[command_buffer]);
            result
        }
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();

            if let Ok(pool) = self.upload_command_pool.get_mut() {
                self.device.destroy_command_pool(*pool, None);
            }

            // Free VkDeviceMemory pages BEFORE destroying the device
            ManuallyDrop::drop(&mut self.allocator);

            // Prevent callbacks during destruction
            crate::debug::cleanup_debug_config();
            if let (Some(debug_utils), Some(messenger)) =
                (&self.debug_utils_loader, self.debug_messenger)
            {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }

            self.device.destroy_device(None);
            self.instance.destroy_instance(None);
        }
    }
}
