/// VulkanGraphicsDevice - Vulkan implementation of graphics_device::GraphicsDevice
///
/// Bootstraps instance, device, queues and allocator, then hands out
/// resources that all share one `GpuContext`. Requires Vulkan 1.3 and
/// VK_EXT_vertex_input_dynamic_state, since mesh layouts are only known at
/// scene load time.

use prism_engine::prism::{Error, Result};
use prism_engine::prism::graphics_device::{
    GraphicsDevice, DeviceLimits,
    Buffer as GraphicsDeviceBuffer, BufferDesc,
    Texture as GraphicsDeviceTexture, TextureDesc,
    CommandList as GraphicsDeviceCommandList,
    Fence as GraphicsDeviceFence,
    Semaphore as GraphicsDeviceSemaphore,
    BindingGroup as GraphicsDeviceBindingGroup, BindingEntry,
    Pipeline as GraphicsDevicePipeline, PipelineKind,
};
use prism_engine::{engine_debug, engine_err, engine_error, engine_info, engine_warn};
use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use rustc_hash::FxHashMap;
use std::ffi::{CStr, CString};
use std::sync::{Arc, RwLock};
use winit::window::Window;

use crate::vulkan_binding_group::BindingGroupAllocator;
use crate::vulkan_buffer::Buffer;
use crate::vulkan_command_list::CommandList;
use crate::vulkan_config::VulkanConfig;
use crate::vulkan_context::{GpuContext, GpuContextParts};
use crate::vulkan_pipeline::Pipeline;
use crate::vulkan_shader_set::ShaderSet;
use crate::vulkan_swapchain::Swapchain;
use crate::vulkan_sync::{Fence, Semaphore};
use crate::vulkan_texture::Texture;

/// Device extensions every candidate GPU must expose
pub(crate) const REQUIRED_DEVICE_EXTENSIONS: [&CStr; 2] = [
    ash::khr::swapchain::NAME,
    ash::ext::vertex_input_dynamic_state::NAME,
];

/// Vulkan graphics device
pub struct VulkanGraphicsDevice {
    ctx: Arc<GpuContext>,
    binding_groups: Arc<BindingGroupAllocator>,
    pipelines: RwLock<FxHashMap<PipelineKind, Arc<dyn GraphicsDevicePipeline>>>,
    limits: DeviceLimits,
}

/// Instance-level state that must be torn down if device bootstrap fails
struct InstanceParts {
    entry: ash::Entry,
    instance: ash::Instance,
    debug_utils_loader: Option<ash::ext::debug_utils::Instance>,
    debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
}

impl InstanceParts {
    unsafe fn destroy(self) {
        crate::debug::cleanup_debug_config();
        if let (Some(debug_utils), Some(messenger)) = (&self.debug_utils_loader, self.debug_messenger) {
            debug_utils.destroy_debug_utils_messenger(messenger, None);
        }
        self.instance.destroy_instance(None);
    }
}

/// Queue families chosen for one physical device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct QueueFamilies {
    pub graphics: u32,
    pub present: u32,
}

/// First graphics family, and the first family that can present
///
/// A family that does both is preferred so one queue serves submit and present.
pub(crate) fn select_queue_families(
    families: &[vk::QueueFamilyProperties],
    supports_present: impl Fn(u32) -> bool,
) -> Option<QueueFamilies> {
    let graphics: Vec<u32> = families
        .iter()
        .enumerate()
        .filter(|(_, family)| family.queue_flags.contains(vk::QueueFlags::GRAPHICS) && family.queue_count > 0)
        .map(|(index, _)| index as u32)
        .collect();

    if let Some(&both) = graphics.iter().find(|&&index| supports_present(index)) {
        return Some(QueueFamilies { graphics: both, present: both });
    }
    let present = (0..families.len() as u32).find(|&index| supports_present(index))?;
    graphics.first().map(|&graphics| QueueFamilies { graphics, present })
}

/// Device limits the core reads from the physical device properties
pub(crate) fn limits_from_properties(properties: &vk::PhysicalDeviceProperties) -> DeviceLimits {
    DeviceLimits {
        min_uniform_buffer_offset_alignment: properties.limits.min_uniform_buffer_offset_alignment.max(1),
        max_uniform_buffer_range: properties.limits.max_uniform_buffer_range as u64,
    }
}

impl VulkanGraphicsDevice {
    /// Create the device for `window`
    ///
    /// The window is only used to pick a queue family that can present to it.
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(window: &W, config: VulkanConfig) -> Result<Self> {
        let instance_parts = Self::create_instance(window, &config)?;
        unsafe {
            match Self::create_device(window, &instance_parts) {
                Ok((physical_device, families, device, properties)) => {
                    Self::finish(instance_parts, physical_device, families, device, properties)
                }
                Err(e) => {
                    instance_parts.destroy();
                    Err(e)
                }
            }
        }
    }

    fn create_instance<W: HasDisplayHandle>(window: &W, config: &VulkanConfig) -> Result<InstanceParts> {
        unsafe {
            let entry = ash::Entry::load()
                .map_err(|e| {
                    engine_error!("prism::vulkan", "Failed to load Vulkan library: {:?}", e);
                    Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
                })?;

            let app_name = CString::new(config.app_name.replace('\0', ""))
                .unwrap_or_else(|_| CString::from(c"Prism Application"));
            let (major, minor, patch) = config.app_version;
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, major, minor, patch))
                .engine_name(c"Prism")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_3);

            let display_handle = window.display_handle()
                .map_err(|e| {
                    engine_error!("prism::vulkan", "Failed to get display handle: {}", e);
                    Error::InitializationFailed(format!("Failed to get display handle: {}", e))
                })?;
            let mut extension_names = ash_window::enumerate_required_extensions(display_handle.as_raw())
                .map_err(|e| {
                    engine_error!("prism::vulkan", "Failed to get required extensions: {}", e);
                    Error::InitializationFailed(format!("Failed to get required extensions: {}", e))
                })?
                .to_vec();

            if config.enable_validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
            }

            let layer_names = if config.enable_validation {
                vec![c"VK_LAYER_KHRONOS_validation".as_ptr()]
            } else {
                vec![]
            };

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry
                .create_instance(&create_info, None)
                .map_err(|e| {
                    engine_error!("prism::vulkan", "Failed to create Vulkan instance: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
                })?;

            let (debug_utils_loader, debug_messenger) = if config.enable_validation {
                let debug_utils = ash::ext::debug_utils::Instance::new(&entry, &instance);

                crate::debug::init_debug_config(crate::debug::Config {
                    severity: config.debug_severity,
                    output: config.debug_output.clone(),
                    break_on_error: config.break_on_validation_error,
                    panic_on_error: config.panic_on_error,
                    enable_stats: config.enable_validation_stats,
                });

                let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
                    .message_severity(crate::debug::severity_flags(config.debug_severity))
                    .message_type(
                        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                            | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                            | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE
                    )
                    .pfn_user_callback(Some(crate::debug::vulkan_debug_callback));

                match debug_utils.create_debug_utils_messenger(&debug_info, None) {
                    Ok(messenger) => (Some(debug_utils), Some(messenger)),
                    Err(e) => {
                        // Validation is a debug aid; run without it
                        engine_warn!("prism::vulkan", "Failed to create debug messenger: {:?}", e);
                        crate::debug::cleanup_debug_config();
                        (None, None)
                    }
                }
            } else {
                (None, None)
            };

            engine_info!("prism::vulkan", "Vulkan instance created (validation: {})", debug_messenger.is_some());
            Ok(InstanceParts { entry, instance, debug_utils_loader, debug_messenger })
        }
    }

    unsafe fn create_device<W: HasDisplayHandle + HasWindowHandle>(
        window: &W,
        parts: &InstanceParts,
    ) -> Result<(vk::PhysicalDevice, QueueFamilies, ash::Device, vk::PhysicalDeviceProperties)> {
        let instance = &parts.instance;

        // Temporary surface for queue selection
        let surface = create_surface(&parts.entry, instance, window)?;
        let surface_loader = ash::khr::surface::Instance::new(&parts.entry, instance);

        let physical_devices = instance
            .enumerate_physical_devices()
            .map_err(|e| {
                engine_error!("prism::vulkan", "Failed to enumerate physical devices: {:?}", e);
                Error::InitializationFailed(format!("Failed to enumerate physical devices: {:?}", e))
            });

        let selected = physical_devices.map(|devices| {
            devices.into_iter().find_map(|physical_device| {
                let properties = instance.get_physical_device_properties(physical_device);
                let name = CStr::from_ptr(properties.device_name.as_ptr()).to_string_lossy().into_owned();

                let available = instance
                    .enumerate_device_extension_properties(physical_device)
                    .unwrap_or_default();
                let missing: Vec<&CStr> = REQUIRED_DEVICE_EXTENSIONS
                    .iter()
                    .copied()
                    .filter(|required| {
                        !available.iter().any(|ext| {
                            CStr::from_ptr(ext.extension_name.as_ptr()) == *required
                        })
                    })
                    .collect();
                if !missing.is_empty() {
                    engine_debug!("prism::vulkan", "Skipping GPU '{}': missing {:?}", name, missing);
                    return None;
                }

                let families = instance.get_physical_device_queue_family_properties(physical_device);
                let families = select_queue_families(&families, |index| {
                    surface_loader
                        .get_physical_device_surface_support(physical_device, index, surface)
                        .unwrap_or(false)
                });
                match families {
                    Some(families) => {
                        engine_info!("prism::vulkan", "Selected GPU '{}' (graphics family {}, present family {})",
                            name, families.graphics, families.present);
                        Some((physical_device, families, properties))
                    }
                    None => {
                        engine_debug!("prism::vulkan", "Skipping GPU '{}': no graphics/present queue", name);
                        None
                    }
                }
            })
        });

        surface_loader.destroy_surface(surface, None);

        let (physical_device, families, properties) = selected?.ok_or_else(|| {
            engine_error!("prism::vulkan", "No GPU supports {:?}", REQUIRED_DEVICE_EXTENSIONS);
            Error::InitializationFailed("No suitable Vulkan GPU found".to_string())
        })?;

        let queue_priorities = [1.0];
        let mut queue_create_infos = vec![
            vk::DeviceQueueCreateInfo::default()
                .queue_family_index(families.graphics)
                .queue_priorities(&queue_priorities),
        ];
        if families.present != families.graphics {
            queue_create_infos.push(
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(families.present)
                    .queue_priorities(&queue_priorities),
            );
        }

        let device_extension_names: Vec<*const std::os::raw::c_char> = REQUIRED_DEVICE_EXTENSIONS
            .iter()
            .map(|name| name.as_ptr())
            .collect();

        let supported_features = instance.get_physical_device_features(physical_device);
        let device_features = vk::PhysicalDeviceFeatures::default()
            .sampler_anisotropy(supported_features.sampler_anisotropy == vk::TRUE);
        let mut vertex_input_features = vk::PhysicalDeviceVertexInputDynamicStateFeaturesEXT::default()
            .vertex_input_dynamic_state(true);

        let device_create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&device_extension_names)
            .enabled_features(&device_features)
            .push_next(&mut vertex_input_features);

        let device = instance
            .create_device(physical_device, &device_create_info, None)
            .map_err(|e| {
                engine_error!("prism::vulkan", "Failed to create logical device: {:?}", e);
                Error::InitializationFailed(format!("Failed to create device: {:?}", e))
            })?;

        Ok((physical_device, families, device, properties))
    }

    unsafe fn finish(
        instance_parts: InstanceParts,
        physical_device: vk::PhysicalDevice,
        families: QueueFamilies,
        device: ash::Device,
        properties: vk::PhysicalDeviceProperties,
    ) -> Result<Self> {
        let allocator = Allocator::new(&AllocatorCreateDesc {
            instance: instance_parts.instance.clone(),
            device: device.clone(),
            physical_device,
            debug_settings: Default::default(),
            buffer_device_address: false,
            allocation_sizes: Default::default(),
        });
        let allocator = match allocator {
            Ok(allocator) => allocator,
            Err(e) => {
                device.destroy_device(None);
                instance_parts.destroy();
                engine_error!("prism::vulkan", "Failed to create GPU allocator: {:?}", e);
                return Err(Error::InitializationFailed(format!("Failed to create allocator: {:?}", e)));
            }
        };

        let upload_pool_create_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(families.graphics)
            .flags(vk::CommandPoolCreateFlags::TRANSIENT | vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
        let upload_command_pool = match device.create_command_pool(&upload_pool_create_info, None) {
            Ok(pool) => pool,
            Err(e) => {
                drop(allocator);
                device.destroy_device(None);
                instance_parts.destroy();
                engine_error!("prism::vulkan", "Failed to create upload command pool: {:?}", e);
                return Err(Error::InitializationFailed(format!("Failed to create upload command pool: {:?}", e)));
            }
        };

        let anisotropy_supported = instance_parts.instance
            .get_physical_device_features(physical_device)
            .sampler_anisotropy == vk::TRUE;
        let max_anisotropy = if anisotropy_supported {
            properties.limits.max_sampler_anisotropy.min(16.0)
        } else {
            1.0
        };

        let graphics_queue = device.get_device_queue(families.graphics, 0);
        let present_queue = device.get_device_queue(families.present, 0);

        // From here on GpuContext owns device and instance destruction
        let ctx = Arc::new(GpuContext::new(GpuContextParts {
            entry: instance_parts.entry,
            instance: instance_parts.instance,
            physical_device,
            device,
            allocator,
            graphics_queue,
            graphics_queue_family: families.graphics,
            present_queue,
            present_queue_family: families.present,
            upload_command_pool,
            debug_utils_loader: instance_parts.debug_utils_loader,
            debug_messenger: instance_parts.debug_messenger,
        }));

        let binding_groups = Arc::new(BindingGroupAllocator::new(Arc::clone(&ctx), max_anisotropy)?);
        let limits = limits_from_properties(&properties);
        engine_info!("prism::vulkan", "Device limits: uniform offset alignment {}, uniform range {}",
            limits.min_uniform_buffer_offset_alignment, limits.max_uniform_buffer_range);

        Ok(Self {
            ctx,
            binding_groups,
            pipelines: RwLock::new(FxHashMap::default()),
            limits,
        })
    }

    /// Create a swapchain presenting to `window`, sized to its framebuffer
    pub fn create_swapchain(&self, window: &Window) -> Result<Swapchain> {
        let size = window.inner_size();
        let surface = unsafe { create_surface(&self.ctx.entry, &self.ctx.instance, window)? };

        let supported = unsafe {
            self.ctx.surface_loader
                .get_physical_device_surface_support(self.ctx.physical_device, self.ctx.present_queue_family, surface)
                .unwrap_or(false)
        };
        if !supported {
            unsafe { self.ctx.surface_loader.destroy_surface(surface, None); }
            engine_error!("prism::vulkan", "Present queue family {} cannot present to this window",
                self.ctx.present_queue_family);
            return Err(Error::InitializationFailed("window surface not supported by the present queue".to_string()));
        }

        Swapchain::new(Arc::clone(&self.ctx), surface, size.width, size.height)
    }

    /// Build one pipeline per kind in `shaders` against the swapchain's render pass
    ///
    /// Replaces any pipeline previously built for the same kind.
    pub fn create_pipelines(&self, swapchain: &Swapchain, shaders: &ShaderSet) -> Result<()> {
        let mut built: Vec<(PipelineKind, Arc<dyn GraphicsDevicePipeline>)> = Vec::new();
        for (kind, program) in shaders.iter() {
            let pipeline = Pipeline::create(
                Arc::clone(&self.ctx),
                kind,
                &program.vertex,
                &program.fragment,
                self.binding_groups.set_layout,
                swapchain.render_pass,
            )?;
            built.push((kind, Arc::new(pipeline)));
        }

        let mut pipelines = self.pipelines.write()
            .map_err(|_| Error::BackendError("pipeline table lock poisoned".to_string()))?;
        for (kind, pipeline) in built {
            engine_debug!("prism::vulkan", "Pipeline '{}' ready", kind);
            pipelines.insert(kind, pipeline);
        }
        Ok(())
    }
}

unsafe fn create_surface<W: HasDisplayHandle + HasWindowHandle>(
    entry: &ash::Entry,
    instance: &ash::Instance,
    window: &W,
) -> Result<vk::SurfaceKHR> {
    let display_handle = window.display_handle()
        .map_err(|e| {
            engine_error!("prism::vulkan", "Failed to get display handle: {}", e);
            Error::InitializationFailed(format!("Failed to get display handle: {}", e))
        })?;
    let window_handle = window.window_handle()
        .map_err(|e| {
            engine_error!("prism::vulkan", "Failed to get window handle: {}", e);
            Error::InitializationFailed(format!("Failed to get window handle: {}", e))
        })?;

    ash_window::create_surface(entry, instance, display_handle.as_raw(), window_handle.as_raw(), None)
        .map_err(|e| {
            engine_error!("prism::vulkan", "Failed to create surface: {:?}", e);
            Error::InitializationFailed(format!("Failed to create surface: {:?}", e))
        })
}

impl GraphicsDevice for VulkanGraphicsDevice {
    fn create_buffer(&self, desc: BufferDesc) -> Result<Arc<dyn GraphicsDeviceBuffer>> {
        Ok(Arc::new(Buffer::new(Arc::clone(&self.ctx), &desc)?))
    }

    fn create_texture(&self, desc: TextureDesc) -> Result<Arc<dyn GraphicsDeviceTexture>> {
        Ok(Arc::new(Texture::upload(Arc::clone(&self.ctx), &desc)?))
    }

    fn create_command_list(&self) -> Result<Box<dyn GraphicsDeviceCommandList>> {
        Ok(Box::new(CommandList::new(Arc::clone(&self.ctx))?))
    }

    fn create_fence(&self, signaled: bool) -> Result<Arc<dyn GraphicsDeviceFence>> {
        Ok(Arc::new(Fence::new(Arc::clone(&self.ctx), signaled)?))
    }

    fn create_semaphore(&self) -> Result<Arc<dyn GraphicsDeviceSemaphore>> {
        Ok(Arc::new(Semaphore::new(Arc::clone(&self.ctx))?))
    }

    fn create_binding_group(&self, entries: &[BindingEntry]) -> Result<Arc<dyn GraphicsDeviceBindingGroup>> {
        Ok(Arc::new(self.binding_groups.create_group(entries)?))
    }

    fn pipeline(&self, kind: PipelineKind) -> Result<Arc<dyn GraphicsDevicePipeline>> {
        let pipelines = self.pipelines.read()
            .map_err(|_| Error::BackendError("pipeline table lock poisoned".to_string()))?;
        pipelines
            .get(&kind)
            .cloned()
            .ok_or_else(|| Error::InvalidResource(format!("no '{}' pipeline was created", kind)))
    }

    fn submit(
        &self,
        cmd: &dyn GraphicsDeviceCommandList,
        wait: &dyn GraphicsDeviceSemaphore,
        signal: &dyn GraphicsDeviceSemaphore,
        fence: &dyn GraphicsDeviceFence,
    ) -> Result<()> {
        let vk_fence = unsafe {
            let vk_fence = fence as *const dyn GraphicsDeviceFence as *const Fence;
            (*vk_fence).fence
        };

        let command_buffers = [CommandList::raw(cmd)];
        let wait_semaphores = [Semaphore::raw(wait)];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let signal_semaphores = [Semaphore::raw(signal)];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        let _queues = self.ctx.lock_queues()?;
        unsafe {
            self.ctx.device
                .queue_submit(self.ctx.graphics_queue, &[submit_info], vk_fence)
                .map_err(|e| engine_err!("prism::vulkan", "Failed to submit commands to GPU queue: {:?}", e))
        }
    }

    fn wait_idle(&self) -> Result<()> {
        let _queues = self.ctx.lock_queues()?;
        unsafe {
            self.ctx.device
                .device_wait_idle()
                .map_err(|e| engine_err!("prism::vulkan", "Failed to wait idle: {:?}", e))
        }
    }

    fn limits(&self) -> DeviceLimits {
        self.limits
    }
}

impl Drop for VulkanGraphicsDevice {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.device_wait_idle().ok();
        }
        // Pipelines and binding groups release their Arc<GpuContext>; the
        // device itself goes when the last resource does
        if let Ok(pipelines) = self.pipelines.get_mut() {
            pipelines.clear();
        }
    }
}

#[cfg(test)]
#[path = "vulkan_format_tests.rs"]
mod tests;
