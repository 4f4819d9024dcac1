/// Swapchain - Vulkan implementation of graphics_device::Swapchain trait
///
/// Owns the surface, the presentable images, a shared depth buffer and one
/// framebuffer per image. The render pass survives recreation, so pipelines
/// built against it stay valid across resizes.

use prism_engine::prism::{Error, Result};
use prism_engine::prism::graphics_device::{
    Swapchain as GraphicsDeviceSwapchain,
    CommandList as GraphicsDeviceCommandList,
    Semaphore as GraphicsDeviceSemaphore,
    ClearValue, SurfaceStatus,
};
use prism_engine::{engine_bail, engine_err, engine_error, engine_info};
use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use std::sync::Arc;

use crate::vulkan_command_list::CommandList as VulkanCommandList;
use crate::vulkan_context::GpuContext;
use crate::vulkan_sync::Semaphore as VulkanSemaphore;

pub(crate) const DEPTH_FORMAT: vk::Format = vk::Format::D32_SFLOAT;

/// Prefer an sRGB 8-bit format, otherwise take what the surface offers first
pub(crate) fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    formats
        .iter()
        .find(|f| {
            (f.format == vk::Format::B8G8R8A8_SRGB || f.format == vk::Format::R8G8B8A8_SRGB)
                && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
        })
        .or_else(|| formats.first())
        .copied()
}

/// The surface's fixed extent, or the requested size clamped to its limits
pub(crate) fn choose_extent(capabilities: &vk::SurfaceCapabilitiesKHR, width: u32, height: u32) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        capabilities.current_extent
    } else {
        vk::Extent2D {
            width: width.clamp(
                capabilities.min_image_extent.width,
                capabilities.max_image_extent.width,
            ),
            height: height.clamp(
                capabilities.min_image_extent.height,
                capabilities.max_image_extent.height,
            ),
        }
    }
}

/// One more than the minimum, capped when the surface has a maximum
pub(crate) fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let image_count = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        image_count.min(capabilities.max_image_count)
    } else {
        image_count
    }
}

struct DepthBuffer {
    image: vk::Image,
    view: vk::ImageView,
    allocation: Option<Allocation>,
}

/// Vulkan swapchain implementation
pub struct Swapchain {
    ctx: Arc<GpuContext>,
    surface: vk::SurfaceKHR,
    swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    surface_format: vk::SurfaceFormatKHR,
    extent: vk::Extent2D,
    depth: Option<DepthBuffer>,
    pub(crate) render_pass: vk::RenderPass,
    framebuffers: Vec<vk::Framebuffer>,
}

impl Swapchain {
    /// Create the swapchain for `surface`; the swapchain takes ownership of it
    pub(crate) fn new(ctx: Arc<GpuContext>, surface: vk::SurfaceKHR, width: u32, height: u32) -> Result<Self> {
        let surface_formats = unsafe {
            ctx.surface_loader
                .get_physical_device_surface_formats(ctx.physical_device, surface)
        };
        let surface_format = match surface_formats.ok().as_deref().and_then(choose_surface_format) {
            Some(format) => format,
            None => {
                unsafe { ctx.surface_loader.destroy_surface(surface, None); }
                engine_error!("prism::vulkan", "Surface reports no usable formats");
                return Err(Error::InitializationFailed("surface reports no usable formats".to_string()));
            }
        };

        // Partially built state is released by Drop on any error below
        let mut swapchain = Self {
            ctx,
            surface,
            swapchain: vk::SwapchainKHR::null(),
            images: Vec::new(),
            image_views: Vec::new(),
            surface_format,
            extent: vk::Extent2D { width: 0, height: 0 },
            depth: None,
            render_pass: vk::RenderPass::null(),
            framebuffers: Vec::new(),
        };
        swapchain.render_pass = swapchain.create_render_pass()?;
        swapchain.build(width, height)?;

        engine_info!("prism::vulkan", "Swapchain created: {}x{}, {} images, {:?}",
            swapchain.extent.width, swapchain.extent.height, swapchain.images.len(), surface_format.format);
        Ok(swapchain)
    }

    fn create_render_pass(&self) -> Result<vk::RenderPass> {
        let attachments = [
            vk::AttachmentDescription::default()
                .format(self.surface_format.format)
                .samples(vk::SampleCountFlags::TYPE_1)
                .load_op(vk::AttachmentLoadOp::CLEAR)
                .store_op(vk::AttachmentStoreOp::STORE)
                .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                .initial_layout(vk::ImageLayout::UNDEFINED)
                .final_layout(vk::ImageLayout::PRESENT_SRC_KHR),
            vk::AttachmentDescription::default()
                .format(DEPTH_FORMAT)
                .samples(vk::SampleCountFlags::TYPE_1)
                .load_op(vk::AttachmentLoadOp::CLEAR)
                .store_op(vk::AttachmentStoreOp::DONT_CARE)
                .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                .initial_layout(vk::ImageLayout::UNDEFINED)
                .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL),
        ];

        let color_attachment_ref = vk::AttachmentReference::default()
            .attachment(0)
            .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);
        let depth_attachment_ref = vk::AttachmentReference::default()
            .attachment(1)
            .layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);

        let subpass = vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(std::slice::from_ref(&color_attachment_ref))
            .depth_stencil_attachment(&depth_attachment_ref);

        // The depth image is shared by all frames in flight
        let dependency = vk::SubpassDependency::default()
            .src_subpass(vk::SUBPASS_EXTERNAL)
            .dst_subpass(0)
            .src_stage_mask(
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                    | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS,
            )
            .src_access_mask(vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE)
            .dst_stage_mask(
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                    | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
            )
            .dst_access_mask(
                vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                    | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            );

        let render_pass_info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(std::slice::from_ref(&subpass))
            .dependencies(std::slice::from_ref(&dependency));

        unsafe {
            self.ctx.device.create_render_pass(&render_pass_info, None)
                .map_err(|e| engine_err!("prism::vulkan", "Failed to create render pass: {:?}", e))
        }
    }

    /// (Re)build swapchain, views, depth buffer and framebuffers
    fn build(&mut self, width: u32, height: u32) -> Result<()> {
        let ctx = Arc::clone(&self.ctx);

        unsafe {
            let capabilities = ctx.surface_loader
                .get_physical_device_surface_capabilities(ctx.physical_device, self.surface)
                .map_err(|e| engine_err!("prism::vulkan", "Failed to get surface capabilities: {:?}", e))?;

            let extent = choose_extent(&capabilities, width, height);
            if extent.width == 0 || extent.height == 0 {
                return Err(Error::InvalidState(format!(
                    "cannot build a swapchain with extent {}x{}", extent.width, extent.height
                )));
            }

            let queue_families = [ctx.graphics_queue_family, ctx.present_queue_family];
            let mut swapchain_create_info = vk::SwapchainCreateInfoKHR::default()
                .surface(self.surface)
                .min_image_count(choose_image_count(&capabilities))
                .image_format(self.surface_format.format)
                .image_color_space(self.surface_format.color_space)
                .image_extent(extent)
                .image_array_layers(1)
                .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
                .pre_transform(capabilities.current_transform)
                .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
                .present_mode(vk::PresentModeKHR::FIFO)
                .clipped(true)
                .old_swapchain(self.swapchain);

            swapchain_create_info = if ctx.graphics_queue_family != ctx.present_queue_family {
                swapchain_create_info
                    .image_sharing_mode(vk::SharingMode::CONCURRENT)
                    .queue_family_indices(&queue_families)
            } else {
                swapchain_create_info.image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            };

            let swapchain = ctx.swapchain_loader
                .create_swapchain(&swapchain_create_info, None)
                .map_err(|e| engine_err!("prism::vulkan", "Failed to create swapchain: {:?}", e))?;

            self.destroy_targets();
            if self.swapchain != vk::SwapchainKHR::null() {
                ctx.swapchain_loader.destroy_swapchain(self.swapchain, None);
            }
            self.swapchain = swapchain;
            self.extent = extent;

            self.images = ctx.swapchain_loader
                .get_swapchain_images(swapchain)
                .map_err(|e| engine_err!("prism::vulkan", "Failed to get swapchain images: {:?}", e))?;

            for &image in &self.images {
                let view = create_view(&ctx, image, self.surface_format.format, vk::ImageAspectFlags::COLOR)?;
                self.image_views.push(view);
            }

            self.depth = Some(self.create_depth_buffer()?);

            let depth_view = self.depth.as_ref().map(|d| d.view).unwrap_or_default();
            for &view in &self.image_views {
                let attachments = [view, depth_view];
                let framebuffer_info = vk::FramebufferCreateInfo::default()
                    .render_pass(self.render_pass)
                    .attachments(&attachments)
                    .width(extent.width)
                    .height(extent.height)
                    .layers(1);
                let framebuffer = ctx.device.create_framebuffer(&framebuffer_info, None)
                    .map_err(|e| engine_err!("prism::vulkan", "Failed to create framebuffer: {:?}", e))?;
                self.framebuffers.push(framebuffer);
            }
        }
        Ok(())
    }

    fn create_depth_buffer(&self) -> Result<DepthBuffer> {
        let ctx = &self.ctx;
        unsafe {
            let image_create_info = vk::ImageCreateInfo::default()
                .image_type(vk::ImageType::TYPE_2D)
                .format(DEPTH_FORMAT)
                .extent(vk::Extent3D { width: self.extent.width, height: self.extent.height, depth: 1 })
                .mip_levels(1)
                .array_layers(1)
                .samples(vk::SampleCountFlags::TYPE_1)
                .tiling(vk::ImageTiling::OPTIMAL)
                .usage(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT)
                .sharing_mode(vk::SharingMode::EXCLUSIVE)
                .initial_layout(vk::ImageLayout::UNDEFINED);

            let image = ctx.device.create_image(&image_create_info, None)
                .map_err(|e| engine_err!("prism::vulkan", "Failed to create depth image: {:?}", e))?;
            let mut depth = DepthBuffer { image, view: vk::ImageView::null(), allocation: None };

            let requirements = ctx.device.get_image_memory_requirements(image);
            let allocation = ctx.allocator().and_then(|mut allocator| {
                allocator.allocate(&AllocationCreateDesc {
                    name: "depth_buffer",
                    requirements,
                    location: MemoryLocation::GpuOnly,
                    linear: false,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                })
                .map_err(|_e| {
                    engine_error!("prism::vulkan", "Out of GPU memory for depth buffer ({}x{})",
                        self.extent.width, self.extent.height);
                    Error::OutOfMemory
                })
            });
            let allocation = match allocation {
                Ok(allocation) => allocation,
                Err(e) => {
                    destroy_depth_buffer(ctx, depth);
                    return Err(e);
                }
            };

            let bound = ctx.device.bind_image_memory(image, allocation.memory(), allocation.offset());
            depth.allocation = Some(allocation);
            if let Err(e) = bound {
                destroy_depth_buffer(ctx, depth);
                return Err(engine_err!("prism::vulkan", "Failed to bind depth image memory: {:?}", e));
            }

            match create_view(ctx, image, DEPTH_FORMAT, vk::ImageAspectFlags::DEPTH) {
                Ok(view) => depth.view = view,
                Err(e) => {
                    destroy_depth_buffer(ctx, depth);
                    return Err(e);
                }
            }
            Ok(depth)
        }
    }

    /// Destroy everything that depends on the swapchain images
    fn destroy_targets(&mut self) {
        unsafe {
            for framebuffer in self.framebuffers.drain(..) {
                self.ctx.device.destroy_framebuffer(framebuffer, None);
            }
            for view in self.image_views.drain(..) {
                self.ctx.device.destroy_image_view(view, None);
            }
        }
        if let Some(depth) = self.depth.take() {
            destroy_depth_buffer(&self.ctx, depth);
        }
        self.images.clear();
    }
}

fn create_view(ctx: &GpuContext, image: vk::Image, format: vk::Format, aspect: vk::ImageAspectFlags) -> Result<vk::ImageView> {
    let create_info = vk::ImageViewCreateInfo::default()
        .image(image)
        .view_type(vk::ImageViewType::TYPE_2D)
        .format(format)
        .components(vk::ComponentMapping {
            r: vk::ComponentSwizzle::IDENTITY,
            g: vk::ComponentSwizzle::IDENTITY,
            b: vk::ComponentSwizzle::IDENTITY,
            a: vk::ComponentSwizzle::IDENTITY,
        })
        .subresource_range(vk::ImageSubresourceRange {
            aspect_mask: aspect,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        });
    unsafe {
        ctx.device.create_image_view(&create_info, None)
            .map_err(|e| engine_err!("prism::vulkan", "Failed to create image view: {:?}", e))
    }
}

fn destroy_depth_buffer(ctx: &GpuContext, mut depth: DepthBuffer) {
    unsafe {
        if depth.view != vk::ImageView::null() {
            ctx.device.destroy_image_view(depth.view, None);
        }
        if let Some(allocation) = depth.allocation.take() {
            if let Ok(mut allocator) = ctx.allocator() {
                allocator.free(allocation).ok();
            }
        }
        ctx.device.destroy_image(depth.image, None);
    }
}

impl GraphicsDeviceSwapchain for Swapchain {
    fn acquire_next_image(&mut self, signal: &dyn GraphicsDeviceSemaphore, timeout_ns: u64) -> Result<(u32, SurfaceStatus)> {
        let semaphore = VulkanSemaphore::raw(signal);
        let result = unsafe {
            self.ctx.swapchain_loader.acquire_next_image(
                self.swapchain,
                timeout_ns,
                semaphore,
                vk::Fence::null(),
            )
        };

        match result {
            Ok((image_index, false)) => Ok((image_index, SurfaceStatus::Optimal)),
            Ok((image_index, true)) => Ok((image_index, SurfaceStatus::Suboptimal)),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok((0, SurfaceStatus::OutOfDate)),
            Err(vk::Result::TIMEOUT) | Err(vk::Result::NOT_READY) => Err(Error::SyncTimeout(format!(
                "no swapchain image within {} ns", timeout_ns
            ))),
            Err(e) => Err(engine_err!("prism::vulkan", "Failed to acquire next swapchain image: {:?}", e)),
        }
    }

    fn present(&mut self, image_index: u32, wait: &dyn GraphicsDeviceSemaphore) -> Result<SurfaceStatus> {
        if image_index as usize >= self.images.len() {
            engine_bail!("prism::vulkan", "present: image_index {} out of range (count: {})",
                image_index, self.images.len());
        }

        let swapchains = [self.swapchain];
        let image_indices = [image_index];
        let wait_semaphores = [VulkanSemaphore::raw(wait)];
        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let result = {
            let _queues = self.ctx.lock_queues()?;
            unsafe { self.ctx.swapchain_loader.queue_present(self.ctx.present_queue, &present_info) }
        };

        match result {
            Ok(false) => Ok(SurfaceStatus::Optimal),
            Ok(true) | Err(vk::Result::SUBOPTIMAL_KHR) => Ok(SurfaceStatus::Suboptimal),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(SurfaceStatus::OutOfDate),
            Err(e) => Err(engine_err!("prism::vulkan", "Failed to present swapchain image: {:?}", e)),
        }
    }

    fn begin_render_pass(
        &self,
        cmd: &mut dyn GraphicsDeviceCommandList,
        image_index: u32,
        clear_values: &[ClearValue],
    ) -> Result<()> {
        let framebuffer = match self.framebuffers.get(image_index as usize) {
            Some(&framebuffer) => framebuffer,
            None => return Err(Error::InvalidResource(format!(
                "swapchain image {} out of range (count: {})", image_index, self.framebuffers.len()
            ))),
        };
        VulkanCommandList::downcast_mut(cmd)
            .begin_render_pass_raw(self.render_pass, framebuffer, self.extent, clear_values)
    }

    fn recreate(&mut self, width: u32, height: u32) -> Result<()> {
        unsafe {
            self.ctx.device.device_wait_idle()
                .map_err(|e| engine_err!("prism::vulkan", "Failed to wait idle before swapchain recreate: {:?}", e))?;
        }
        self.build(width, height)?;
        engine_info!("prism::vulkan", "Swapchain recreated: {}x{}", self.extent.width, self.extent.height);
        Ok(())
    }

    fn image_count(&self) -> usize {
        self.images.len()
    }

    fn width(&self) -> u32 {
        self.extent.width
    }

    fn height(&self) -> u32 {
        self.extent.height
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.device_wait_idle().ok();
        }
        self.destroy_targets();
        unsafe {
            if self.render_pass != vk::RenderPass::null() {
                self.ctx.device.destroy_render_pass(self.render_pass, None);
            }
            if self.swapchain != vk::SwapchainKHR::null() {
                self.ctx.swapchain_loader.destroy_swapchain(self.swapchain, None);
            }
            self.ctx.surface_loader.destroy_surface(self.surface, None);
        }
    }
}
