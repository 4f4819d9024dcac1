/// CommandList - Vulkan implementation of graphics_device::CommandList trait

use prism_engine::prism::{Error, Result};
use prism_engine::prism::graphics_device::{
    CommandList as GraphicsDeviceCommandList,
    Pipeline as GraphicsDevicePipeline,
    Buffer as GraphicsDeviceBuffer,
    BindingGroup as GraphicsDeviceBindingGroup,
    BufferFormat, VertexLayout, Viewport, Rect2D, ClearValue,
};
use prism_engine::engine_err;
use ash::vk;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_pipeline::Pipeline;
use crate::vulkan_buffer::Buffer;
use crate::vulkan_binding_group::BindingGroup;

/// Map an engine vertex format to its Vulkan equivalent
pub(crate) fn buffer_format_to_vk(format: BufferFormat) -> vk::Format {
    match format {
        BufferFormat::R32G32_SFLOAT => vk::Format::R32G32_SFLOAT,
        BufferFormat::R32G32B32_SFLOAT => vk::Format::R32G32B32_SFLOAT,
        BufferFormat::R32G32B32A32_SFLOAT => vk::Format::R32G32B32A32_SFLOAT,
        BufferFormat::R8G8B8A8_UNORM => vk::Format::R8G8B8A8_UNORM,
    }
}

/// Convert engine clear values
pub(crate) fn clear_values_to_vk(clear_values: &[ClearValue]) -> Vec<vk::ClearValue> {
    clear_values
        .iter()
        .map(|cv| match cv {
            ClearValue::Color(color) => vk::ClearValue {
                color: vk::ClearColorValue { float32: *color },
            },
            ClearValue::DepthStencil { depth, stencil } => vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue {
                    depth: *depth,
                    stencil: *stencil,
                },
            },
        })
        .collect()
}

/// Vulkan command list implementation
///
/// Owns its command pool so one list per frame slot can be reset independently.
pub struct CommandList {
    ctx: Arc<GpuContext>,
    command_pool: vk::CommandPool,
    pub(crate) command_buffer: vk::CommandBuffer,
    is_recording: bool,
    in_render_pass: bool,
    /// Layout of the bound pipeline (push constants, binding groups)
    bound_pipeline_layout: Option<vk::PipelineLayout>,
}

impl CommandList {
    pub(crate) fn new(ctx: Arc<GpuContext>) -> Result<Self> {
        unsafe {
            let command_pool_create_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(ctx.graphics_queue_family)
                .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

            let command_pool = ctx.device.create_command_pool(&command_pool_create_info, None)
                .map_err(|e| engine_err!("prism::vulkan", "Failed to create command pool: {:?}", e))?;

            let command_buffer_allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(command_pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);

            let command_buffer = match ctx.device.allocate_command_buffers(&command_buffer_allocate_info) {
                Ok(buffers) => buffers[0],
                Err(e) => {
                    ctx.device.destroy_command_pool(command_pool, None);
                    return Err(engine_err!("prism::vulkan", "Failed to allocate command buffer: {:?}", e));
                }
            };

            Ok(Self {
                ctx,
                command_pool,
                command_buffer,
                is_recording: false,
                in_render_pass: false,
                bound_pipeline_layout: None,
            })
        }
    }

    /// Borrow the Vulkan handle behind a trait object created by this backend
    pub(crate) fn raw(cmd: &dyn GraphicsDeviceCommandList) -> vk::CommandBuffer {
        unsafe {
            let vk_cmd = cmd as *const dyn GraphicsDeviceCommandList as *const CommandList;
            (*vk_cmd).command_buffer
        }
    }

    /// Downcast a trait object created by this backend
    pub(crate) fn downcast_mut(cmd: &mut dyn GraphicsDeviceCommandList) -> &mut CommandList {
        unsafe {
            let vk_cmd = cmd as *mut dyn GraphicsDeviceCommandList as *mut CommandList;
            &mut *vk_cmd
        }
    }

    fn check_recording(&self) -> Result<()> {
        if !self.is_recording {
            return Err(Error::InvalidState("Command list not recording".to_string()));
        }
        Ok(())
    }

    fn check_in_render_pass(&self) -> Result<()> {
        self.check_recording()?;
        if !self.in_render_pass {
            return Err(Error::InvalidState("Not inside a render pass".to_string()));
        }
        Ok(())
    }

    /// Begin a render pass on a framebuffer owned by the swapchain
    pub(crate) fn begin_render_pass_raw(
        &mut self,
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        extent: vk::Extent2D,
        clear_values: &[ClearValue],
    ) -> Result<()> {
        self.check_recording()?;
        if self.in_render_pass {
            return Err(Error::InvalidState("Already inside a render pass".to_string()));
        }

        let vk_clear_values = clear_values_to_vk(clear_values);
        let render_pass_info = vk::RenderPassBeginInfo::default()
            .render_pass(render_pass)
            .framebuffer(framebuffer)
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent,
            })
            .clear_values(&vk_clear_values);

        unsafe {
            self.ctx.device.cmd_begin_render_pass(
                self.command_buffer,
                &render_pass_info,
                vk::SubpassContents::INLINE,
            );
        }
        self.in_render_pass = true;
        Ok(())
    }
}

impl GraphicsDeviceCommandList for CommandList {
    fn begin(&mut self) -> Result<()> {
        if self.is_recording {
            return Err(Error::InvalidState("Command list already recording".to_string()));
        }

        unsafe {
            self.ctx.device
                .reset_command_buffer(self.command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| engine_err!("prism::vulkan", "Failed to reset command buffer: {:?}", e))?;

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

            self.ctx.device
                .begin_command_buffer(self.command_buffer, &begin_info)
                .map_err(|e| engine_err!("prism::vulkan", "Failed to begin command buffer: {:?}", e))?;
        }

        self.is_recording = true;
        self.in_render_pass = false;
        self.bound_pipeline_layout = None;
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.check_recording()?;
        if self.in_render_pass {
            return Err(Error::InvalidState("Render pass not ended before ending command list".to_string()));
        }

        unsafe {
            self.ctx.device
                .end_command_buffer(self.command_buffer)
                .map_err(|e| engine_err!("prism::vulkan", "Failed to end command buffer: {:?}", e))?;
        }
        self.is_recording = false;
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.check_in_render_pass()?;
        unsafe { self.ctx.device.cmd_end_render_pass(self.command_buffer); }
        self.in_render_pass = false;
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.check_recording()?;
        let vk_viewport = vk::Viewport::default()
            .x(viewport.x)
            .y(viewport.y)
            .width(viewport.width)
            .height(viewport.height)
            .min_depth(viewport.min_depth)
            .max_depth(viewport.max_depth);

        unsafe { self.ctx.device.cmd_set_viewport(self.command_buffer, 0, &[vk_viewport]); }
        Ok(())
    }

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        self.check_recording()?;
        let vk_scissor = vk::Rect2D::default()
            .offset(vk::Offset2D { x: scissor.x, y: scissor.y })
            .extent(vk::Extent2D { width: scissor.width, height: scissor.height });

        unsafe { self.ctx.device.cmd_set_scissor(self.command_buffer, 0, &[vk_scissor]); }
        Ok(())
    }

    fn bind_pipeline(&mut self, pipeline: &Arc<dyn GraphicsDevicePipeline>) -> Result<()> {
        self.check_in_render_pass()?;

        unsafe {
            let vk_pipeline = pipeline.as_ref() as *const dyn GraphicsDevicePipeline as *const Pipeline;
            let vk_pipeline = &*vk_pipeline;

            self.ctx.device.cmd_bind_pipeline(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                vk_pipeline.pipeline,
            );
            self.bound_pipeline_layout = Some(vk_pipeline.layout);
        }
        Ok(())
    }

    fn set_vertex_input(&mut self, layout: &VertexLayout) -> Result<()> {
        self.check_recording()?;

        let bindings = [vk::VertexInputBindingDescription2EXT::default()
            .binding(0)
            .stride(layout.stride)
            .input_rate(vk::VertexInputRate::VERTEX)
            .divisor(1)];

        let attributes: Vec<vk::VertexInputAttributeDescription2EXT> = layout.attributes
            .iter()
            .map(|attribute| {
                vk::VertexInputAttributeDescription2EXT::default()
                    .location(attribute.location)
                    .binding(0)
                    .format(buffer_format_to_vk(attribute.format))
                    .offset(attribute.offset)
            })
            .collect();

        unsafe {
            self.ctx.vertex_input_loader.cmd_set_vertex_input(self.command_buffer, &bindings, &attributes);
        }
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, buffer: &Arc<dyn GraphicsDeviceBuffer>, offset: u64) -> Result<()> {
        self.check_recording()?;

        unsafe {
            let vk_buffer = buffer.as_ref() as *const dyn GraphicsDeviceBuffer as *const Buffer;
            let vk_buffer = &*vk_buffer;

            self.ctx.device.cmd_bind_vertex_buffers(
                self.command_buffer,
                0,
                &[vk_buffer.buffer],
                &[offset],
            );
        }
        Ok(())
    }

    fn bind_binding_group(
        &mut self,
        pipeline: &Arc<dyn GraphicsDevicePipeline>,
        set_index: u32,
        group: &Arc<dyn GraphicsDeviceBindingGroup>,
        dynamic_offsets: &[u32],
    ) -> Result<()> {
        self.check_recording()?;

        unsafe {
            let vk_pipeline = pipeline.as_ref() as *const dyn GraphicsDevicePipeline as *const Pipeline;
            let vk_pipeline = &*vk_pipeline;
            let vk_group = group.as_ref() as *const dyn GraphicsDeviceBindingGroup as *const BindingGroup;
            let vk_group = &*vk_group;

            self.ctx.device.cmd_bind_descriptor_sets(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                vk_pipeline.layout,
                set_index,
                &[vk_group.descriptor_set],
                dynamic_offsets,
            );
        }
        Ok(())
    }

    fn push_constants(&mut self, offset: u32, data: &[u8]) -> Result<()> {
        self.check_recording()?;

        let layout = self.bound_pipeline_layout.ok_or_else(|| {
            Error::InvalidState("No pipeline bound for push constants".to_string())
        })?;

        unsafe {
            // The shared layout declares a single VERTEX range
            self.ctx.device.cmd_push_constants(
                self.command_buffer,
                layout,
                vk::ShaderStageFlags::VERTEX,
                offset,
                data,
            );
        }
        Ok(())
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()> {
        self.check_in_render_pass()?;
        unsafe {
            self.ctx.device.cmd_draw(self.command_buffer, vertex_count, 1, first_vertex, 0);
        }
        Ok(())
    }
}

impl Drop for CommandList {
    fn drop(&mut self) {
        unsafe {
            // Command buffers are freed with their pool
            self.ctx.device.destroy_command_pool(self.command_pool, None);
        }
    }
}
