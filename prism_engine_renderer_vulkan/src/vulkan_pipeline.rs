/// Pipeline - Vulkan implementation of graphics_device::Pipeline trait
///
/// One graphics pipeline per `PipelineKind`, all sharing the binding group
/// set layout and a single vertex-stage push constant range. Mesh pipelines
/// take their vertex input dynamically; the skybox has none.

use prism_engine::prism::Result;
use prism_engine::prism::frame::PushConstants;
use prism_engine::prism::graphics_device::{Pipeline as GraphicsDevicePipeline, PipelineKind};
use prism_engine::engine_err;
use ash::vk;
use std::ffi::CStr;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

const ENTRY_POINT: &CStr = c"main";

/// Fixed-function state that differs between pipeline kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PipelineState {
    pub depth_write: bool,
    pub depth_compare: vk::CompareOp,
    pub cull_mode: vk::CullModeFlags,
    pub dynamic_vertex_input: bool,
}

impl PipelineState {
    pub(crate) fn for_kind(kind: PipelineKind) -> Self {
        match kind {
            // Drawn at the far plane behind everything, seen from inside
            PipelineKind::Skybox => Self {
                depth_write: false,
                depth_compare: vk::CompareOp::LESS_OR_EQUAL,
                cull_mode: vk::CullModeFlags::NONE,
                dynamic_vertex_input: false,
            },
            PipelineKind::Basic
            | PipelineKind::PhysicallyBased
            | PipelineKind::SimpleDiffuse
            | PipelineKind::Reflective => Self {
                depth_write: true,
                depth_compare: vk::CompareOp::LESS,
                cull_mode: vk::CullModeFlags::BACK,
                dynamic_vertex_input: true,
            },
        }
    }

    pub(crate) fn dynamic_states(&self) -> Vec<vk::DynamicState> {
        let mut states = vec![vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        if self.dynamic_vertex_input {
            states.push(vk::DynamicState::VERTEX_INPUT_EXT);
        }
        states
    }
}

/// Vulkan pipeline implementation
pub struct Pipeline {
    ctx: Arc<GpuContext>,
    kind: PipelineKind,
    pub(crate) pipeline: vk::Pipeline,
    pub(crate) layout: vk::PipelineLayout,
}

impl Pipeline {
    /// Build the pipeline for `kind` from SPIR-V words against `render_pass`
    pub(crate) fn create(
        ctx: Arc<GpuContext>,
        kind: PipelineKind,
        vertex_spirv: &[u32],
        fragment_spirv: &[u32],
        set_layout: vk::DescriptorSetLayout,
        render_pass: vk::RenderPass,
    ) -> Result<Self> {
        let state = PipelineState::for_kind(kind);

        unsafe {
            let vertex_module = create_shader_module(&ctx, kind, "vertex", vertex_spirv)?;
            let fragment_module = match create_shader_module(&ctx, kind, "fragment", fragment_spirv) {
                Ok(module) => module,
                Err(e) => {
                    ctx.device.destroy_shader_module(vertex_module, None);
                    return Err(e);
                }
            };

            let result = build_pipeline(&ctx, kind, &state, vertex_module, fragment_module, set_layout, render_pass);

            // Modules are only needed during creation
            ctx.device.destroy_shader_module(vertex_module, None);
            ctx.device.destroy_shader_module(fragment_module, None);

            let (pipeline, layout) = result?;
            Ok(Self { ctx, kind, pipeline, layout })
        }
    }
}

unsafe fn create_shader_module(
    ctx: &GpuContext,
    kind: PipelineKind,
    stage: &str,
    code: &[u32],
) -> Result<vk::ShaderModule> {
    let create_info = vk::ShaderModuleCreateInfo::default().code(code);
    ctx.device.create_shader_module(&create_info, None)
        .map_err(|e| engine_err!("prism::vulkan", "Failed to create {} {} shader module: {:?}", kind, stage, e))
}

unsafe fn build_pipeline(
    ctx: &GpuContext,
    kind: PipelineKind,
    state: &PipelineState,
    vertex_module: vk::ShaderModule,
    fragment_module: vk::ShaderModule,
    set_layout: vk::DescriptorSetLayout,
    render_pass: vk::RenderPass,
) -> Result<(vk::Pipeline, vk::PipelineLayout)> {
    let shader_stages = [
        vk::PipelineShaderStageCreateInfo::default()
            .stage(vk::ShaderStageFlags::VERTEX)
            .module(vertex_module)
            .name(ENTRY_POINT),
        vk::PipelineShaderStageCreateInfo::default()
            .stage(vk::ShaderStageFlags::FRAGMENT)
            .module(fragment_module)
            .name(ENTRY_POINT),
    ];

    // Ignored when vertex input is dynamic; empty for the skybox
    let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default();

    let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
        .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
        .primitive_restart_enable(false);

    // Viewport state (dynamic)
    let viewports = [vk::Viewport::default()];
    let scissors = [vk::Rect2D::default()];
    let viewport_state = vk::PipelineViewportStateCreateInfo::default()
        .viewports(&viewports)
        .scissors(&scissors);

    let rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
        .depth_clamp_enable(false)
        .rasterizer_discard_enable(false)
        .polygon_mode(vk::PolygonMode::FILL)
        .line_width(1.0)
        .cull_mode(state.cull_mode)
        .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
        .depth_bias_enable(false);

    let depth_stencil_state = vk::PipelineDepthStencilStateCreateInfo::default()
        .depth_test_enable(true)
        .depth_write_enable(state.depth_write)
        .depth_compare_op(state.depth_compare)
        .depth_bounds_test_enable(false)
        .stencil_test_enable(false);

    let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
        .sample_shading_enable(false)
        .rasterization_samples(vk::SampleCountFlags::TYPE_1);

    let color_blend_attachment = vk::PipelineColorBlendAttachmentState::default()
        .color_write_mask(vk::ColorComponentFlags::RGBA)
        .blend_enable(false);

    let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default()
        .logic_op_enable(false)
        .attachments(std::slice::from_ref(&color_blend_attachment));

    let dynamic_states = state.dynamic_states();
    let dynamic_state = vk::PipelineDynamicStateCreateInfo::default()
        .dynamic_states(&dynamic_states);

    let push_constant_ranges = [vk::PushConstantRange {
        stage_flags: vk::ShaderStageFlags::VERTEX,
        offset: 0,
        size: PushConstants::SIZE,
    }];
    let set_layouts = [set_layout];
    let layout_create_info = vk::PipelineLayoutCreateInfo::default()
        .set_layouts(&set_layouts)
        .push_constant_ranges(&push_constant_ranges);

    let layout = ctx.device.create_pipeline_layout(&layout_create_info, None)
        .map_err(|e| engine_err!("prism::vulkan", "Failed to create {} pipeline layout: {:?}", kind, e))?;

    let pipeline_create_info = vk::GraphicsPipelineCreateInfo::default()
        .stages(&shader_stages)
        .vertex_input_state(&vertex_input_state)
        .input_assembly_state(&input_assembly_state)
        .viewport_state(&viewport_state)
        .rasterization_state(&rasterization_state)
        .depth_stencil_state(&depth_stencil_state)
        .multisample_state(&multisample_state)
        .color_blend_state(&color_blend_state)
        .dynamic_state(&dynamic_state)
        .layout(layout)
        .render_pass(render_pass)
        .subpass(0);

    match ctx.device.create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_create_info], None) {
        Ok(pipelines) => Ok((pipelines[0], layout)),
        Err((_, e)) => {
            ctx.device.destroy_pipeline_layout(layout, None);
            Err(engine_err!("prism::vulkan", "Failed to create {} graphics pipeline: {:?}", kind, e))
        }
    }
}

impl GraphicsDevicePipeline for Pipeline {
    fn kind(&self) -> PipelineKind {
        self.kind
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_pipeline(self.pipeline, None);
            self.ctx.device.destroy_pipeline_layout(self.layout, None);
        }
    }
}
