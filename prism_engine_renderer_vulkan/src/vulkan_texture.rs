/// Texture - Vulkan implementation of graphics_device::Texture trait
///
/// Textures are uploaded once through a staging buffer and then stay in
/// `SHADER_READ_ONLY_OPTIMAL`. Cube textures carry six layers and a cube view.

use prism_engine::prism::{Error, Result};
use prism_engine::prism::graphics_device::{Texture as GraphicsDeviceTexture, TextureDesc, TextureInfo, TextureKind};
use prism_engine::{engine_err, engine_error};
use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// Sampled texture format; pixel data is decoded RGBA8
pub(crate) const TEXTURE_FORMAT: vk::Format = vk::Format::R8G8B8A8_UNORM;

/// Vulkan texture implementation
pub struct Texture {
    ctx: Arc<GpuContext>,
    pub(crate) image: vk::Image,
    pub(crate) view: vk::ImageView,
    allocation: Option<Allocation>,
    /// Read-only texture properties
    info: TextureInfo,
}

/// Image view type and creation flags for a texture kind
pub(crate) fn image_kind_to_vk(kind: TextureKind) -> (vk::ImageViewType, vk::ImageCreateFlags) {
    match kind {
        TextureKind::Flat => (vk::ImageViewType::TYPE_2D, vk::ImageCreateFlags::empty()),
        TextureKind::Cube => (vk::ImageViewType::CUBE, vk::ImageCreateFlags::CUBE_COMPATIBLE),
    }
}

impl Texture {
    /// Create the image, upload `desc.pixels` and build the view
    pub(crate) fn upload(ctx: Arc<GpuContext>, desc: &TextureDesc) -> Result<Self> {
        desc.validate()?;

        let layers = desc.kind.layer_count();
        let (view_type, create_flags) = image_kind_to_vk(desc.kind);
        let subresource_range = vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: layers,
        };

        unsafe {
            let image_create_info = vk::ImageCreateInfo::default()
                .flags(create_flags)
                .image_type(vk::ImageType::TYPE_2D)
                .format(TEXTURE_FORMAT)
                .extent(vk::Extent3D { width: desc.width, height: desc.height, depth: 1 })
                .mip_levels(1)
                .array_layers(layers)
                .samples(vk::SampleCountFlags::TYPE_1)
                .tiling(vk::ImageTiling::OPTIMAL)
                .usage(vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::TRANSFER_DST)
                .sharing_mode(vk::SharingMode::EXCLUSIVE)
                .initial_layout(vk::ImageLayout::UNDEFINED);

            let image = ctx.device.create_image(&image_create_info, None)
                .map_err(|e| engine_err!("prism::vulkan", "Failed to create texture image '{}': {:?}", desc.name, e))?;

            let requirements = ctx.device.get_image_memory_requirements(image);
            let allocation = ctx.allocator().and_then(|mut allocator| {
                allocator.allocate(&AllocationCreateDesc {
                    name: &desc.name,
                    requirements,
                    location: MemoryLocation::GpuOnly,
                    linear: false,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                })
                .map_err(|_e| {
                    let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                    engine_error!("prism::vulkan", "Out of GPU memory for texture '{}' ({}x{}, {} layers, {:.2} MB)",
                        desc.name, desc.width, desc.height, layers, size_mb);
                    Error::OutOfMemory
                })
            });
            let allocation = match allocation {
                Ok(allocation) => allocation,
                Err(e) => {
                    ctx.device.destroy_image(image, None);
                    return Err(e);
                }
            };

            // From here on, Drop releases the image and its memory on any error
            let mut texture = Self {
                ctx: Arc::clone(&ctx),
                image,
                view: vk::ImageView::null(),
                allocation: None,
                info: TextureInfo { width: desc.width, height: desc.height, kind: desc.kind },
            };
            ctx.device.bind_image_memory(image, allocation.memory(), allocation.offset())
                .map_err(|e| engine_err!("prism::vulkan", "Failed to bind texture image memory: {:?}", e))?;
            texture.allocation = Some(allocation);

            let view_create_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(view_type)
                .format(TEXTURE_FORMAT)
                .components(vk::ComponentMapping {
                    r: vk::ComponentSwizzle::IDENTITY,
                    g: vk::ComponentSwizzle::IDENTITY,
                    b: vk::ComponentSwizzle::IDENTITY,
                    a: vk::ComponentSwizzle::IDENTITY,
                })
                .subresource_range(subresource_range);

            texture.view = ctx.device.create_image_view(&view_create_info, None)
                .map_err(|e| engine_err!("prism::vulkan", "Failed to create texture image view: {:?}", e))?;

            texture.copy_pixels(desc, subresource_range)?;
            Ok(texture)
        }
    }

    /// Staging copy of every layer, then transition to shader-read
    fn copy_pixels(&self, desc: &TextureDesc, range: vk::ImageSubresourceRange) -> Result<()> {
        let ctx = &self.ctx;
        let layer_size = (desc.width as u64) * (desc.height as u64) * 4;

        unsafe {
            let staging_create_info = vk::BufferCreateInfo::default()
                .size(desc.pixels.len() as u64)
                .usage(vk::BufferUsageFlags::TRANSFER_SRC)
                .sharing_mode(vk::SharingMode::EXCLUSIVE);

            let staging_buffer = ctx.device.create_buffer(&staging_create_info, None)
                .map_err(|e| engine_err!("prism::vulkan", "Failed to create staging buffer: {:?}", e))?;
            let staging_requirements = ctx.device.get_buffer_memory_requirements(staging_buffer);

            let staging = ctx.allocator().and_then(|mut allocator| {
                allocator.allocate(&AllocationCreateDesc {
                    name: "texture_staging_buffer",
                    requirements: staging_requirements,
                    location: MemoryLocation::CpuToGpu,
                    linear: true,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                })
                .map_err(|_e| {
                    engine_error!("prism::vulkan", "Out of GPU memory for texture staging buffer");
                    Error::OutOfMemory
                })
            });
            let staging = match staging {
                Ok(staging) => staging,
                Err(e) => {
                    ctx.device.destroy_buffer(staging_buffer, None);
                    return Err(e);
                }
            };

            let result = ctx.device
                .bind_buffer_memory(staging_buffer, staging.memory(), staging.offset())
                .map_err(|e| engine_err!("prism::vulkan", "Failed to bind staging buffer memory: {:?}", e))
                .and_then(|_| {
                    let mapped_ptr = staging.mapped_ptr()
                        .ok_or_else(|| engine_err!("prism::vulkan", "Staging buffer is not mapped"))?
                        .as_ptr() as *mut u8;
                    std::ptr::copy_nonoverlapping(desc.pixels.as_ptr(), mapped_ptr, desc.pixels.len());

                    let regions: Vec<vk::BufferImageCopy> = (0..range.layer_count)
                        .map(|layer| {
                            vk::BufferImageCopy::default()
                                .buffer_offset(layer as u64 * layer_size)
                                .buffer_row_length(0)
                                .buffer_image_height(0)
                                .image_subresource(vk::ImageSubresourceLayers {
                                    aspect_mask: vk::ImageAspectFlags::COLOR,
                                    mip_level: 0,
                                    base_array_layer: layer,
                                    layer_count: 1,
                                })
                                .image_offset(vk::Offset3D { x: 0, y: 0, z: 0 })
                                .image_extent(vk::Extent3D { width: desc.width, height: desc.height, depth: 1 })
                        })
                        .collect();

                    ctx.one_shot(|command_buffer| {
                        // UNDEFINED -> TRANSFER_DST_OPTIMAL
                        let to_transfer = vk::ImageMemoryBarrier::default()
                            .old_layout(vk::ImageLayout::UNDEFINED)
                            .new_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                            .image(self.image)
                            .subresource_range(range)
                            .src_access_mask(vk::AccessFlags::empty())
                            .dst_access_mask(vk::AccessFlags::TRANSFER_WRITE);

                        ctx.device.cmd_pipeline_barrier(
                            command_buffer,
                            vk::PipelineStageFlags::TOP_OF_PIPE,
                            vk::PipelineStageFlags::TRANSFER,
                            vk::DependencyFlags::empty(),
                            &[], &[], &[to_transfer],
                        );

                        ctx.device.cmd_copy_buffer_to_image(
                            command_buffer,
                            staging_buffer,
                            self.image,
                            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                            &regions,
                        );

                        // TRANSFER_DST_OPTIMAL -> SHADER_READ_ONLY_OPTIMAL
                        let to_shader = vk::ImageMemoryBarrier::default()
                            .old_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                            .new_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
                            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                            .image(self.image)
                            .subresource_range(range)
                            .src_access_mask(vk::AccessFlags::TRANSFER_WRITE)
                            .dst_access_mask(vk::AccessFlags::SHADER_READ);

                        ctx.device.cmd_pipeline_barrier(
                            command_buffer,
                            vk::PipelineStageFlags::TRANSFER,
                            vk::PipelineStageFlags::FRAGMENT_SHADER,
                            vk::DependencyFlags::empty(),
                            &[], &[], &[to_shader],
                        );
                    })
                });

            ctx.device.destroy_buffer(staging_buffer, None);
            if let Ok(mut allocator) = ctx.allocator() {
                allocator.free(staging).ok();
            }
            result
        }
    }
}

impl GraphicsDeviceTexture for Texture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        unsafe {
            if self.view != vk::ImageView::null() {
                self.ctx.device.destroy_image_view(self.view, None);
            }
            if let Some(allocation) = self.allocation.take() {
                if let Ok(mut allocator) = self.ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }
            self.ctx.device.destroy_image(self.image, None);
        }
    }
}
