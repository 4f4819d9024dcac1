/// BindingGroup - Vulkan implementation of graphics_device::BindingGroup trait
///
/// Every group uses the same set layout: a dynamic uniform buffer at binding
/// 0 and seven combined image samplers (environment + six material slots).

use prism_engine::prism::{Error, Result};
use prism_engine::prism::graphics_device::{
    BindingEntry, BindingGroup as GraphicsDeviceBindingGroup, BindingResource,
    Buffer as GraphicsDeviceBuffer, Texture as GraphicsDeviceTexture,
    ENVIRONMENT_BINDING, TEXTURE_BINDING_COUNT, UNIFORM_BINDING,
};
use prism_engine::{engine_err, engine_info};
use ash::vk;
use std::sync::{Arc, Mutex};

use crate::vulkan_buffer::Buffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_sampler::{SamplerCache, SamplerKind};
use crate::vulkan_texture::Texture;

/// Descriptor sets per pool; a new pool is added when one runs dry
const SETS_PER_POOL: u32 = 64;

/// Set layout bindings of the shared layout
pub(crate) fn set_layout_bindings() -> Vec<vk::DescriptorSetLayoutBinding<'static>> {
    let mut bindings = Vec::with_capacity(1 + TEXTURE_BINDING_COUNT as usize);
    bindings.push(
        vk::DescriptorSetLayoutBinding::default()
            .binding(UNIFORM_BINDING)
            .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER_DYNAMIC)
            .descriptor_count(1)
            .stage_flags(vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT),
    );
    for binding in ENVIRONMENT_BINDING..ENVIRONMENT_BINDING + TEXTURE_BINDING_COUNT {
        bindings.push(
            vk::DescriptorSetLayoutBinding::default()
                .binding(binding)
                .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .descriptor_count(1)
                .stage_flags(vk::ShaderStageFlags::FRAGMENT),
        );
    }
    bindings
}

/// Vulkan binding group implementation
///
/// Wraps a VkDescriptorSet, returned to its pool on drop. Immutable after
/// creation.
pub struct BindingGroup {
    allocator: Arc<BindingGroupAllocator>,
    pool: vk::DescriptorPool,
    pub(crate) descriptor_set: vk::DescriptorSet,
}

impl GraphicsDeviceBindingGroup for BindingGroup {}

impl Drop for BindingGroup {
    fn drop(&mut self) {
        // vkFreeDescriptorSets needs the pool externally synchronized
        if let Ok(_pools) = self.allocator.pools.lock() {
            unsafe {
                self.allocator.ctx.device
                    .free_descriptor_sets(self.pool, &[self.descriptor_set])
                    .ok();
            }
        }
    }
}

/// Owns the shared set layout, the descriptor pools and the samplers
pub(crate) struct BindingGroupAllocator {
    ctx: Arc<GpuContext>,
    pub(crate) set_layout: vk::DescriptorSetLayout,
    pools: Mutex<Vec<vk::DescriptorPool>>,
    samplers: Mutex<SamplerCache>,
}

impl BindingGroupAllocator {
    pub(crate) fn new(ctx: Arc<GpuContext>, max_anisotropy: f32) -> Result<Self> {
        let bindings = set_layout_bindings();
        let create_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);
        let set_layout = unsafe {
            ctx.device.create_descriptor_set_layout(&create_info, None)
                .map_err(|e| engine_err!("prism::vulkan", "Failed to create descriptor set layout: {:?}", e))?
        };

        Ok(Self {
            samplers: Mutex::new(SamplerCache::new(Arc::clone(&ctx), max_anisotropy)),
            ctx,
            set_layout,
            pools: Mutex::new(Vec::new()),
        })
    }

    fn create_pool(&self) -> Result<vk::DescriptorPool> {
        let pool_sizes = [
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::UNIFORM_BUFFER_DYNAMIC,
                descriptor_count: SETS_PER_POOL,
            },
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                descriptor_count: SETS_PER_POOL * TEXTURE_BINDING_COUNT,
            },
        ];
        let create_info = vk::DescriptorPoolCreateInfo::default()
            .flags(vk::DescriptorPoolCreateFlags::FREE_DESCRIPTOR_SET)
            .max_sets(SETS_PER_POOL)
            .pool_sizes(&pool_sizes);

        unsafe {
            self.ctx.device.create_descriptor_pool(&create_info, None)
                .map_err(|e| engine_err!("prism::vulkan", "Failed to create descriptor pool: {:?}", e))
        }
    }

    /// Allocate one set, adding a pool when every existing one is exhausted
    fn allocate_set(&self) -> Result<(vk::DescriptorPool, vk::DescriptorSet)> {
        let mut pools = self.pools.lock()
            .map_err(|_| Error::BackendError("descriptor pool lock poisoned".to_string()))?;
        let layouts = [self.set_layout];

        for &pool in pools.iter().rev() {
            let allocate_info = vk::DescriptorSetAllocateInfo::default()
                .descriptor_pool(pool)
                .set_layouts(&layouts);
            match unsafe { self.ctx.device.allocate_descriptor_sets(&allocate_info) } {
                Ok(sets) => return Ok((pool, sets[0])),
                Err(vk::Result::ERROR_OUT_OF_POOL_MEMORY) | Err(vk::Result::ERROR_FRAGMENTED_POOL) => continue,
                Err(e) => return Err(engine_err!("prism::vulkan", "Failed to allocate descriptor set: {:?}", e)),
            }
        }

        let pool = self.create_pool()?;
        pools.push(pool);
        engine_info!("prism::vulkan", "Descriptor pool #{} created ({} sets)", pools.len(), SETS_PER_POOL);

        let allocate_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(pool)
            .set_layouts(&layouts);
        let sets = unsafe {
            self.ctx.device.allocate_descriptor_sets(&allocate_info)
                .map_err(|e| engine_err!("prism::vulkan", "Failed to allocate descriptor set: {:?}", e))?
        };
        Ok((pool, sets[0]))
    }

    /// Allocate and write a binding group
    pub(crate) fn create_group(self: &Arc<Self>, entries: &[BindingEntry]) -> Result<BindingGroup> {
        for entry in entries {
            let valid = match entry.resource {
                BindingResource::DynamicUniform { .. } => entry.binding == UNIFORM_BINDING,
                BindingResource::SampledTexture(_) => {
                    (ENVIRONMENT_BINDING..ENVIRONMENT_BINDING + TEXTURE_BINDING_COUNT).contains(&entry.binding)
                }
            };
            if !valid {
                return Err(Error::InvalidResource(format!(
                    "binding {} does not accept this resource type", entry.binding
                )));
            }
        }

        let (pool, descriptor_set) = self.allocate_set()?;
        let group = BindingGroup {
            allocator: Arc::clone(self),
            pool,
            descriptor_set,
        };

        // Infos are collected first so the writes can borrow them
        let mut buffer_infos = Vec::new();
        let mut image_infos = Vec::new();
        {
            let mut samplers = self.samplers.lock()
                .map_err(|_| Error::BackendError("sampler cache lock poisoned".to_string()))?;
            for entry in entries {
                match entry.resource {
                    BindingResource::DynamicUniform { buffer, range } => {
                        let vk_buffer = unsafe {
                            &*(buffer as *const dyn GraphicsDeviceBuffer as *const Buffer)
                        };
                        buffer_infos.push((entry.binding, [vk::DescriptorBufferInfo {
                            buffer: vk_buffer.buffer,
                            offset: 0,
                            range,
                        }]));
                    }
                    BindingResource::SampledTexture(texture) => {
                        let sampler = samplers.get(SamplerKind::for_texture(texture.info().kind))?;
                        let vk_texture = unsafe {
                            &*(texture as *const dyn GraphicsDeviceTexture as *const Texture)
                        };
                        image_infos.push((entry.binding, [vk::DescriptorImageInfo {
                            sampler,
                            image_view: vk_texture.view,
                            image_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                        }]));
                    }
                }
            }
        }

        let mut writes = Vec::with_capacity(entries.len());
        for (binding, info) in &buffer_infos {
            writes.push(
                vk::WriteDescriptorSet::default()
                    .dst_set(descriptor_set)
                    .dst_binding(*binding)
                    .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER_DYNAMIC)
                    .buffer_info(info),
            );
        }
        for (binding, info) in &image_infos {
            writes.push(
                vk::WriteDescriptorSet::default()
                    .dst_set(descriptor_set)
                    .dst_binding(*binding)
                    .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                    .image_info(info),
            );
        }

        unsafe { self.ctx.device.update_descriptor_sets(&writes, &[]); }
        Ok(group)
    }
}

impl Drop for BindingGroupAllocator {
    fn drop(&mut self) {
        unsafe {
            if let Ok(pools) = self.pools.get_mut() {
                for pool in pools.drain(..) {
                    self.ctx.device.destroy_descriptor_pool(pool, None);
                }
            }
            self.ctx.device.destroy_descriptor_set_layout(self.set_layout, None);
        }
    }
}
