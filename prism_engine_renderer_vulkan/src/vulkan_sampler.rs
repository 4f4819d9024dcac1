/// SamplerCache - internal VkSampler management for the Vulkan backend
///
/// Flat material textures repeat, the environment cube clamps. Samplers are
/// created on first use and live until the device is dropped.

use prism_engine::prism::Result;
use prism_engine::prism::graphics_device::TextureKind;
use prism_engine::engine_err;
use crate::vulkan_context::GpuContext;
use ash::vk;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Sampler variants used by the shared binding layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum SamplerKind {
    LinearRepeat,
    LinearClamp,
}

impl SamplerKind {
    pub(crate) fn for_texture(kind: TextureKind) -> Self {
        match kind {
            TextureKind::Flat => SamplerKind::LinearRepeat,
            TextureKind::Cube => SamplerKind::LinearClamp,
        }
    }
}

/// Internal sampler cache - creates VkSampler on first use, destroys on drop
pub(crate) struct SamplerCache {
    ctx: Arc<GpuContext>,
    cache: FxHashMap<SamplerKind, vk::Sampler>,
    max_anisotropy: f32,
}

impl SamplerCache {
    pub(crate) fn new(ctx: Arc<GpuContext>, max_anisotropy: f32) -> Self {
        Self {
            ctx,
            cache: FxHashMap::default(),
            max_anisotropy,
        }
    }

    /// Get or create the sampler for `kind`
    pub(crate) fn get(&mut self, kind: SamplerKind) -> Result<vk::Sampler> {
        if let Some(&sampler) = self.cache.get(&kind) {
            return Ok(sampler);
        }
        let sampler = self.create_vk_sampler(kind)?;
        self.cache.insert(kind, sampler);
        Ok(sampler)
    }

    fn create_vk_sampler(&self, kind: SamplerKind) -> Result<vk::Sampler> {
        let address = match kind {
            SamplerKind::LinearRepeat => vk::SamplerAddressMode::REPEAT,
            SamplerKind::LinearClamp => vk::SamplerAddressMode::CLAMP_TO_EDGE,
        };

        let create_info = vk::SamplerCreateInfo::default()
            .mag_filter(vk::Filter::LINEAR)
            .min_filter(vk::Filter::LINEAR)
            .mipmap_mode(vk::SamplerMipmapMode::LINEAR)
            .address_mode_u(address)
            .address_mode_v(address)
            .address_mode_w(address)
            .mip_lod_bias(0.0)
            .min_lod(0.0)
            .max_lod(vk::LOD_CLAMP_NONE)
            .border_color(vk::BorderColor::FLOAT_OPAQUE_BLACK)
            .compare_enable(false)
            .compare_op(vk::CompareOp::ALWAYS)
            .anisotropy_enable(self.max_anisotropy > 1.0)
            .max_anisotropy(self.max_anisotropy.max(1.0))
            .unnormalized_coordinates(false);

        unsafe {
            self.ctx.device.create_sampler(&create_info, None)
                .map_err(|e| engine_err!("prism::vulkan", "Failed to create {:?} sampler: {:?}", kind, e))
        }
    }
}

impl Drop for SamplerCache {
    fn drop(&mut self) {
        for (_, sampler) in self.cache.drain() {
            unsafe { self.ctx.device.destroy_sampler(sampler, None); }
        }
    }
}
