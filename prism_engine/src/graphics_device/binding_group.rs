/// Binding group trait and resource descriptions
///
/// Every binding group shares one layout:
///
/// | binding | content |
/// |---|---|
/// | 0 | dynamic uniform buffer (one `InstanceUniform` per instance) |
/// | 1 | environment cube texture |
/// | 2.. | material textures, in declared order |

use crate::graphics_device::{Buffer, Texture};

/// Binding of the dynamic uniform buffer
pub const UNIFORM_BINDING: u32 = 0;

/// Binding of the shared environment texture
pub const ENVIRONMENT_BINDING: u32 = 1;

/// First binding of material textures
pub const MATERIAL_TEXTURE_BASE_BINDING: u32 = 2;

/// Maximum textures a single material may declare
pub const MAX_MATERIAL_TEXTURES: u32 = 6;

/// Number of sampled-texture bindings in the layout (environment + material)
pub const TEXTURE_BINDING_COUNT: u32 = 1 + MAX_MATERIAL_TEXTURES;

/// A bound group of GPU resource references (a descriptor set)
pub trait BindingGroup: Send + Sync {}

/// Resource written into one binding
pub enum BindingResource<'a> {
    /// Uniform buffer bound with a dynamic offset; `range` is one record
    DynamicUniform { buffer: &'a dyn Buffer, range: u64 },
    /// Combined image/sampler
    SampledTexture(&'a dyn Texture),
}

/// One binding slot and its resource
pub struct BindingEntry<'a> {
    pub binding: u32,
    pub resource: BindingResource<'a>,
}
