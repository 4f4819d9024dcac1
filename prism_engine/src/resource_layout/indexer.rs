/// Resource Layout Indexer
///
/// Maps draw instances to GPU bindings: the dynamic uniform offset of an
/// instance, the binding group of a (frame slot, material) pair, the texture
/// binding of a material texture slot, and the pipeline of a mesh.
///
/// `binding_index` is the only place the binding arena layout is computed;
/// the arena is filled and read through it.

use crate::error::{Error, Result};
use crate::graphics_device::{PipelineKind, MATERIAL_TEXTURE_BASE_BINDING, MAX_MATERIAL_TEXTURES};
use crate::scene::{MeshRecord, SceneDesc, SceneKind};

/// Scene mode, fixed at load time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneMode {
    /// One shared material: behaves as a single-material layout
    Simple,
    MultiMaterial { material_count: u32 },
}

impl SceneMode {
    pub fn from_scene(desc: &SceneDesc) -> Self {
        match desc.kind {
            SceneKind::Simple => SceneMode::Simple,
            SceneKind::MultiMaterial => SceneMode::MultiMaterial {
                material_count: desc.material_count(),
            },
        }
    }

    pub fn material_count(self) -> u32 {
        match self {
            SceneMode::Simple => 1,
            SceneMode::MultiMaterial { material_count } => material_count,
        }
    }
}

/// Round `value` up to a multiple of `alignment` (a power of two)
pub fn align_up(value: u64, alignment: u64) -> u64 {
    (value + alignment - 1) & !(alignment - 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLayoutIndexer {
    mode: SceneMode,
    frames_in_flight: u32,
    record_size: u64,
    record_stride: u64,
}

impl ResourceLayoutIndexer {
    /// Create an indexer
    ///
    /// # Arguments
    ///
    /// * `mode` - Scene mode
    /// * `frames_in_flight` - N, number of frame slots
    /// * `record_size` - Size of one per-instance uniform record
    /// * `offset_alignment` - Device `minUniformBufferOffsetAlignment`
    ///
    /// # Errors
    ///
    /// `Error::ValidationFailed` for zero frames or materials, or an alignment
    /// that is not a power of two.
    pub fn new(mode: SceneMode, frames_in_flight: u32, record_size: u64, offset_alignment: u64) -> Result<Self> {
        if frames_in_flight == 0 {
            return Err(Error::ValidationFailed("frames_in_flight must be at least 1".to_string()));
        }
        if mode.material_count() == 0 {
            return Err(Error::ValidationFailed("material count must be at least 1".to_string()));
        }
        if !offset_alignment.is_power_of_two() {
            return Err(Error::ValidationFailed(format!(
                "uniform offset alignment {} is not a power of two",
                offset_alignment
            )));
        }
        Ok(Self {
            mode,
            frames_in_flight,
            record_size,
            record_stride: align_up(record_size.max(1), offset_alignment),
        })
    }

    pub fn mode(&self) -> SceneMode {
        self.mode
    }

    pub fn frames_in_flight(&self) -> u32 {
        self.frames_in_flight
    }

    pub fn material_count(&self) -> u32 {
        self.mode.material_count()
    }

    /// Binding group index of frame slot `slot` and material `material`
    ///
    /// `slot + frames_in_flight * material`
    pub fn binding_index(&self, slot: u32, material: u32) -> Result<usize> {
        if slot >= self.frames_in_flight || material >= self.material_count() {
            return Err(Error::InvalidResource(format!(
                "binding ({}, {}) outside {} slots x {} materials",
                slot, material, self.frames_in_flight, self.material_count()
            )));
        }
        Ok((slot + self.frames_in_flight * material) as usize)
    }

    /// Total binding groups: N * M
    pub fn binding_count(&self) -> usize {
        (self.frames_in_flight * self.material_count()) as usize
    }

    /// Size of one uniform record
    pub fn record_size(&self) -> u64 {
        self.record_size
    }

    /// Distance between consecutive records (record size, aligned)
    pub fn record_stride(&self) -> u64 {
        self.record_stride
    }

    /// Dynamic uniform offset of the instance with global ordinal `ordinal`
    ///
    /// Ordinals count instances across all meshes of a frame, so the uniform
    /// region is one flat array.
    pub fn dynamic_offset(&self, ordinal: u32) -> Result<u32> {
        u32::try_from(ordinal as u64 * self.record_stride).map_err(|_| {
            Error::InvalidResource(format!("instance ordinal {} overflows the uniform offset", ordinal))
        })
    }

    /// Bytes of uniform storage one frame slot needs for `capacity` instances
    pub fn uniform_region_size(&self, capacity: u32) -> u64 {
        capacity as u64 * self.record_stride
    }

    /// Binding of material texture `slot` (contiguous after the environment)
    pub fn texture_binding(&self, slot: u32) -> Result<u32> {
        if slot >= MAX_MATERIAL_TEXTURES {
            return Err(Error::ValidationFailed(format!(
                "material texture slot {} exceeds maximum {}",
                slot, MAX_MATERIAL_TEXTURES
            )));
        }
        Ok(MATERIAL_TEXTURE_BASE_BINDING + slot)
    }

    /// Pipeline drawing every instance of `mesh`
    pub fn pipeline_for(&self, mesh: &MeshRecord) -> PipelineKind {
        match self.mode {
            SceneMode::Simple => PipelineKind::Basic,
            SceneMode::MultiMaterial { .. } => mesh.pipeline,
        }
    }

    /// Material whose binding group draws `mesh`
    pub fn material_for(&self, mesh: &MeshRecord) -> u32 {
        match self.mode {
            SceneMode::Simple => 0,
            SceneMode::MultiMaterial { .. } => mesh.material,
        }
    }
}

#[cfg(test)]
#[path = "indexer_tests.rs"]
mod tests;
