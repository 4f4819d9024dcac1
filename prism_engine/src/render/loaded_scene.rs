/// GPU-side state of a loaded scene

use rustc_hash::FxHashMap;
use std::sync::Arc;
use crate::engine_info;
use crate::error::{Error, Result};
use crate::frame::InstanceUniform;
use crate::graphics_device::{
    BindingEntry, BindingResource, Buffer, BufferDesc, BufferUsage, GraphicsDevice, Pipeline,
    PipelineKind, Texture, TextureDesc, TextureKind, ENVIRONMENT_BINDING, MAX_MATERIAL_TEXTURES,
    UNIFORM_BINDING,
};
use crate::resource_layout::{BindingArena, ResourceLayoutIndexer, SceneMode};
use crate::scene::{CullingFrustum, MeshRecord, SceneDesc};

const SOURCE: &str = "prism::Scene";

pub struct LoadedScene {
    pub indexer: ResourceLayoutIndexer,
    pub meshes: Vec<MeshRecord>,
    pub arena: BindingArena,
    pub pipelines: FxHashMap<PipelineKind, Arc<dyn Pipeline>>,
    /// One instance-record region per frame slot
    pub uniform_buffers: Vec<Arc<dyn Buffer>>,
    /// Material textures, by material then texture slot
    pub material_textures: Vec<Vec<Arc<dyn Texture>>>,
    pub environment: Arc<dyn Texture>,
    pub fallback: Arc<dyn Texture>,
    /// An environment cube was supplied
    pub has_skybox: bool,
    pub frustum: CullingFrustum,
    pub max_instances: u32,
}

impl LoadedScene {
    /// Validate `desc` and create every GPU resource the scene needs
    ///
    /// Validation completes before the first allocation.
    pub fn load(device: &dyn GraphicsDevice, desc: SceneDesc, frames_in_flight: u32) -> Result<Self> {
        desc.validate()?;

        let limits = device.limits();
        let indexer = ResourceLayoutIndexer::new(
            SceneMode::from_scene(&desc),
            frames_in_flight,
            InstanceUniform::SIZE,
            limits.min_uniform_buffer_offset_alignment,
        )?;
        if indexer.record_size() > limits.max_uniform_buffer_range {
            return Err(Error::ValidationFailed(format!(
                "uniform record of {} bytes exceeds device range {}",
                indexer.record_size(),
                limits.max_uniform_buffer_range
            )));
        }

        let meshes = desc
            .meshes
            .iter()
            .map(|mesh| MeshRecord::load(device, mesh, desc.kind))
            .collect::<Result<Vec<_>>>()?;

        let uniform_buffers = (0..frames_in_flight)
            .map(|slot| {
                device.create_buffer(BufferDesc {
                    size: indexer.uniform_region_size(desc.max_instances),
                    usage: BufferUsage::Uniform,
                    name: format!("instance_uniforms_{}", slot),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let fallback = device.create_texture(TextureDesc::solid("fallback_white", TextureKind::Flat, [255; 4]))?;
        let has_skybox = desc.environment.is_some();
        let environment = match desc.environment {
            Some(env) => device.create_texture(env)?,
            None => device.create_texture(TextureDesc::solid("fallback_environment", TextureKind::Cube, [0, 0, 0, 255]))?,
        };

        let material_textures = desc
            .materials
            .into_iter()
            .map(|material| {
                material
                    .textures
                    .into_iter()
                    .map(|texture| device.create_texture(texture))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        let arena = BindingArena::build(indexer, |slot, material| {
            let uniform = &uniform_buffers[slot as usize];
            let textures = material_textures.get(material as usize);

            let mut entries = Vec::with_capacity(2 + MAX_MATERIAL_TEXTURES as usize);
            entries.push(BindingEntry {
                binding: UNIFORM_BINDING,
                resource: BindingResource::DynamicUniform {
                    buffer: uniform.as_ref(),
                    range: indexer.record_size(),
                },
            });
            entries.push(BindingEntry {
                binding: ENVIRONMENT_BINDING,
                resource: BindingResource::SampledTexture(environment.as_ref()),
            });
            for texture_slot in 0..MAX_MATERIAL_TEXTURES {
                let texture = textures
                    .and_then(|t| t.get(texture_slot as usize))
                    .unwrap_or(&fallback);
                entries.push(BindingEntry {
                    binding: indexer.texture_binding(texture_slot)?,
                    resource: BindingResource::SampledTexture(texture.as_ref()),
                });
            }

            device.create_binding_group(&entries)
        })?;

        let mut pipelines = FxHashMap::default();
        let kinds = meshes
            .iter()
            .map(|mesh| indexer.pipeline_for(mesh))
            .chain(has_skybox.then_some(PipelineKind::Skybox));
        for kind in kinds {
            if !pipelines.contains_key(&kind) {
                pipelines.insert(kind, device.pipeline(kind)?);
            }
        }

        engine_info!(
            SOURCE,
            "Loaded scene: {} meshes, {} materials, {} binding groups{}",
            meshes.len(),
            indexer.material_count(),
            arena.len(),
            if has_skybox { ", skybox" } else { "" }
        );

        Ok(Self {
            indexer,
            meshes,
            arena,
            pipelines,
            uniform_buffers,
            material_textures,
            environment,
            fallback,
            has_skybox,
            frustum: desc.frustum,
            max_instances: desc.max_instances,
        })
    }

    /// Pipeline of `kind`, loaded with the scene
    pub fn pipeline(&self, kind: PipelineKind) -> Result<&Arc<dyn Pipeline>> {
        self.pipelines
            .get(&kind)
            .ok_or_else(|| Error::InvalidResource(format!("pipeline '{}' not loaded", kind)))
    }
}
