/// Scene description supplied at load time, and the per-frame instance type

use glam::Mat4;
use crate::error::{Error, Result};
use crate::graphics_device::{PipelineKind, TextureDesc, TextureKind, MAX_MATERIAL_TEXTURES};
use crate::scene::{Aabb, CullingFrustum, VertexLayoutDesc, VertexLayoutKind};

/// Scene topology, fixed for the scene's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneKind {
    /// One shared material and pipeline, basic vertex layout
    Simple,
    /// Per-mesh materials and shading pipelines, extended vertex layout
    MultiMaterial,
}

impl SceneKind {
    pub fn vertex_layout_kind(self) -> VertexLayoutKind {
        match self {
            SceneKind::Simple => VertexLayoutKind::Basic,
            SceneKind::MultiMaterial => VertexLayoutKind::Extended,
        }
    }
}

/// One mesh as delivered by the asset layer
#[derive(Debug, Clone)]
pub struct MeshDesc {
    /// Debug name
    pub name: String,
    /// Interleaved vertex bytes
    pub vertex_data: Vec<u8>,
    pub vertex_count: u32,
    pub layout: VertexLayoutDesc,
    /// Index into `SceneDesc::materials` (multi-material scenes)
    pub material: u32,
    /// Shading pipeline id (multi-material scenes): 0 pbr, 1 lambertian, 2 mirror
    pub shading_id: u32,
    /// Inward bias applied to the bounding box (0 for none)
    pub aabb_bias: f32,
}

/// A material: textures bound contiguously after the shared environment
#[derive(Debug, Clone, Default)]
pub struct MaterialDesc {
    pub name: String,
    pub textures: Vec<TextureDesc>,
}

/// Everything `FrameRenderer::load_scene` needs
#[derive(Debug, Clone)]
pub struct SceneDesc {
    pub kind: SceneKind,
    pub meshes: Vec<MeshDesc>,
    /// Simple scenes use at most the first material
    pub materials: Vec<MaterialDesc>,
    /// Environment cube; enables the skybox pass
    pub environment: Option<TextureDesc>,
    pub frustum: CullingFrustum,
    /// Largest number of instances submitted in one frame
    pub max_instances: u32,
}

impl SceneDesc {
    /// Number of materials the binding arena is laid out for
    pub fn material_count(&self) -> u32 {
        match self.kind {
            SceneKind::Simple => 1,
            SceneKind::MultiMaterial => self.materials.len() as u32,
        }
    }

    /// Check the cross references between meshes and materials
    ///
    /// # Errors
    ///
    /// `Error::ValidationFailed` for a zero instance capacity, an invalid
    /// culling frustum, a material with too many textures or a malformed
    /// texture, an environment that is not a well-formed cube, a
    /// multi-material scene without materials, a mesh whose material index
    /// does not resolve, an unknown shading id, or a mesh whose layout or
    /// vertex data is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.max_instances == 0 {
            return Err(Error::ValidationFailed("max_instances must be at least 1".to_string()));
        }
        let f = &self.frustum;
        CullingFrustum::new(f.half_width, f.half_height, f.near, f.far)?;
        if self.kind == SceneKind::Simple && self.materials.len() > 1 {
            return Err(Error::ValidationFailed(format!(
                "simple scene declares {} materials, at most 1 allowed",
                self.materials.len()
            )));
        }
        for material in &self.materials {
            if material.textures.len() > MAX_MATERIAL_TEXTURES as usize {
                return Err(Error::ValidationFailed(format!(
                    "material '{}' declares {} textures, maximum is {}",
                    material.name, material.textures.len(), MAX_MATERIAL_TEXTURES
                )));
            }
            for texture in &material.textures {
                texture.validate()?;
            }
        }
        if let Some(env) = &self.environment {
            if env.kind != TextureKind::Cube {
                return Err(Error::ValidationFailed(format!(
                    "environment texture '{}' must be a cube",
                    env.name
                )));
            }
            env.validate()?;
        }
        if self.kind == SceneKind::MultiMaterial {
            if self.materials.is_empty() {
                return Err(Error::ValidationFailed(
                    "multi-material scene declares no materials".to_string(),
                ));
            }
            for mesh in &self.meshes {
                if mesh.material as usize >= self.materials.len() {
                    return Err(Error::ValidationFailed(format!(
                        "mesh '{}' references material {} of {}",
                        mesh.name, mesh.material, self.materials.len()
                    )));
                }
                PipelineKind::from_shading_id(mesh.shading_id)?;
            }
        }
        for mesh in &self.meshes {
            mesh.layout.resolve(self.kind.vertex_layout_kind())?;
            Aabb::from_vertices(&mesh.vertex_data, mesh.layout.stride, mesh.layout.position.offset, mesh.vertex_count)?;
        }
        Ok(())
    }
}

/// One object to draw this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneInstance {
    /// Index into the loaded scene's meshes
    pub mesh_index: usize,
    /// Object-to-world transform
    pub transform: Mat4,
}

impl SceneInstance {
    pub fn new(mesh_index: usize, transform: Mat4) -> Self {
        Self { mesh_index, transform }
    }
}
