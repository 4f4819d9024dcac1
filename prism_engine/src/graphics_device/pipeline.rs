/// Pipeline trait, pipeline selection and vertex layout descriptions

use std::fmt;
use crate::error::{Error, Result};
use crate::graphics_device::BufferFormat;

/// Graphics pipeline resource
///
/// Pipelines are pre-built by the backend, one per `PipelineKind`, and share
/// one binding group layout.
pub trait Pipeline: Send + Sync {
    fn kind(&self) -> PipelineKind;
}

/// Closed set of shading pipelines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineKind {
    /// Shared pipeline of simple-mode scenes (basic vertex layout)
    Basic,
    /// Environment cube drawn behind the scene
    Skybox,
    /// Shading id 0
    PhysicallyBased,
    /// Shading id 1
    SimpleDiffuse,
    /// Shading id 2
    Reflective,
}

impl PipelineKind {
    /// Every pipeline a backend builds
    pub const ALL: [PipelineKind; 5] = [
        PipelineKind::Basic,
        PipelineKind::Skybox,
        PipelineKind::PhysicallyBased,
        PipelineKind::SimpleDiffuse,
        PipelineKind::Reflective,
    ];

    /// Map a per-mesh shading id from scene data
    ///
    /// # Errors
    ///
    /// `Error::ValidationFailed` for any id outside 0..=2.
    pub fn from_shading_id(id: u32) -> Result<Self> {
        match id {
            0 => Ok(PipelineKind::PhysicallyBased),
            1 => Ok(PipelineKind::SimpleDiffuse),
            2 => Ok(PipelineKind::Reflective),
            _ => Err(Error::ValidationFailed(format!("unknown pipeline id {}", id))),
        }
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineKind::Basic => "basic",
            PipelineKind::Skybox => "skybox",
            PipelineKind::PhysicallyBased => "pbr",
            PipelineKind::SimpleDiffuse => "lambertian",
            PipelineKind::Reflective => "mirror",
        };
        f.write_str(name)
    }
}

/// Vertex attribute description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Shader location
    pub location: u32,
    pub format: BufferFormat,
    /// Byte offset within one vertex
    pub offset: u32,
}

/// Vertex layout: one interleaved binding at index 0, per-vertex rate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLayout {
    pub stride: u32,
    pub attributes: Vec<VertexAttribute>,
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
