/// ShaderSet - SPIR-V programs per pipeline kind
///
/// Shader compilation happens offline; this only loads the compiled words.

use prism_engine::prism::{Error, Result};
use prism_engine::prism::graphics_device::PipelineKind;
use prism_engine::engine_debug;
use rustc_hash::FxHashMap;
use std::io::Cursor;
use std::path::Path;

/// Vertex + fragment SPIR-V for one pipeline
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    pub vertex: Vec<u32>,
    pub fragment: Vec<u32>,
}

/// Compiled programs keyed by pipeline kind
#[derive(Debug, Clone, Default)]
pub struct ShaderSet {
    programs: FxHashMap<PipelineKind, ShaderProgram>,
}

/// Decode SPIR-V bytes (magic number, endianness, 4-byte alignment)
pub fn parse_spirv(bytes: &[u8]) -> Result<Vec<u32>> {
    ash::util::read_spv(&mut Cursor::new(bytes))
        .map_err(|e| Error::ValidationFailed(format!("invalid SPIR-V: {}", e)))
}

impl ShaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the program for `kind` from raw SPIR-V bytes
    pub fn insert_spirv(&mut self, kind: PipelineKind, vertex: &[u8], fragment: &[u8]) -> Result<()> {
        let program = ShaderProgram {
            vertex: parse_spirv(vertex)
                .map_err(|e| Error::ValidationFailed(format!("{} vertex shader: {}", kind, e)))?,
            fragment: parse_spirv(fragment)
                .map_err(|e| Error::ValidationFailed(format!("{} fragment shader: {}", kind, e)))?,
        };
        self.programs.insert(kind, program);
        Ok(())
    }

    /// Load `<kind>.vert.spv` / `<kind>.frag.spv` for every kind present in `dir`
    ///
    /// Kinds without both files are skipped; requesting their pipeline later
    /// fails with `InvalidResource`.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut set = Self::new();
        for kind in PipelineKind::ALL {
            let vertex_path = dir.join(format!("{}.vert.spv", kind));
            let fragment_path = dir.join(format!("{}.frag.spv", kind));
            if !vertex_path.is_file() || !fragment_path.is_file() {
                engine_debug!("prism::vulkan", "No shaders for '{}' in {}", kind, dir.display());
                continue;
            }
            let read = |path: &Path| {
                std::fs::read(path).map_err(|e| {
                    Error::InitializationFailed(format!("cannot read {}: {}", path.display(), e))
                })
            };
            set.insert_spirv(kind, &read(&vertex_path)?, &read(&fragment_path)?)?;
        }
        Ok(set)
    }

    pub fn get(&self, kind: PipelineKind) -> Option<&ShaderProgram> {
        self.programs.get(&kind)
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Programs in `PipelineKind::ALL` order
    pub fn iter(&self) -> impl Iterator<Item = (PipelineKind, &ShaderProgram)> {
        PipelineKind::ALL
            .into_iter()
            .filter_map(move |kind| self.programs.get(&kind).map(|program| (kind, program)))
    }
}
