/// Vertex layout descriptions supplied with scene data, and their validation
///
/// Two layouts exist:
///
/// | location | basic | extended |
/// |---|---|---|
/// | 0 | position `R32G32B32_SFLOAT` | position `R32G32B32_SFLOAT` |
/// | 1 | normal `R32G32B32_SFLOAT` | normal `R32G32B32_SFLOAT` |
/// | 2 | color `R8G8B8A8_UNORM` | tangent `R32G32B32A32_SFLOAT` |
/// | 3 | | texcoord `R32G32_SFLOAT` |
/// | 4 | | color `R8G8B8A8_UNORM` |

use crate::error::{Error, Result};
use crate::graphics_device::{BufferFormat, VertexAttribute, VertexLayout};

/// Which attribute set a scene's meshes use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexLayoutKind {
    /// Position, normal, packed color
    Basic,
    /// Position, normal, tangent, texcoord, packed color
    Extended,
}

/// One attribute as described by scene data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDesc {
    /// Byte offset within one vertex
    pub offset: u32,
    /// Format name, e.g. `"R32G32B32_SFLOAT"`
    pub format: String,
}

impl AttributeDesc {
    pub fn new(offset: u32, format: &str) -> Self {
        Self { offset, format: format.to_string() }
    }
}

/// Per-mesh vertex layout description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLayoutDesc {
    pub stride: u32,
    pub position: AttributeDesc,
    pub normal: AttributeDesc,
    pub color: AttributeDesc,
    /// Required by the extended layout, ignored by the basic one
    pub tangent: Option<AttributeDesc>,
    /// Required by the extended layout, ignored by the basic one
    pub texcoord: Option<AttributeDesc>,
}

impl VertexLayoutDesc {
    /// Validate against `kind` and produce the layout a command list applies
    ///
    /// # Errors
    ///
    /// `Error::ValidationFailed` for an unknown format string, a format that
    /// does not match the attribute, an attribute extending past the stride,
    /// or a missing extended attribute.
    pub fn resolve(&self, kind: VertexLayoutKind) -> Result<VertexLayout> {
        if self.stride == 0 {
            return Err(Error::ValidationFailed("vertex stride is zero".to_string()));
        }

        let mut attributes = vec![
            self.attribute("position", &self.position, 0, BufferFormat::R32G32B32_SFLOAT)?,
            self.attribute("normal", &self.normal, 1, BufferFormat::R32G32B32_SFLOAT)?,
        ];

        match kind {
            VertexLayoutKind::Basic => {
                attributes.push(self.attribute("color", &self.color, 2, BufferFormat::R8G8B8A8_UNORM)?);
            }
            VertexLayoutKind::Extended => {
                let tangent = required("tangent", &self.tangent)?;
                let texcoord = required("texcoord", &self.texcoord)?;
                attributes.push(self.attribute("tangent", tangent, 2, BufferFormat::R32G32B32A32_SFLOAT)?);
                attributes.push(self.attribute("texcoord", texcoord, 3, BufferFormat::R32G32_SFLOAT)?);
                attributes.push(self.attribute("color", &self.color, 4, BufferFormat::R8G8B8A8_UNORM)?);
            }
        }

        Ok(VertexLayout { stride: self.stride, attributes })
    }

    fn attribute(
        &self,
        name: &str,
        desc: &AttributeDesc,
        location: u32,
        expected: BufferFormat,
    ) -> Result<VertexAttribute> {
        let format: BufferFormat = desc.format.parse()?;
        if format != expected {
            return Err(Error::ValidationFailed(format!(
                "{} format must be {}, got {}",
                name, expected, format
            )));
        }
        if desc.offset as u64 + format.size() as u64 > self.stride as u64 {
            return Err(Error::ValidationFailed(format!(
                "{} at offset {} ({} bytes) exceeds stride {}",
                name, desc.offset, format.size(), self.stride
            )));
        }
        Ok(VertexAttribute { location, format, offset: desc.offset })
    }
}

fn required<'a>(name: &str, desc: &'a Option<AttributeDesc>) -> Result<&'a AttributeDesc> {
    desc.as_ref().ok_or_else(|| {
        Error::ValidationFailed(format!("extended vertex layout requires a {} attribute", name))
    })
}

#[cfg(test)]
#[path = "vertex_layout_tests.rs"]
mod tests;
