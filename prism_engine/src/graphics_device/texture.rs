/// Texture trait and descriptors

use crate::error::{Error, Result};

/// GPU texture resource, sampled by shading pipelines
pub trait Texture: Send + Sync {
    fn info(&self) -> &TextureInfo;
}

/// Texture dimensionality
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    /// Single 2D image
    Flat,
    /// Six square faces (+X, -X, +Y, -Y, +Z, -Z), used for the environment map
    Cube,
}

impl TextureKind {
    pub fn layer_count(self) -> u32 {
        match self {
            TextureKind::Flat => 1,
            TextureKind::Cube => 6,
        }
    }
}

/// Read-only texture properties
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInfo {
    pub width: u32,
    pub height: u32,
    pub kind: TextureKind,
}

/// Texture descriptor
///
/// `pixels` holds already-decoded RGBA8 data, layers packed back to back.
#[derive(Debug, Clone)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub kind: TextureKind,
    pub pixels: Vec<u8>,
    /// Debug name
    pub name: String,
}

impl TextureDesc {
    /// Expected length of `pixels` in bytes
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 4 * self.kind.layer_count() as usize
    }

    /// Check the extent and pixel payload before any upload
    ///
    /// # Errors
    ///
    /// `Error::ValidationFailed` for a zero extent, a pixel buffer whose
    /// length differs from `expected_len()`, or a cube with non-square faces.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::ValidationFailed(format!(
                "texture '{}' has zero extent ({}x{})",
                self.name, self.width, self.height
            )));
        }
        if self.pixels.len() != self.expected_len() {
            return Err(Error::ValidationFailed(format!(
                "texture '{}' has {} bytes of pixels, expected {}",
                self.name, self.pixels.len(), self.expected_len()
            )));
        }
        if self.kind == TextureKind::Cube && self.width != self.height {
            return Err(Error::ValidationFailed(format!(
                "cube texture '{}' faces are not square ({}x{})",
                self.name, self.width, self.height
            )));
        }
        Ok(())
    }

    /// 1x1 texture filled with one RGBA color (every face for cubes)
    pub fn solid(name: &str, kind: TextureKind, rgba: [u8; 4]) -> Self {
        let pixels = rgba.repeat(kind.layer_count() as usize);
        Self {
            width: 1,
            height: 1,
            kind,
            pixels,
            name: name.to_string(),
        }
    }
}
