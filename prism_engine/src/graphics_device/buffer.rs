/// Buffer trait and vertex attribute formats

use std::fmt;
use std::str::FromStr;
use crate::error::{Error, Result};

/// GPU buffer resource
///
/// Implemented by backend-specific buffers (e.g., the Vulkan buffer).
/// Host-visible buffers are persistently mapped; `update` copies into the
/// mapped region.
pub trait Buffer: Send + Sync {
    /// Copy `data` into the buffer starting at byte `offset`
    fn update(&self, offset: u64, data: &[u8]) -> Result<()>;

    /// Size in bytes
    fn size(&self) -> u64;
}

/// Buffer usage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Per-mesh interleaved vertex data
    Vertex,
    /// Per-slot instance records, bound with a dynamic offset
    Uniform,
}

/// Buffer descriptor
#[derive(Debug, Clone)]
pub struct BufferDesc {
    /// Size in bytes
    pub size: u64,
    pub usage: BufferUsage,
    /// Debug name
    pub name: String,
}

/// Supported vertex attribute formats
///
/// This is the whole whitelist: format strings coming from scene data are
/// parsed with `FromStr` and anything else is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum BufferFormat {
    R32G32_SFLOAT,
    R32G32B32_SFLOAT,
    R32G32B32A32_SFLOAT,
    /// Packed 8-bit color
    R8G8B8A8_UNORM,
}

impl BufferFormat {
    /// Size of one element in bytes
    pub fn size(self) -> u32 {
        match self {
            BufferFormat::R32G32_SFLOAT => 8,
            BufferFormat::R32G32B32_SFLOAT => 12,
            BufferFormat::R32G32B32A32_SFLOAT => 16,
            BufferFormat::R8G8B8A8_UNORM => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BufferFormat::R32G32_SFLOAT => "R32G32_SFLOAT",
            BufferFormat::R32G32B32_SFLOAT => "R32G32B32_SFLOAT",
            BufferFormat::R32G32B32A32_SFLOAT => "R32G32B32A32_SFLOAT",
            BufferFormat::R8G8B8A8_UNORM => "R8G8B8A8_UNORM",
        }
    }
}

impl fmt::Display for BufferFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BufferFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        // Accept the bare name as well as the VK_FORMAT_ spelling
        let name = s.trim().strip_prefix("VK_FORMAT_").unwrap_or(s.trim());
        match name {
            "R32G32_SFLOAT" => Ok(BufferFormat::R32G32_SFLOAT),
            "R32G32B32_SFLOAT" => Ok(BufferFormat::R32G32B32_SFLOAT),
            "R32G32B32A32_SFLOAT" => Ok(BufferFormat::R32G32B32A32_SFLOAT),
            "R8G8B8A8_UNORM" => Ok(BufferFormat::R8G8B8A8_UNORM),
            _ => Err(Error::ValidationFailed(format!(
                "unsupported vertex format '{}'", s
            ))),
        }
    }
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
