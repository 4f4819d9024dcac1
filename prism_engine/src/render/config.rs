/// Renderer configuration

use crate::error::{Error, Result};

/// Ten seconds: finite, but far beyond any healthy frame
pub const DEFAULT_TIMEOUT_NS: u64 = 10_000_000_000;

/// Renderer configuration
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Enable validation/debug layers
    pub enable_validation: bool,
    /// Application name
    pub app_name: String,
    /// Application version (major, minor, patch)
    pub app_version: (u32, u32, u32),
    /// Number of frame slots; fixed for the renderer's lifetime
    pub frames_in_flight: u32,
    /// Slot fence wait; expiry is `Error::SyncTimeout`
    pub fence_timeout_ns: u64,
    /// Image acquisition wait
    pub acquire_timeout_ns: u64,
    /// Color attachment clear value (depth always clears to 1.0)
    pub clear_color: [f32; 4],
    /// Run the culling test across instances on the rayon pool
    pub parallel_culling: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            enable_validation: cfg!(debug_assertions),
            app_name: "Prism Application".to_string(),
            app_version: (1, 0, 0),
            frames_in_flight: 2,
            fence_timeout_ns: DEFAULT_TIMEOUT_NS,
            acquire_timeout_ns: DEFAULT_TIMEOUT_NS,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            parallel_culling: false,
        }
    }
}

impl RendererConfig {
    pub fn validate(&self) -> Result<()> {
        if self.frames_in_flight == 0 {
            return Err(Error::ValidationFailed("frames_in_flight must be at least 1".to_string()));
        }
        if self.fence_timeout_ns == 0 || self.acquire_timeout_ns == 0 {
            return Err(Error::ValidationFailed("timeouts must be non-zero".to_string()));
        }
        Ok(())
    }
}
