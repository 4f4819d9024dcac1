/// Vulkan backend configuration

use prism_engine::prism::RendererConfig;

/// Which validation messages reach the debug output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugSeverity {
    ErrorsOnly,
    ErrorsAndWarnings,
    All,
}

/// Where validation messages are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebugOutput {
    Console,
    File(String),
    Both(String),
}

/// Validation message counters, collected when stats are enabled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationStats {
    pub errors: u32,
    pub warnings: u32,
    pub info: u32,
    pub verbose: u32,
}

impl ValidationStats {
    pub fn total(&self) -> u32 {
        self.errors + self.warnings + self.info + self.verbose
    }
}

/// Settings consumed by `VulkanGraphicsDevice::new`
#[derive(Debug, Clone)]
pub struct VulkanConfig {
    /// Load VK_LAYER_KHRONOS_validation and install the debug messenger
    pub enable_validation: bool,
    pub app_name: String,
    pub app_version: (u32, u32, u32),
    pub debug_severity: DebugSeverity,
    pub debug_output: DebugOutput,
    pub enable_validation_stats: bool,
    /// Abort the process on the first validation error (debugger attachment)
    pub break_on_validation_error: bool,
    /// Panic on the first validation error (tests, CI)
    pub panic_on_error: bool,
}

impl Default for VulkanConfig {
    fn default() -> Self {
        Self::from(&RendererConfig::default())
    }
}

impl From<&RendererConfig> for VulkanConfig {
    fn from(config: &RendererConfig) -> Self {
        Self {
            enable_validation: config.enable_validation,
            app_name: config.app_name.clone(),
            app_version: config.app_version,
            debug_severity: DebugSeverity::ErrorsAndWarnings,
            debug_output: DebugOutput::Console,
            enable_validation_stats: config.enable_validation,
            break_on_validation_error: false,
            panic_on_error: false,
        }
    }
}
