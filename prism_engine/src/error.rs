//! Error types for the Prism engine
//!
//! GPU and driver failures, load-time validation failures and synchronization
//! failures all surface through a single `Error` enum. Stale or suboptimal
//! presentation surfaces are not errors: they are reported as
//! [`SurfaceStatus`](crate::graphics_device::SurfaceStatus) values and handled
//! by the frame scheduler.

use std::fmt;

/// Result type for Prism engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Prism engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (failed submission, failed resource creation, ...)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// A handle or index supplied by the caller does not resolve
    InvalidResource(String),

    /// Initialization failed, or the renderer was already shut down
    InitializationFailed(String),

    /// Scene data rejected at load time, before any GPU submission
    ValidationFailed(String),

    /// A fence or acquire wait exceeded its timeout
    SyncTimeout(String),

    /// Illegal frame state transition
    InvalidState(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::ValidationFailed(msg) => write!(f, "Validation failed: {}", msg),
            Error::SyncTimeout(msg) => write!(f, "Synchronization timeout: {}", msg),
            Error::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// True for errors raised while validating scene data at load time
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::ValidationFailed(_))
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
