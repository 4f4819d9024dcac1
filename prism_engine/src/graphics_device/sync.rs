/// GPU synchronization primitives
///
/// A fence signals the CPU that submitted work finished. A semaphore orders
/// GPU work against other GPU work (acquire -> render -> present).

use crate::error::Result;

/// GPU -> CPU signal
pub trait Fence: Send + Sync {
    /// Block until the fence is signaled
    ///
    /// # Errors
    ///
    /// `Error::SyncTimeout` when `timeout_ns` elapses first. Any other error is
    /// a device failure.
    fn wait(&self, timeout_ns: u64) -> Result<()>;

    /// Return the fence to the unsignaled state
    fn reset(&self) -> Result<()>;
}

/// GPU -> GPU ordering primitive
pub trait Semaphore: Send + Sync {}
