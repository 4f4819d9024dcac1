/// Frame slot: one of N reusable sets of per-frame GPU objects

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{Buffer, CommandList, Fence, GraphicsDevice, Semaphore};

pub struct FrameSlot {
    pub index: usize,
    pub command_list: Box<dyn CommandList>,
    /// Signaled by acquire, waited on by submit
    pub image_available: Arc<dyn Semaphore>,
    /// Signaled by submit, waited on by present
    pub render_finished: Arc<dyn Semaphore>,
    /// Signaled when the slot's last submission completes
    pub in_flight: Arc<dyn Fence>,
    /// Instance records of this slot; attached at scene load
    pub uniform_buffer: Option<Arc<dyn Buffer>>,
}

impl FrameSlot {
    /// Create the slot's objects; the fence starts signaled so the first
    /// wait returns immediately
    pub fn new(device: &dyn GraphicsDevice, index: usize) -> Result<Self> {
        Ok(Self {
            index,
            command_list: device.create_command_list()?,
            image_available: device.create_semaphore()?,
            render_finished: device.create_semaphore()?,
            in_flight: device.create_fence(true)?,
            uniform_buffer: None,
        })
    }
}
