/// Frame Scheduler: the per-tick synchronization state machine
///
/// One `tick` drives a slot through fence wait, acquire, uniform upload,
/// recording, submission and presentation, then advances to the next slot.
/// A stale surface or an external resize request routes through `Resizing`,
/// which drains the device before the swapchain is rebuilt.

use std::sync::Arc;
use crate::error::{Error, Result};
use crate::frame::{FrameSlot, FrameState};
use crate::graphics_device::{
    Buffer, CommandList, GraphicsDevice, PresentationSurface, SurfaceStatus, Swapchain,
};
use crate::{engine_debug, engine_info};

const SOURCE: &str = "prism::FrameScheduler";

/// How a tick ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The frame was submitted and queued for presentation
    Presented,
    /// The tick went through `Resizing`; size-dependent resources were rebuilt
    Recreated,
}

/// Per-frame work plugged into a tick
pub trait FramePayload {
    /// Copy this frame's uniform data into the slot's mapped buffer
    fn write_uniforms(&mut self, slot: &FrameSlot) -> Result<()>;

    /// Record draw commands into an already begun command list
    fn record(
        &mut self,
        slot_index: usize,
        cmd: &mut dyn CommandList,
        swapchain: &dyn Swapchain,
        image_index: u32,
    ) -> Result<()>;
}

/// Scheduler timeouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerTimeouts {
    pub fence_ns: u64,
    pub acquire_ns: u64,
}

pub struct FrameScheduler {
    slots: Vec<FrameSlot>,
    current: usize,
    state: FrameState,
    resize_requested: bool,
    timeouts: SchedulerTimeouts,
}

impl FrameScheduler {
    /// Create `frames_in_flight` slots
    ///
    /// # Errors
    ///
    /// `Error::ValidationFailed` when `frames_in_flight` is zero, or any
    /// device error while creating slot objects.
    pub fn new(device: &dyn GraphicsDevice, frames_in_flight: usize, timeouts: SchedulerTimeouts) -> Result<Self> {
        if frames_in_flight == 0 {
            return Err(Error::ValidationFailed("frames_in_flight must be at least 1".to_string()));
        }
        let slots = (0..frames_in_flight)
            .map(|i| FrameSlot::new(device, i))
            .collect::<Result<Vec<_>>>()?;

        engine_debug!(SOURCE, "Created {} frame slots", frames_in_flight);

        Ok(Self {
            slots,
            current: 0,
            state: FrameState::Idle,
            resize_requested: false,
            timeouts,
        })
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn current_slot(&self) -> usize {
        self.current
    }

    pub fn frames_in_flight(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[FrameSlot] {
        &self.slots
    }

    /// Flag the surface as resized; honored after the next present
    pub fn request_resize(&mut self) {
        self.resize_requested = true;
    }

    pub fn resize_requested(&self) -> bool {
        self.resize_requested
    }

    /// Attach one uniform buffer per slot (or detach with `None`s)
    pub fn attach_uniform_buffers(&mut self, buffers: Vec<Option<Arc<dyn Buffer>>>) -> Result<()> {
        if buffers.len() != self.slots.len() {
            return Err(Error::InvalidResource(format!(
                "{} uniform buffers for {} frame slots",
                buffers.len(), self.slots.len()
            )));
        }
        for (slot, buffer) in self.slots.iter_mut().zip(buffers) {
            slot.uniform_buffer = buffer;
        }
        Ok(())
    }

    fn set_state(&mut self, next: FrameState) -> Result<()> {
        self.state = self.state.transition(next)?;
        Ok(())
    }

    /// Run one presentation tick
    ///
    /// Transient surface states are absorbed and reported as
    /// `FrameOutcome::Recreated`. Any other error is fatal.
    pub fn tick(
        &mut self,
        device: &dyn GraphicsDevice,
        swapchain: &mut dyn Swapchain,
        surface: &mut dyn PresentationSurface,
        payload: &mut dyn FramePayload,
    ) -> Result<FrameOutcome> {
        if self.slots.is_empty() {
            return Err(Error::InitializationFailed("frame scheduler is shut down".to_string()));
        }
        self.set_state(FrameState::Acquiring)?;
        let index = self.current;

        // 1. The GPU is done with this slot once its fence signals
        self.slots[index].in_flight.wait(self.timeouts.fence_ns)?;

        // 2. Acquire; a stale surface aborts the tick before anything is reset
        let (image_index, status) = {
            let slot = &self.slots[index];
            swapchain.acquire_next_image(slot.image_available.as_ref(), self.timeouts.acquire_ns)?
        };
        if status == SurfaceStatus::OutOfDate {
            engine_debug!(SOURCE, "Surface out of date on acquire (slot {})", index);
            self.resize(device, swapchain, surface)?;
            return Ok(FrameOutcome::Recreated);
        }

        // 3. Uniform upload
        self.set_state(FrameState::Recording)?;
        payload.write_uniforms(&self.slots[index])?;

        // 4. Reset and record
        let slot = &mut self.slots[index];
        slot.in_flight.reset()?;
        slot.command_list.begin()?;
        payload.record(index, slot.command_list.as_mut(), &*swapchain, image_index)?;
        slot.command_list.end()?;

        // 5. Submit
        device.submit(
            slot.command_list.as_ref(),
            slot.image_available.as_ref(),
            slot.render_finished.as_ref(),
            slot.in_flight.as_ref(),
        )?;
        self.set_state(FrameState::Submitted)?;

        // 6. Present
        self.set_state(FrameState::Presenting)?;
        let status = swapchain.present(image_index, self.slots[index].render_finished.as_ref())?;

        // 7. Advance
        self.current = (self.current + 1) % self.slots.len();

        if status != SurfaceStatus::Optimal || self.resize_requested {
            engine_debug!(
                SOURCE,
                "Recreating after present (status {:?}, resize requested {})",
                status,
                self.resize_requested
            );
            self.resize(device, swapchain, surface)?;
            return Ok(FrameOutcome::Recreated);
        }

        self.set_state(FrameState::Idle)?;
        Ok(FrameOutcome::Presented)
    }

    /// Enter `Resizing`, wait for a drawable surface, drain the device and
    /// rebuild the swapchain
    pub fn resize(
        &mut self,
        device: &dyn GraphicsDevice,
        swapchain: &mut dyn Swapchain,
        surface: &mut dyn PresentationSurface,
    ) -> Result<()> {
        self.set_state(FrameState::Resizing)?;

        let (width, height) = loop {
            let (w, h) = surface.framebuffer_size();
            if w > 0 && h > 0 {
                break (w, h);
            }
            surface.wait_events();
        };

        device.wait_idle()?;
        swapchain.recreate(width, height)?;
        self.resize_requested = false;

        engine_info!(SOURCE, "Swapchain recreated at {}x{}", width, height);

        self.set_state(FrameState::Idle)
    }

    /// Drain the device and release every slot
    pub fn shutdown(&mut self, device: &dyn GraphicsDevice) -> Result<()> {
        device.wait_idle()?;
        self.slots.clear();
        self.current = 0;
        self.state = FrameState::Idle;
        Ok(())
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
