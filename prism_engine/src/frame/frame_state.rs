/// Frame synchronization states and their legal transitions

use std::fmt;
use crate::error::{Error, Result};

/// Where the frame scheduler is within one presentation tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// Between ticks
    Idle,
    /// Waiting on the slot fence, then acquiring an image
    Acquiring,
    /// Uniforms written, command list being recorded
    Recording,
    /// Command list submitted to the queue
    Submitted,
    /// Image queued for presentation
    Presenting,
    /// Waiting out a zero-size surface and recreating the swapchain
    Resizing,
}

impl FrameState {
    /// Whether `self -> next` is a legal transition
    ///
    /// `Resizing` may be entered from any state and only leaves to `Idle`.
    pub fn can_transition_to(self, next: FrameState) -> bool {
        use FrameState::*;
        matches!(
            (self, next),
            (_, Resizing)
                | (Idle, Acquiring)
                | (Acquiring, Recording)
                | (Recording, Submitted)
                | (Submitted, Presenting)
                | (Presenting, Idle)
                | (Resizing, Idle)
        )
    }

    /// Checked transition
    ///
    /// # Errors
    ///
    /// `Error::InvalidState` for an illegal transition, e.g. recording before
    /// the fence wait.
    pub fn transition(self, next: FrameState) -> Result<FrameState> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(Error::InvalidState(format!("illegal frame transition {} -> {}", self, next)))
        }
    }
}

impl fmt::Display for FrameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
#[path = "frame_state_tests.rs"]
mod tests;
