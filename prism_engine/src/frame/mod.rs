//! Frame module
//!
//! Frame slots, the synchronization state machine that drives them, and the
//! recorder that emits one frame's commands.

mod frame_state;
mod frame_slot;
mod uniform;
mod prepared_frame;
mod scheduler;
mod recorder;

pub use frame_state::FrameState;
pub use frame_slot::FrameSlot;
pub use uniform::{InstanceUniform, PushConstants};
pub use prepared_frame::{MeshBatch, PreparedFrame};
pub use scheduler::{FrameOutcome, FramePayload, FrameScheduler, SchedulerTimeouts};
pub use recorder::{FrameRecorder, FrameStats};
