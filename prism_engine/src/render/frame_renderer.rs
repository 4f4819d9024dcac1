/// FrameRenderer: the public entry point of the rendering core
///
/// Owns the device handle, the swapchain and surface, the frame scheduler
/// and the loaded scene. Each `render_frame` call is one scheduler tick.

use std::sync::Arc;
use glam::Mat4;
use crate::error::{Error, Result};
use crate::frame::{
    FrameOutcome, FramePayload, FrameRecorder, FrameScheduler, FrameSlot, FrameState,
    FrameStats, PreparedFrame, SchedulerTimeouts,
};
use crate::graphics_device::{CommandList, GraphicsDevice, PresentationSurface, Swapchain};
use crate::render::{LoadedScene, RendererConfig};
use crate::scene::{CullingFrustum, SceneDesc, SceneInstance};
use crate::{engine_debug, engine_error, engine_info};

const SOURCE: &str = "prism::FrameRenderer";

pub struct FrameRenderer {
    device: Arc<dyn GraphicsDevice>,
    swapchain: Box<dyn Swapchain>,
    surface: Box<dyn PresentationSurface>,
    config: RendererConfig,
    scheduler: FrameScheduler,
    scene: Option<LoadedScene>,
    /// view * model per ordinal used by the previous frame's culling
    cull_transforms: Vec<Mat4>,
    culling_frozen: bool,
    last_stats: FrameStats,
    shut_down: bool,
}

impl FrameRenderer {
    /// Create the renderer and its frame slots
    ///
    /// # Arguments
    ///
    /// * `device` - Graphics device the scene and frames are created on
    /// * `swapchain` - Presentation swapchain created on the same device
    /// * `surface` - Output surface, polled while the window is minimized
    /// * `config` - Renderer configuration
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        swapchain: Box<dyn Swapchain>,
        surface: Box<dyn PresentationSurface>,
        config: RendererConfig,
    ) -> Result<Self> {
        config.validate()?;
        let scheduler = FrameScheduler::new(
            device.as_ref(),
            config.frames_in_flight as usize,
            SchedulerTimeouts {
                fence_ns: config.fence_timeout_ns,
                acquire_ns: config.acquire_timeout_ns,
            },
        )?;

        engine_info!(
            SOURCE,
            "Renderer created: {} frames in flight, {}x{} swapchain",
            config.frames_in_flight,
            swapchain.width(),
            swapchain.height()
        );

        Ok(Self {
            device,
            swapchain,
            surface,
            config,
            scheduler,
            scene: None,
            cull_transforms: Vec::new(),
            culling_frozen: false,
            last_stats: FrameStats::default(),
            shut_down: false,
        })
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.shut_down {
            return Err(Error::InitializationFailed("renderer has been shut down".to_string()));
        }
        Ok(())
    }

    /// Validate and upload a scene, replacing any previous one
    ///
    /// `loadScene(meshes, materials, frustumParams)`: meshes, materials and
    /// the culling frustum all travel in `desc`.
    pub fn load_scene(&mut self, desc: SceneDesc) -> Result<()> {
        self.ensure_alive()?;

        if self.scene.is_some() {
            // Old buffers may still be read by frames in flight
            self.device.wait_idle()?;
            self.scheduler.attach_uniform_buffers(vec![None; self.scheduler.frames_in_flight()])?;
            self.scene = None;
        }

        let scene = LoadedScene::load(self.device.as_ref(), desc, self.config.frames_in_flight)
            .map_err(|e| {
                engine_error!(SOURCE, "Scene load failed: {}", e);
                e
            })?;
        self.scheduler
            .attach_uniform_buffers(scene.uniform_buffers.iter().cloned().map(Some).collect())?;
        self.scene = Some(scene);
        self.cull_transforms.clear();
        self.last_stats = FrameStats::default();
        Ok(())
    }

    /// Draw one frame
    ///
    /// `renderFrame(instanceTransforms, viewMatrix, projMatrix)`.
    ///
    /// # Returns
    ///
    /// `FrameOutcome::Recreated` when a stale surface or a resize request
    /// was handled during the tick.
    ///
    /// # Errors
    ///
    /// `Error::InvalidResource` for an instance naming an unknown mesh or
    /// more instances than the scene capacity. Device errors are fatal.
    pub fn render_frame(&mut self, instances: &[SceneInstance], view: Mat4, proj: Mat4) -> Result<FrameOutcome> {
        self.ensure_alive()?;
        let scene = self
            .scene
            .as_ref()
            .ok_or_else(|| Error::InvalidState("render_frame called before load_scene".to_string()))?;

        let frame = PreparedFrame::build(instances, scene.meshes.len(), scene.max_instances, view, proj)?;

        let fresh = frame.cull_transforms();
        if self.culling_frozen {
            // Keep the frozen transforms; instances beyond them use live ones
            let kept = self.cull_transforms.len().min(fresh.len());
            self.cull_transforms.truncate(kept);
            self.cull_transforms.extend_from_slice(&fresh[kept..]);
        } else {
            self.cull_transforms = fresh;
        }

        let recorder = FrameRecorder::new(scene, self.config.clear_color);
        let visibility = recorder.visibility(&frame, &self.cull_transforms, self.config.parallel_culling)?;

        let mut payload = RenderPayload {
            scene,
            recorder,
            frame: &frame,
            visibility: &visibility,
            stats: None,
        };

        let outcome = self
            .scheduler
            .tick(self.device.as_ref(), self.swapchain.as_mut(), self.surface.as_mut(), &mut payload)
            .map_err(|e| {
                engine_error!(SOURCE, "Frame failed: {}", e);
                e
            })?;

        if let Some(stats) = payload.stats {
            self.last_stats = stats;
        }
        if outcome == FrameOutcome::Recreated {
            engine_debug!(SOURCE, "Frame ended in swapchain recreation");
        }
        Ok(outcome)
    }

    /// Flag an external resize; handled after the next present
    pub fn on_resize(&mut self) {
        self.scheduler.request_resize();
    }

    /// Drain the device and release the scene and frame slots
    ///
    /// Repeated calls are no-ops; every other call afterwards fails with
    /// `Error::InitializationFailed`.
    pub fn shutdown(&mut self) -> Result<()> {
        if self.shut_down {
            return Ok(());
        }
        self.scheduler.shutdown(self.device.as_ref())?;
        self.scene = None;
        self.cull_transforms.clear();
        self.shut_down = true;
        engine_info!(SOURCE, "Renderer shut down");
        Ok(())
    }

    /// Replace the culling frustum of the loaded scene
    pub fn set_culling_frustum(&mut self, half_width: f32, half_height: f32, near: f32, far: f32) -> Result<()> {
        self.ensure_alive()?;
        let frustum = CullingFrustum::new(half_width, half_height, near, far)?;
        let scene = self
            .scene
            .as_mut()
            .ok_or_else(|| Error::InvalidState("no scene loaded".to_string()))?;
        scene.frustum = frustum;
        Ok(())
    }

    /// Freeze the transforms used for culling (drawing keeps live transforms)
    pub fn set_culling_frozen(&mut self, frozen: bool) {
        self.culling_frozen = frozen;
    }

    pub fn culling_frozen(&self) -> bool {
        self.culling_frozen
    }

    pub fn current_slot(&self) -> usize {
        self.scheduler.current_slot()
    }

    pub fn state(&self) -> FrameState {
        self.scheduler.state()
    }

    /// Counters of the last recorded frame
    pub fn last_frame_stats(&self) -> FrameStats {
        self.last_stats
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn has_scene(&self) -> bool {
        self.scene.is_some()
    }

    pub fn swapchain(&self) -> &dyn Swapchain {
        self.swapchain.as_ref()
    }
}

impl Drop for FrameRenderer {
    fn drop(&mut self) {
        if !self.shut_down {
            if let Err(e) = self.device.wait_idle() {
                engine_error!(SOURCE, "wait_idle failed while dropping renderer: {}", e);
            }
        }
    }
}

/// Frame work handed to the scheduler
struct RenderPayload<'a> {
    scene: &'a LoadedScene,
    recorder: FrameRecorder<'a>,
    frame: &'a PreparedFrame,
    visibility: &'a [bool],
    stats: Option<FrameStats>,
}

impl FramePayload for RenderPayload<'_> {
    fn write_uniforms(&mut self, slot: &FrameSlot) -> Result<()> {
        let buffer = slot.uniform_buffer.as_ref().ok_or_else(|| {
            Error::InvalidState(format!("frame slot {} has no uniform buffer", slot.index))
        })?;
        self.frame.write_uniforms(buffer.as_ref(), &self.scene.indexer)
    }

    fn record(
        &mut self,
        slot_index: usize,
        cmd: &mut dyn CommandList,
        swapchain: &dyn Swapchain,
        image_index: u32,
    ) -> Result<()> {
        let stats = self.recorder.record(
            cmd,
            swapchain,
            image_index,
            slot_index as u32,
            self.frame,
            self.visibility,
        )?;
        self.stats = Some(stats);
        Ok(())
    }
}

#[cfg(test)]
#[path = "frame_renderer_tests.rs"]
mod tests;
