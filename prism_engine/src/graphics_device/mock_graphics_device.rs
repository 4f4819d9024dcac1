/// Mock graphics device for unit tests (no GPU required)
///
/// Every command recorded by a mock command list, every submit and every
/// render pass begin is appended to one shared command log, so tests can
/// assert on the exact bind/draw sequence of a frame.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::graphics_device::{
    BindingEntry, BindingGroup, BindingResource, Buffer, BufferDesc, ClearValue, CommandList,
    DeviceLimits, Fence, GraphicsDevice, Pipeline, PipelineKind, PresentationSurface, Rect2D,
    Semaphore, SurfaceStatus, Swapchain, Texture, TextureDesc, TextureInfo, VertexLayout, Viewport,
};

/// Shared, append-only log of recorded commands
pub type CommandLog = Arc<Mutex<Vec<String>>>;

fn same_object<T: ?Sized, U: ?Sized>(a: *const T, b: *const U) -> bool {
    a as *const () == b as *const ()
}

// ============================================================================
// Mock Buffer
// ============================================================================

pub struct MockBuffer {
    pub name: String,
    pub data: Mutex<Vec<u8>>,
    /// (offset, len) of every update
    pub writes: Mutex<Vec<(u64, usize)>>,
}

impl MockBuffer {
    pub fn new(size: u64, name: String) -> Self {
        Self {
            name,
            data: Mutex::new(vec![0; size as usize]),
            writes: Mutex::new(Vec::new()),
        }
    }

    /// Copy of the buffer contents
    pub fn contents(&self) -> Vec<u8> {
        self.data.lock().unwrap().clone()
    }
}

impl Buffer for MockBuffer {
    fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        let mut bytes = self.data.lock().unwrap();
        let start = offset as usize;
        let end = start + data.len();
        if end > bytes.len() {
            return Err(Error::InvalidResource(format!(
                "write of {} bytes at {} overflows buffer '{}' ({} bytes)",
                data.len(), offset, self.name, bytes.len()
            )));
        }
        bytes[start..end].copy_from_slice(data);
        self.writes.lock().unwrap().push((offset, data.len()));
        Ok(())
    }

    fn size(&self) -> u64 {
        self.data.lock().unwrap().len() as u64
    }
}

// ============================================================================
// Mock Texture
// ============================================================================

pub struct MockTexture {
    pub name: String,
    pub info: TextureInfo,
}

impl Texture for MockTexture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }
}

// ============================================================================
// Mock Fence / Semaphore
// ============================================================================

pub struct MockFence {
    pub index: usize,
    signaled: AtomicBool,
    wait_count: AtomicU32,
    reset_count: AtomicU32,
    force_timeout: Arc<AtomicBool>,
}

impl MockFence {
    pub fn wait_count(&self) -> u32 {
        self.wait_count.load(Ordering::SeqCst)
    }

    pub fn reset_count(&self) -> u32 {
        self.reset_count.load(Ordering::SeqCst)
    }

    pub fn is_signaled(&self) -> bool {
        self.signaled.load(Ordering::SeqCst)
    }

    fn signal(&self) {
        self.signaled.store(true, Ordering::SeqCst);
    }
}

impl Fence for MockFence {
    fn wait(&self, _timeout_ns: u64) -> Result<()> {
        self.wait_count.fetch_add(1, Ordering::SeqCst);
        // Nothing will ever signal an unsignaled mock fence
        if self.force_timeout.load(Ordering::SeqCst) || !self.is_signaled() {
            return Err(Error::SyncTimeout(format!("mock fence {}", self.index)));
        }
        Ok(())
    }

    fn reset(&self) -> Result<()> {
        self.reset_count.fetch_add(1, Ordering::SeqCst);
        self.signaled.store(false, Ordering::SeqCst);
        Ok(())
    }
}

pub struct MockSemaphore {
    pub index: usize,
}

impl Semaphore for MockSemaphore {}

// ============================================================================
// Mock Pipeline / BindingGroup
// ============================================================================

pub struct MockPipeline {
    pub kind: PipelineKind,
}

impl Pipeline for MockPipeline {
    fn kind(&self) -> PipelineKind {
        self.kind
    }
}

pub struct MockBindingGroup {
    /// Creation order
    pub index: usize,
    /// (binding, resource name)
    pub entries: Vec<(u32, String)>,
}

impl BindingGroup for MockBindingGroup {}

// ============================================================================
// Mock CommandList
// ============================================================================

pub struct MockCommandList {
    pub index: usize,
    log: CommandLog,
    buffers: Arc<Mutex<Vec<Arc<MockBuffer>>>>,
    groups: Arc<Mutex<Vec<Arc<MockBindingGroup>>>>,
    recording: bool,
}

impl MockCommandList {
    fn push(&self, command: String) {
        self.log.lock().unwrap().push(command);
    }

    fn require_recording(&self, op: &str) -> Result<()> {
        if !self.recording {
            return Err(Error::BackendError(format!("{}: command list not recording", op)));
        }
        Ok(())
    }
}

impl CommandList for MockCommandList {
    fn begin(&mut self) -> Result<()> {
        if self.recording {
            return Err(Error::BackendError("command list already recording".to_string()));
        }
        self.recording = true;
        self.push(format!("begin cmd={}", self.index));
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.require_recording("end")?;
        self.recording = false;
        self.push("end".to_string());
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.require_recording("end_render_pass")?;
        self.push("end_render_pass".to_string());
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.require_recording("set_viewport")?;
        self.push(format!("set_viewport {}x{}", viewport.width, viewport.height));
        Ok(())
    }

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        self.require_recording("set_scissor")?;
        self.push(format!("set_scissor {}x{}", scissor.width, scissor.height));
        Ok(())
    }

    fn bind_pipeline(&mut self, pipeline: &Arc<dyn Pipeline>) -> Result<()> {
        self.require_recording("bind_pipeline")?;
        self.push(format!("bind_pipeline {}", pipeline.kind()));
        Ok(())
    }

    fn set_vertex_input(&mut self, layout: &VertexLayout) -> Result<()> {
        self.require_recording("set_vertex_input")?;
        self.push(format!(
            "set_vertex_input stride={} attributes={}",
            layout.stride,
            layout.attributes.len()
        ));
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, buffer: &Arc<dyn Buffer>, offset: u64) -> Result<()> {
        self.require_recording("bind_vertex_buffer")?;
        let name = self
            .buffers
            .lock()
            .unwrap()
            .iter()
            .find(|b| same_object(Arc::as_ptr(b), Arc::as_ptr(buffer)))
            .map(|b| b.name.clone())
            .unwrap_or_else(|| "?".to_string());
        self.push(format!("bind_vertex_buffer {} offset={}", name, offset));
        Ok(())
    }

    fn bind_binding_group(
        &mut self,
        _pipeline: &Arc<dyn Pipeline>,
        set_index: u32,
        group: &Arc<dyn BindingGroup>,
        dynamic_offsets: &[u32],
    ) -> Result<()> {
        self.require_recording("bind_binding_group")?;
        let index = self
            .groups
            .lock()
            .unwrap()
            .iter()
            .find(|g| same_object(Arc::as_ptr(g), Arc::as_ptr(group)))
            .map(|g| g.index as i64)
            .unwrap_or(-1);
        self.push(format!(
            "bind_binding_group set={} group={} offsets={:?}",
            set_index, index, dynamic_offsets
        ));
        Ok(())
    }

    fn push_constants(&mut self, offset: u32, data: &[u8]) -> Result<()> {
        self.require_recording("push_constants")?;
        self.push(format!("push_constants offset={} size={}", offset, data.len()));
        Ok(())
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()> {
        self.require_recording("draw")?;
        self.push(format!("draw {} {}", vertex_count, first_vertex));
        Ok(())
    }
}

// ============================================================================
// Mock GraphicsDevice
// ============================================================================

pub struct MockGraphicsDevice {
    pub log: CommandLog,
    pub buffers: Arc<Mutex<Vec<Arc<MockBuffer>>>>,
    pub textures: Mutex<Vec<Arc<MockTexture>>>,
    pub groups: Arc<Mutex<Vec<Arc<MockBindingGroup>>>>,
    pub fences: Mutex<Vec<Arc<MockFence>>>,
    pub semaphores: Mutex<Vec<Arc<MockSemaphore>>>,
    pub limits: DeviceLimits,
    command_list_count: AtomicU32,
    submit_count: AtomicU32,
    wait_idle_count: AtomicU32,
    fail_submit: AtomicBool,
    force_fence_timeout: Arc<AtomicBool>,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(Vec::new())),
            buffers: Arc::new(Mutex::new(Vec::new())),
            textures: Mutex::new(Vec::new()),
            groups: Arc::new(Mutex::new(Vec::new())),
            fences: Mutex::new(Vec::new()),
            semaphores: Mutex::new(Vec::new()),
            limits: DeviceLimits::default(),
            command_list_count: AtomicU32::new(0),
            submit_count: AtomicU32::new(0),
            wait_idle_count: AtomicU32::new(0),
            fail_submit: AtomicBool::new(false),
            force_fence_timeout: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_limits(limits: DeviceLimits) -> Self {
        Self { limits, ..Self::new() }
    }

    pub fn fence(&self, index: usize) -> Arc<MockFence> {
        Arc::clone(&self.fences.lock().unwrap()[index])
    }

    pub fn buffer_named(&self, name: &str) -> Option<Arc<MockBuffer>> {
        self.buffers.lock().unwrap().iter().find(|b| b.name == name).cloned()
    }

    pub fn group(&self, index: usize) -> Arc<MockBindingGroup> {
        Arc::clone(&self.groups.lock().unwrap()[index])
    }

    pub fn group_count(&self) -> usize {
        self.groups.lock().unwrap().len()
    }

    pub fn submit_count(&self) -> u32 {
        self.submit_count.load(Ordering::SeqCst)
    }

    pub fn wait_idle_count(&self) -> u32 {
        self.wait_idle_count.load(Ordering::SeqCst)
    }

    pub fn set_fail_submit(&self, fail: bool) {
        self.fail_submit.store(fail, Ordering::SeqCst);
    }

    pub fn set_fence_timeout(&self, timeout: bool) {
        self.force_fence_timeout.store(timeout, Ordering::SeqCst);
    }

    /// Every logged command
    pub fn commands(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    /// Commands recorded since the most recent `begin`
    pub fn last_frame_commands(&self) -> Vec<String> {
        let log = self.log.lock().unwrap();
        let start = log.iter().rposition(|c| c.starts_with("begin cmd=")).unwrap_or(0);
        log[start..].to_vec()
    }

    pub fn clear_log(&self) {
        self.log.lock().unwrap().clear();
    }

    fn describe(&self, resource: &BindingResource) -> String {
        match resource {
            BindingResource::DynamicUniform { buffer, range } => {
                let name = self
                    .buffers
                    .lock()
                    .unwrap()
                    .iter()
                    .find(|b| same_object(Arc::as_ptr(b), *buffer as *const dyn Buffer))
                    .map(|b| b.name.clone())
                    .unwrap_or_else(|| "?".to_string());
                format!("{}[{}]", name, range)
            }
            BindingResource::SampledTexture(texture) => self
                .textures
                .lock()
                .unwrap()
                .iter()
                .find(|t| same_object(Arc::as_ptr(t), *texture as *const dyn Texture))
                .map(|t| t.name.clone())
                .unwrap_or_else(|| "?".to_string()),
        }
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_buffer(&self, desc: BufferDesc) -> Result<Arc<dyn Buffer>> {
        let buffer = Arc::new(MockBuffer::new(desc.size, desc.name));
        self.buffers.lock().unwrap().push(Arc::clone(&buffer));
        Ok(buffer)
    }

    fn create_texture(&self, desc: TextureDesc) -> Result<Arc<dyn Texture>> {
        desc.validate()?;
        let texture = Arc::new(MockTexture {
            name: desc.name,
            info: TextureInfo { width: desc.width, height: desc.height, kind: desc.kind },
        });
        self.textures.lock().unwrap().push(Arc::clone(&texture));
        Ok(texture)
    }

    fn create_command_list(&self) -> Result<Box<dyn CommandList>> {
        let index = self.command_list_count.fetch_add(1, Ordering::SeqCst) as usize;
        Ok(Box::new(MockCommandList {
            index,
            log: Arc::clone(&self.log),
            buffers: Arc::clone(&self.buffers),
            groups: Arc::clone(&self.groups),
            recording: false,
        }))
    }

    fn create_fence(&self, signaled: bool) -> Result<Arc<dyn Fence>> {
        let mut fences = self.fences.lock().unwrap();
        let fence = Arc::new(MockFence {
            index: fences.len(),
            signaled: AtomicBool::new(signaled),
            wait_count: AtomicU32::new(0),
            reset_count: AtomicU32::new(0),
            force_timeout: Arc::clone(&self.force_fence_timeout),
        });
        fences.push(Arc::clone(&fence));
        Ok(fence)
    }

    fn create_semaphore(&self) -> Result<Arc<dyn Semaphore>> {
        let mut semaphores = self.semaphores.lock().unwrap();
        let semaphore = Arc::new(MockSemaphore { index: semaphores.len() });
        semaphores.push(Arc::clone(&semaphore));
        Ok(semaphore)
    }

    fn create_binding_group(&self, entries: &[BindingEntry]) -> Result<Arc<dyn BindingGroup>> {
        let described = entries
            .iter()
            .map(|e| (e.binding, self.describe(&e.resource)))
            .collect();
        let mut groups = self.groups.lock().unwrap();
        let group = Arc::new(MockBindingGroup { index: groups.len(), entries: described });
        groups.push(Arc::clone(&group));
        Ok(group)
    }

    fn pipeline(&self, kind: PipelineKind) -> Result<Arc<dyn Pipeline>> {
        Ok(Arc::new(MockPipeline { kind }))
    }

    fn submit(
        &self,
        _cmd: &dyn CommandList,
        _wait: &dyn Semaphore,
        _signal: &dyn Semaphore,
        fence: &dyn Fence,
    ) -> Result<()> {
        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(Error::BackendError("mock submit failure".to_string()));
        }
        self.submit_count.fetch_add(1, Ordering::SeqCst);
        self.log.lock().unwrap().push("submit".to_string());
        // Work completes immediately: signal the fence
        if let Some(f) = self
            .fences
            .lock()
            .unwrap()
            .iter()
            .find(|f| same_object(Arc::as_ptr(f), fence as *const dyn Fence))
        {
            f.signal();
        }
        Ok(())
    }

    fn wait_idle(&self) -> Result<()> {
        self.wait_idle_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn limits(&self) -> DeviceLimits {
        self.limits
    }
}

// ============================================================================
// Mock Swapchain
// ============================================================================

pub struct MockSwapchainState {
    pub width: u32,
    pub height: u32,
    pub image_count: u32,
    pub next_image: u32,
    /// Statuses returned by upcoming acquires; `Optimal` once empty
    pub acquire_script: VecDeque<SurfaceStatus>,
    /// Statuses returned by upcoming presents; `Optimal` once empty
    pub present_script: VecDeque<SurfaceStatus>,
    pub acquire_count: u32,
    pub present_count: u32,
    pub recreate_count: u32,
}

/// Cloneable handle: tests keep one clone while the renderer owns another
#[derive(Clone)]
pub struct MockSwapchain {
    pub state: Arc<Mutex<MockSwapchainState>>,
    log: CommandLog,
}

impl MockSwapchain {
    pub fn new(device: &MockGraphicsDevice, width: u32, height: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockSwapchainState {
                width,
                height,
                image_count: 3,
                next_image: 0,
                acquire_script: VecDeque::new(),
                present_script: VecDeque::new(),
                acquire_count: 0,
                present_count: 0,
                recreate_count: 0,
            })),
            log: Arc::clone(&device.log),
        }
    }

    pub fn script_acquire(&self, status: SurfaceStatus) {
        self.state.lock().unwrap().acquire_script.push_back(status);
    }

    pub fn script_present(&self, status: SurfaceStatus) {
        self.state.lock().unwrap().present_script.push_back(status);
    }

    pub fn recreate_count(&self) -> u32 {
        self.state.lock().unwrap().recreate_count
    }

    pub fn present_count(&self) -> u32 {
        self.state.lock().unwrap().present_count
    }
}

impl Swapchain for MockSwapchain {
    fn acquire_next_image(&mut self, _signal: &dyn Semaphore, _timeout_ns: u64) -> Result<(u32, SurfaceStatus)> {
        let mut state = self.state.lock().unwrap();
        state.acquire_count += 1;
        let status = state.acquire_script.pop_front().unwrap_or(SurfaceStatus::Optimal);
        let index = state.next_image;
        if status != SurfaceStatus::OutOfDate {
            state.next_image = (state.next_image + 1) % state.image_count;
        }
        Ok((index, status))
    }

    fn present(&mut self, image_index: u32, _wait: &dyn Semaphore) -> Result<SurfaceStatus> {
        let mut state = self.state.lock().unwrap();
        state.present_count += 1;
        self.log.lock().unwrap().push(format!("present {}", image_index));
        Ok(state.present_script.pop_front().unwrap_or(SurfaceStatus::Optimal))
    }

    fn begin_render_pass(
        &self,
        cmd: &mut dyn CommandList,
        image_index: u32,
        clear_values: &[ClearValue],
    ) -> Result<()> {
        let _ = cmd;
        self.log.lock().unwrap().push(format!(
            "begin_render_pass image={} clears={}",
            image_index,
            clear_values.len()
        ));
        Ok(())
    }

    fn recreate(&mut self, width: u32, height: u32) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.width = width;
        state.height = height;
        state.next_image = 0;
        state.recreate_count += 1;
        self.log.lock().unwrap().push(format!("recreate {}x{}", width, height));
        Ok(())
    }

    fn image_count(&self) -> usize {
        self.state.lock().unwrap().image_count as usize
    }

    fn width(&self) -> u32 {
        self.state.lock().unwrap().width
    }

    fn height(&self) -> u32 {
        self.state.lock().unwrap().height
    }
}

// ============================================================================
// Mock PresentationSurface
// ============================================================================

/// Cloneable surface whose reported sizes are scripted
#[derive(Clone)]
pub struct MockSurface {
    /// Sizes returned by upcoming polls; the last one repeats
    pub sizes: Arc<Mutex<VecDeque<(u32, u32)>>>,
    pub wait_count: Arc<AtomicU32>,
}

impl MockSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            sizes: Arc::new(Mutex::new(VecDeque::from([(width, height)]))),
            wait_count: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Replace the scripted sizes
    pub fn script_sizes(&self, sizes: &[(u32, u32)]) {
        *self.sizes.lock().unwrap() = sizes.iter().copied().collect();
    }

    pub fn wait_count(&self) -> u32 {
        self.wait_count.load(Ordering::SeqCst)
    }
}

impl PresentationSurface for MockSurface {
    fn framebuffer_size(&self) -> (u32, u32) {
        let mut sizes = self.sizes.lock().unwrap();
        if sizes.len() > 1 {
            sizes.pop_front().unwrap_or((0, 0))
        } else {
            sizes.front().copied().unwrap_or((0, 0))
        }
    }

    fn wait_events(&mut self) {
        self.wait_count.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
