/// Frame Recorder: turns a prepared frame into bind/draw commands
///
/// Emission order is fixed: optional skybox, then every mesh batch in load
/// order, then every instance of the batch in ordinal order. Culling may run
/// on the rayon pool but only produces a visibility vector indexed by
/// ordinal, so the recorded stream does not depend on it.

use std::sync::Arc;
use glam::Mat4;
use rayon::prelude::*;
use crate::engine_trace;
use crate::error::{Error, Result};
use crate::frame::PreparedFrame;
use crate::graphics_device::{
    ClearValue, CommandList, Pipeline, PipelineKind, Rect2D, Swapchain, VertexLayout, Viewport,
};
use crate::render::LoadedScene;

const SOURCE: &str = "prism::FrameRecorder";

/// Vertices of the skybox quad pair
const SKYBOX_VERTEX_COUNT: u32 = 6;

/// Counters of one recorded frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Instance draws (the skybox is not counted)
    pub draw_calls: u32,
    pub culled_instances: u32,
    pub pipeline_binds: u32,
    pub vertex_input_changes: u32,
    pub skybox_drawn: bool,
}

pub struct FrameRecorder<'a> {
    scene: &'a LoadedScene,
    clear_color: [f32; 4],
}

impl<'a> FrameRecorder<'a> {
    pub fn new(scene: &'a LoadedScene, clear_color: [f32; 4]) -> Self {
        Self { scene, clear_color }
    }

    /// Run the culling test for every ordinal
    ///
    /// `cull_transforms[ordinal]` is the view * model matrix of the instance.
    pub fn visibility(&self, frame: &PreparedFrame, cull_transforms: &[Mat4], parallel: bool) -> Result<Vec<bool>> {
        if cull_transforms.len() != frame.models.len() {
            return Err(Error::InvalidState(format!(
                "{} culling transforms for {} instances",
                cull_transforms.len(),
                frame.models.len()
            )));
        }

        let jobs: Vec<(usize, usize)> = frame
            .batches
            .iter()
            .flat_map(|batch| batch.ordinals().map(move |ordinal| (batch.mesh, ordinal as usize)))
            .collect();

        let frustum = &self.scene.frustum;
        let meshes = &self.scene.meshes;
        let test = |&(mesh, ordinal): &(usize, usize)| {
            frustum.is_visible(&cull_transforms[ordinal], &meshes[mesh].aabb)
        };

        Ok(if parallel {
            jobs.par_iter().map(test).collect()
        } else {
            jobs.iter().map(test).collect()
        })
    }

    /// Record the whole frame into a begun command list
    pub fn record(
        &self,
        cmd: &mut dyn CommandList,
        swapchain: &dyn Swapchain,
        image_index: u32,
        slot: u32,
        frame: &PreparedFrame,
        visibility: &[bool],
    ) -> Result<FrameStats> {
        if visibility.len() != frame.models.len() {
            return Err(Error::InvalidState(format!(
                "{} visibility entries for {} instances",
                visibility.len(),
                frame.models.len()
            )));
        }
        let scene = self.scene;
        let indexer = &scene.indexer;
        let mut stats = FrameStats::default();
        let push_bytes = bytemuck::bytes_of(&frame.push_constants);

        swapchain.begin_render_pass(
            cmd,
            image_index,
            &[
                ClearValue::Color(self.clear_color),
                ClearValue::DepthStencil { depth: 1.0, stencil: 0 },
            ],
        )?;

        let (width, height) = (swapchain.width(), swapchain.height());
        cmd.set_viewport(Viewport::full(width, height))?;
        cmd.set_scissor(Rect2D { x: 0, y: 0, width, height })?;

        let mut bound_pipeline: Option<PipelineKind> = None;
        let mut bound_layout: Option<&VertexLayout> = None;

        if scene.has_skybox {
            let pipeline = scene.pipeline(PipelineKind::Skybox)?;
            bind_pipeline(cmd, pipeline, push_bytes, &mut stats)?;
            bound_pipeline = Some(PipelineKind::Skybox);
            cmd.bind_binding_group(pipeline, 0, scene.arena.group(slot, 0)?, &[0])?;
            cmd.draw(SKYBOX_VERTEX_COUNT, 0)?;
            stats.skybox_drawn = true;
        }

        for batch in &frame.batches {
            let mesh = scene.meshes.get(batch.mesh).ok_or_else(|| {
                Error::InvalidResource(format!("mesh {} is not loaded", batch.mesh))
            })?;
            let kind = indexer.pipeline_for(mesh);
            let material = indexer.material_for(mesh);
            let pipeline = scene.pipeline(kind)?;

            if bound_pipeline != Some(kind) {
                bind_pipeline(cmd, pipeline, push_bytes, &mut stats)?;
                bound_pipeline = Some(kind);
            }
            if bound_layout != Some(&mesh.layout) {
                cmd.set_vertex_input(&mesh.layout)?;
                bound_layout = Some(&mesh.layout);
                stats.vertex_input_changes += 1;
            }
            cmd.bind_vertex_buffer(&mesh.vertex_buffer, 0)?;

            let group = scene.arena.group(slot, material)?;
            for ordinal in batch.ordinals() {
                let offset = indexer.dynamic_offset(ordinal)?;
                if !visibility[ordinal as usize] {
                    stats.culled_instances += 1;
                    continue;
                }
                cmd.bind_binding_group(pipeline, 0, group, &[offset])?;
                cmd.draw(mesh.vertex_count, 0)?;
                stats.draw_calls += 1;
            }
        }

        cmd.end_render_pass()?;

        engine_trace!(
            SOURCE,
            "slot {}: {} draws, {} culled, {} pipeline binds",
            slot,
            stats.draw_calls,
            stats.culled_instances,
            stats.pipeline_binds
        );

        Ok(stats)
    }
}

fn bind_pipeline(
    cmd: &mut dyn CommandList,
    pipeline: &Arc<dyn Pipeline>,
    push_bytes: &[u8],
    stats: &mut FrameStats,
) -> Result<()> {
    cmd.bind_pipeline(pipeline)?;
    cmd.push_constants(0, push_bytes)?;
    stats.pipeline_binds += 1;
    Ok(())
}

#[cfg(test)]
#[path = "recorder_tests.rs"]
mod tests;
