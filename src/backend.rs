//! Graphics capability seam.
//!
//! The render loop drives displays through the [`RenderBackend`] trait and
//! never touches windows, GPU resources, or mesh/material loading itself.
//! Real window/GPU backends live outside this crate; [`HeadlessBackend`]
//! implements the same contract with counters only, and is what the CLI and
//! the tests run against.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use glam::Mat4;

use crate::error::RigError;
use crate::rig::DisplayRig;
use crate::scene::SceneGraph;

/// Operations the render loop needs from a graphics subsystem.
pub trait RenderBackend {
    /// One-time setup: create windows/viewports for every display in the
    /// rig. A failure here aborts the run before the loop starts.
    fn setup(&mut self, rig: &DisplayRig) -> Result<(), RigError>;

    /// Install a custom world-to-clip matrix for one display's camera,
    /// replacing its native FOV/aspect projection.
    fn set_projection(&mut self, display_index: usize, matrix: Mat4);

    /// Render exactly one frame across all displays.
    fn render_frame(&mut self, scene: &SceneGraph) -> Result<(), RigError>;
}

/// Shared counters exposed by the headless backend.
#[derive(Debug, Default)]
pub struct FrameStats {
    frames: AtomicU64,
}

impl FrameStats {
    pub fn frames_rendered(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }
}

/// A backend that renders nothing but honors the full contract.
///
/// Optionally simulates a fixed per-frame render cost, which the pacing
/// tests use to stand in for real GPU work.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    projections: Vec<Mat4>,
    stats: Arc<FrameStats>,
    render_cost: Option<Duration>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate `cost` of render work per frame.
    pub fn with_render_cost(cost: Duration) -> Self {
        Self {
            render_cost: Some(cost),
            ..Self::default()
        }
    }

    /// Counter handle that stays valid after the backend moves into the
    /// render thread.
    pub fn stats(&self) -> Arc<FrameStats> {
        Arc::clone(&self.stats)
    }

    /// The most recently installed projection for one display.
    pub fn projection(&self, display_index: usize) -> Option<Mat4> {
        self.projections.get(display_index).copied()
    }
}

impl RenderBackend for HeadlessBackend {
    fn setup(&mut self, rig: &DisplayRig) -> Result<(), RigError> {
        if rig.is_empty() {
            return Err(RigError::Setup("display rig has no displays".into()));
        }
        self.projections = vec![Mat4::IDENTITY; rig.len()];
        log::info!("headless backend ready for {} display(s)", rig.len());
        Ok(())
    }

    fn set_projection(&mut self, display_index: usize, matrix: Mat4) {
        if let Some(slot) = self.projections.get_mut(display_index) {
            *slot = matrix;
        }
    }

    fn render_frame(&mut self, _scene: &SceneGraph) -> Result<(), RigError> {
        if let Some(cost) = self.render_cost {
            std::thread::sleep(cost);
        }
        self.stats.frames.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
