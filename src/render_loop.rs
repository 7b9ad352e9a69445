//! The timing-critical render loop.
//!
//! One dedicated thread owns the scene graph, the sequencer, and the
//! graphics backend outright; the only state it shares with the control
//! thread is the pose pair and a few atomic counters. Each tick runs a
//! strict order: pose snapshot, sequencer update, root transform, projection
//! recompute, render, pace. Pacing targets an absolute deadline derived from
//! the tick start, so per-tick costs never accumulate into drift.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use glam::{Mat4, Vec3};

use crate::backend::RenderBackend;
use crate::config::ArenaConfig;
use crate::error::RigError;
use crate::pose::PoseStore;
use crate::projection::compute_projection;
use crate::rig::DisplayRig;
use crate::scene::SceneGraph;
use crate::sequencer::StimulusSequencer;

/// Handle to a running render loop.
///
/// Dropping the handle stops the loop; [`stop`](Self::stop) does the same
/// explicitly. Either way the render thread is joined before control
/// returns, so no shared resource is touched after teardown begins.
#[derive(Debug)]
pub struct RenderLoopHandle {
    kill: Arc<AtomicBool>,
    ticks: Arc<AtomicU64>,
    slow_frames: Arc<AtomicU64>,
    join: Option<JoinHandle<()>>,
}

impl RenderLoopHandle {
    /// Ticks completed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Ticks that exceeded the target period.
    pub fn slow_frames(&self) -> u64 {
        self.slow_frames.load(Ordering::Relaxed)
    }

    /// Signal the loop to stop and wait for the render thread to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.kill.store(true, Ordering::Relaxed);
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                log::error!("render thread panicked during shutdown");
            }
        }
    }
}

impl Drop for RenderLoopHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

pub struct RenderLoop;

impl RenderLoop {
    /// Spawn the render thread and block until its one-time setup finishes.
    ///
    /// A setup failure (backend refused, bad rig) is returned here and the
    /// loop never starts. On success the loop is already ticking when this
    /// returns.
    pub fn start<B>(
        config: ArenaConfig,
        rig: DisplayRig,
        poses: PoseStore,
        mut backend: B,
    ) -> Result<RenderLoopHandle, RigError>
    where
        B: RenderBackend + Send + 'static,
    {
        let kill = Arc::new(AtomicBool::new(false));
        let ticks = Arc::new(AtomicU64::new(0));
        let slow_frames = Arc::new(AtomicU64::new(0));

        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<(), RigError>>(1);

        let thread_kill = Arc::clone(&kill);
        let thread_ticks = Arc::clone(&ticks);
        let thread_slow = Arc::clone(&slow_frames);

        let join = std::thread::Builder::new()
            .name("render-loop".into())
            .spawn(move || {
                // One-time setup; a failure is reported through the
                // handshake and the thread exits without ever ticking.
                if let Err(e) = backend.setup(&rig) {
                    let _ = ready_tx.send(Err(e));
                    return;
                }

                let mut scene = SceneGraph::new();
                let mut sequencer = StimulusSequencer::new(&config);

                // Prime every display's matrix with the eye at the origin,
                // so a degenerate first frame still has something valid.
                let near = config.display.near_clip;
                let far = config.display.far_clip;
                let mut projections: Vec<Mat4> = rig
                    .displays()
                    .iter()
                    .map(|display| {
                        compute_projection(Vec3::ZERO, display, near, far).unwrap_or_else(|e| {
                            log::warn!("initial projection for {}: {e}", display.name);
                            Mat4::IDENTITY
                        })
                    })
                    .collect();

                let _ = ready_tx.send(Ok(()));

                let target = config.timing.target_period();
                let mut prev_tick: Option<Instant> = None;

                loop {
                    // The kill flag is observed only here, at the tick
                    // boundary; a frame in flight always completes.
                    if thread_kill.load(Ordering::Relaxed) {
                        break;
                    }

                    let tick_start = Instant::now();
                    let dt = prev_tick
                        .map(|prev| tick_start.duration_since(prev))
                        .unwrap_or(Duration::ZERO);
                    prev_tick = Some(tick_start);

                    // 1. Pose snapshot (the only lock on this thread).
                    let pair = poses.snapshot();

                    // 2. Stimulus/sequencer update.
                    if let Err(e) = sequencer.update(&mut scene, dt) {
                        log::error!("sequencer failed: {e}");
                        break;
                    }

                    // 3. Scene root tracks the real/virtual pose delta.
                    let delta = pair.real.delta(&pair.virt);
                    scene.set_root_position(delta.position());
                    scene.set_root_rotation(delta.pitch, delta.yaw, delta.roll);

                    // 4. Off-axis projections from the current eye position.
                    // A degenerate eye keeps that display's previous matrix
                    // for this frame instead of poisoning it with NaNs.
                    let eye = pair.real.position();
                    for (i, display) in rig.displays().iter().enumerate() {
                        match compute_projection(eye, display, near, far) {
                            Ok(matrix) => projections[i] = matrix,
                            Err(e) => log::debug!("keeping previous matrix: {e}"),
                        }
                        backend.set_projection(i, projections[i]);
                    }

                    // 5. Render one frame across all displays.
                    if let Err(e) = backend.render_frame(&scene) {
                        log::error!("render failed: {e}");
                        break;
                    }

                    thread_ticks.fetch_add(1, Ordering::Relaxed);

                    // 6. Pace to the absolute deadline for this tick.
                    let elapsed = tick_start.elapsed();
                    if elapsed >= target {
                        thread_slow.fetch_add(1, Ordering::Relaxed);
                        log::warn!(
                            "slow frame ({:.2} ms >= {:.2} ms target)",
                            elapsed.as_secs_f64() * 1000.0,
                            target.as_secs_f64() * 1000.0
                        );
                    } else {
                        let deadline = tick_start + target;
                        let now = Instant::now();
                        if deadline > now {
                            std::thread::sleep(deadline - now);
                        }
                    }
                }

                log::info!("render loop stopped after {} tick(s)", thread_ticks.load(Ordering::Relaxed));
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(RenderLoopHandle {
                kill,
                ticks,
                slow_frames,
                join: Some(join),
            }),
            Ok(Err(e)) => {
                let _ = join.join();
                Err(e)
            }
            Err(_) => {
                let _ = join.join();
                Err(RigError::Setup(
                    "render thread exited before signaling ready".into(),
                ))
            }
        }
    }
}
