//! Stimulus units and their shared phase timing contract.
//!
//! Every stimulus runs the same four-phase machine: `Init` (build geometry),
//! `WaitBefore` (static), `Active` (its own motion), `WaitAfter` (frozen),
//! then done. The timing lives in [`PhaseClock`]; concrete stimuli implement
//! [`Stimulus`] and own whatever scene nodes they create.

mod cylinder_bars;

pub use cylinder_bars::CylinderBars;

use std::time::Duration;

use crate::config::{ArenaConfig, StimulusSpec};
use crate::error::RigError;
use crate::scene::SceneGraph;

/// One state of a stimulus's timing machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    WaitBefore,
    Active,
    WaitAfter,
}

/// Durations of the three timed phases.
#[derive(Debug, Clone, Copy)]
pub struct PhaseTiming {
    pub wait_before: Duration,
    pub active: Duration,
    pub wait_after: Duration,
}

impl PhaseTiming {
    pub fn from_secs(wait_before: f32, active: f32, wait_after: f32) -> Self {
        Self {
            wait_before: Duration::from_secs_f32(wait_before),
            active: Duration::from_secs_f32(active),
            wait_after: Duration::from_secs_f32(wait_after),
        }
    }
}

/// Drives the phase transitions from per-tick time deltas.
///
/// Elapsed time is accumulated from the `dt` values handed to [`advance`],
/// never recomputed from a wall clock, so variable tick lengths shift a
/// transition by at most one tick. Leftover time past a boundary carries
/// into the next phase.
///
/// [`advance`]: PhaseClock::advance
#[derive(Debug, Clone)]
pub struct PhaseClock {
    timing: PhaseTiming,
    phase: Phase,
    elapsed: Duration,
    done: bool,
}

impl PhaseClock {
    pub fn new(timing: PhaseTiming) -> Self {
        Self {
            timing,
            phase: Phase::Init,
            elapsed: Duration::ZERO,
            done: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// True once `WaitAfter` has run its full duration.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Advance by one tick and return the phase now in effect.
    pub fn advance(&mut self, dt: Duration) -> Phase {
        // Init yields to WaitBefore without consuming any time.
        if self.phase == Phase::Init {
            self.phase = Phase::WaitBefore;
        }

        self.elapsed += dt;

        loop {
            let limit = match self.phase {
                Phase::Init => unreachable!("Init exited above"),
                Phase::WaitBefore => self.timing.wait_before,
                Phase::Active => self.timing.active,
                Phase::WaitAfter => self.timing.wait_after,
            };
            if self.elapsed < limit {
                break;
            }
            match self.phase {
                Phase::WaitBefore => {
                    self.elapsed -= limit;
                    self.phase = Phase::Active;
                }
                Phase::Active => {
                    self.elapsed -= limit;
                    self.phase = Phase::WaitAfter;
                }
                Phase::WaitAfter => {
                    self.done = true;
                    break;
                }
                Phase::Init => unreachable!(),
            }
        }

        self.phase
    }
}

/// A live visual pattern with the four-phase timing contract.
///
/// The render thread is the sole owner; no stimulus outlives the sequencer
/// state that created it.
pub trait Stimulus {
    /// Configured name this instance was built from.
    fn name(&self) -> &str;

    /// Build scene geometry and record the phase entry point.
    fn init(&mut self, scene: &mut SceneGraph);

    /// Per-tick update: advance the phase clock and mutate owned scene
    /// nodes accordingly.
    fn update(&mut self, scene: &mut SceneGraph, dt: Duration);

    /// True once the final phase has elapsed.
    fn is_done(&self) -> bool;

    /// Detach and destroy all owned scene geometry.
    fn teardown(&mut self, scene: &mut SceneGraph);
}

/// Construct a stimulus instance by configured name.
///
/// An unrecognized name is a fatal configuration error; the sequencer
/// cannot proceed with unknown behavior.
pub fn build_stimulus(
    name: &str,
    config: &ArenaConfig,
) -> Result<Box<dyn Stimulus>, RigError> {
    match config.stimuli.get(name) {
        Some(StimulusSpec::CylinderBars(spec)) => {
            Ok(Box::new(CylinderBars::new(name, spec.clone())))
        }
        None => Err(RigError::UnknownStimulus(name.to_string())),
    }
}
