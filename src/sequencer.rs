//! Stimulus presentation sequencer.
//!
//! Alternates between an inter-trial interleave (blank background, fixed
//! duration) and one live stimulus at a time, drawn from the configured set
//! by a seeded generator. Exactly one stimulus instance exists while the
//! sequencer is in `Stimulus`; none exists in `Init` or `Interleave`.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::ArenaConfig;
use crate::error::RigError;
use crate::scene::SceneGraph;
use crate::stimulus::{build_stimulus, Stimulus};

/// Sequencer control states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    Init,
    Interleave,
    Stimulus,
}

pub struct StimulusSequencer {
    config: ArenaConfig,
    state: SequencerState,
    rng: StdRng,

    /// Time spent in the current interleave.
    interleave_elapsed: Duration,

    current: Option<Box<dyn Stimulus>>,
    /// Index of the previous draw, used to avoid immediate repeats.
    last_index: Option<usize>,

    presented: Vec<String>,
}

impl StimulusSequencer {
    /// Build a sequencer from a validated configuration and seed its
    /// generator. Same seed, same order list: same presentation order.
    pub fn new(config: &ArenaConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.sequence.random_seed);
        Self {
            config: config.clone(),
            state: SequencerState::Init,
            rng,
            interleave_elapsed: Duration::ZERO,
            current: None,
            last_index: None,
            presented: Vec::new(),
        }
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    /// Name of the live stimulus, if any.
    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref().map(|s| s.name())
    }

    /// Names presented so far, in order.
    pub fn presented(&self) -> &[String] {
        &self.presented
    }

    /// Advance the sequencer by one tick.
    pub fn update(&mut self, scene: &mut SceneGraph, dt: Duration) -> Result<(), RigError> {
        match self.state {
            SequencerState::Init => {
                log::info!(
                    "sequencer ready: {} stimulus name(s), seed {}",
                    self.config.sequence.stimulus_order.len(),
                    self.config.sequence.random_seed
                );
                self.enter_interleave(scene);
            }
            SequencerState::Interleave => {
                self.interleave_elapsed += dt;
                if self.interleave_elapsed
                    >= Duration::from_secs_f32(self.config.sequence.interleave_duration)
                {
                    self.start_next_stimulus(scene)?;
                }
            }
            SequencerState::Stimulus => {
                let done = {
                    // `current` is always Some in this state.
                    let Some(stimulus) = self.current.as_mut() else {
                        return Err(RigError::Config(
                            "sequencer in Stimulus state with no live stimulus".into(),
                        ));
                    };
                    stimulus.update(scene, dt);
                    stimulus.is_done()
                };
                if done {
                    if let Some(mut stimulus) = self.current.take() {
                        log::info!("stimulus {} complete", stimulus.name());
                        stimulus.teardown(scene);
                    }
                    self.enter_interleave(scene);
                }
            }
        }
        Ok(())
    }

    fn enter_interleave(&mut self, scene: &mut SceneGraph) {
        scene.background = self.config.sequence.interleave_color;
        scene.ambient = self.config.sequence.interleave_color;
        self.interleave_elapsed = Duration::ZERO;
        self.state = SequencerState::Interleave;
        log::debug!(
            "interleave for {:.2} s",
            self.config.sequence.interleave_duration
        );
    }

    fn start_next_stimulus(&mut self, scene: &mut SceneGraph) -> Result<(), RigError> {
        let index = self.pick_next_index();
        let name = self.config.sequence.stimulus_order[index].clone();

        let mut stimulus = build_stimulus(&name, &self.config)?;
        stimulus.init(scene);

        log::info!("presenting stimulus {name}");
        self.presented.push(name);
        self.last_index = Some(index);
        self.current = Some(stimulus);
        self.state = SequencerState::Stimulus;
        Ok(())
    }

    /// Uniform draw over the configured set, re-drawing once on an
    /// immediate repeat when the set has at least two names. The original
    /// pure uniform draw could repeat the same stimulus back to back
    /// arbitrarily often; every name still has equal long-run weight here.
    fn pick_next_index(&mut self) -> usize {
        let len = self.config.sequence.stimulus_order.len();
        if len == 1 {
            return 0;
        }
        loop {
            let index = self.rng.gen_range(0..len);
            if Some(index) != self.last_index {
                return index;
            }
        }
    }
}
