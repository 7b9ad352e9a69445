//! Rotating cylinder of colored bars.
//!
//! The pattern is a ring of flat panels at a configured radius: each spatial
//! period contributes one foreground bar and one background filler, with the
//! bar taking `duty_cycle` of the period's arc. During `Active` the whole
//! ring spins about the vertical axis at `rotation_speed`.

use std::f32::consts::TAU;
use std::time::Duration;

use glam::Vec3;

use crate::config::CylinderBarsSpec;
use crate::scene::{NodeId, Panel, PointLight, SceneGraph, Transform};

use super::{Phase, PhaseClock, PhaseTiming, Stimulus};

/// Arcs narrower than this contribute no panel (degenerate duty cycles).
const MIN_ARC: f32 = 1e-4;

pub struct CylinderBars {
    name: String,
    spec: CylinderBarsSpec,
    clock: PhaseClock,
    node: Option<NodeId>,
    /// Accumulated rotation, integrated tick by tick during `Active`.
    angle: f32,
    /// Ambient and background colors as found at init, put back on teardown.
    restore: Option<([f32; 3], [f32; 3])>,
}

impl CylinderBars {
    pub fn new(name: &str, spec: CylinderBarsSpec) -> Self {
        let timing =
            PhaseTiming::from_secs(spec.wait_before, spec.active_duration, spec.wait_after);
        Self {
            name: name.to_string(),
            spec,
            clock: PhaseClock::new(timing),
            node: None,
            angle: 0.0,
            restore: None,
        }
    }

    /// Current accumulated rotation in radians.
    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn phase(&self) -> Phase {
        self.clock.phase()
    }

    /// One flat panel spanning `arc` radians of the ring, centered at
    /// `center_angle`. The panel is the chord of its arc, standing upright
    /// and facing the cylinder axis.
    fn panel_at(&self, center_angle: f32, arc: f32, color: [f32; 3]) -> Panel {
        let r = self.spec.pattern_radius;
        let chord = 2.0 * r * (arc / 2.0).sin();

        Panel {
            half_extents: Vec3::new(
                chord / 2.0,
                self.spec.panel_height / 2.0,
                self.spec.panel_thickness / 2.0,
            ),
            color,
            transform: Transform {
                position: Vec3::new(r * center_angle.sin(), 0.0, -r * center_angle.cos()),
                rotation: Vec3::new(0.0, center_angle, 0.0),
                scale: Vec3::ONE,
            },
            visible: true,
        }
    }

    fn build_ring(&self, scene: &mut SceneGraph, node: NodeId) {
        let periods = self.spec.num_spatial_period;
        let period_arc = TAU / periods as f32;
        let fore_arc = period_arc * self.spec.duty_cycle;
        let back_arc = period_arc - fore_arc;

        for i in 0..periods {
            let start = i as f32 * period_arc;

            if fore_arc > MIN_ARC {
                scene.attach_panel(
                    node,
                    self.panel_at(start + fore_arc / 2.0, fore_arc, self.spec.fore_color),
                );
            }
            if back_arc > MIN_ARC {
                scene.attach_panel(
                    node,
                    self.panel_at(
                        start + fore_arc + back_arc / 2.0,
                        back_arc,
                        self.spec.back_color,
                    ),
                );
            }
        }
    }
}

impl Stimulus for CylinderBars {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&mut self, scene: &mut SceneGraph) {
        let node = scene.create_node();
        self.build_ring(scene, node);

        scene.attach_light(
            node,
            PointLight {
                position: Vec3::new(0.0, self.spec.light_height, 0.0),
                color: [1.0, 1.0, 1.0],
            },
        );
        self.restore = Some((scene.ambient, scene.background));
        scene.ambient = self.spec.back_light;
        scene.background = self.spec.back_color;

        self.node = Some(node);
        log::debug!(
            "stimulus {}: {} panels at radius {}",
            self.name,
            scene.get(node).map(|n| n.panels.len()).unwrap_or(0),
            self.spec.pattern_radius
        );
    }

    fn update(&mut self, scene: &mut SceneGraph, dt: Duration) {
        let was_active = self.clock.phase() == Phase::Active;
        let phase = self.clock.advance(dt);

        // Only Active moves; WaitBefore shows the static ring and WaitAfter
        // freezes it wherever the last Active tick left it. The transition
        // tick itself does not rotate, mirroring a phase-entry timestamp
        // reset, so the boundary error stays within one tick.
        if was_active && phase == Phase::Active {
            self.angle += self.spec.rotation_speed * dt.as_secs_f32();
            if let Some(node) = self.node {
                scene.set_node_yaw(node, self.angle);
            }
        }
    }

    fn is_done(&self) -> bool {
        self.clock.is_done()
    }

    fn teardown(&mut self, scene: &mut SceneGraph) {
        if let Some(node) = self.node.take() {
            scene.destroy_node(node);
        }
        if let Some((ambient, background)) = self.restore.take() {
            scene.ambient = ambient;
            scene.background = background;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ArenaConfig, StimulusSpec};

    fn test_config() -> ArenaConfig {
        ArenaConfig::from_str(
            r#"{
                "sequence": { "stimulusOrder": ["bars"] },
                "stimuli": {
                    "bars": {
                        "kind": "cylinderBars",
                        "numSpatialPeriod": 6,
                        "dutyCycle": 0.5,
                        "waitBefore": 1.0,
                        "activeDuration": 2.0,
                        "waitAfter": 0.5,
                        "rotationSpeed": 1.0
                    }
                }
            }"#,
        )
        .unwrap()
    }

    fn bars(config: &ArenaConfig) -> CylinderBars {
        let StimulusSpec::CylinderBars(spec) = &config.stimuli["bars"];
        CylinderBars::new("bars", spec.clone())
    }

    #[test]
    fn test_init_builds_panels() {
        let config = test_config();
        let mut stim = bars(&config);
        let mut scene = SceneGraph::new();

        stim.init(&mut scene);

        // Six periods, duty 0.5: one fore and one back panel each.
        assert_eq!(scene.panel_count(), 12);
        assert_eq!(scene.node_count(), 1);
    }

    #[test]
    fn test_full_duty_cycle_builds_only_fore_panels() {
        let config = test_config();
        let StimulusSpec::CylinderBars(spec) = &config.stimuli["bars"];
        let mut spec = spec.clone();
        spec.duty_cycle = 1.0;

        let mut stim = CylinderBars::new("bars", spec);
        let mut scene = SceneGraph::new();
        stim.init(&mut scene);

        assert_eq!(scene.panel_count(), 6);
    }

    #[test]
    fn test_rotation_accumulates_incrementally() {
        let config = test_config();
        let mut stim = bars(&config);
        let mut scene = SceneGraph::new();
        stim.init(&mut scene);

        // Skip WaitBefore entirely with one oversized tick.
        stim.update(&mut scene, Duration::from_secs_f32(1.0));
        assert_eq!(stim.phase(), Phase::Active);
        let base = stim.angle();

        // 10 uniform ticks of 0.1 s at 1 rad/s accumulate ~1 rad...
        for _ in 0..10 {
            stim.update(&mut scene, Duration::from_millis(100));
        }
        assert!((stim.angle() - base - 1.0).abs() < 1e-3);

        // ...and so do jittered ticks summing to the same total time.
        let mut stim2 = bars(&config);
        let mut scene2 = SceneGraph::new();
        stim2.init(&mut scene2);
        stim2.update(&mut scene2, Duration::from_secs_f32(1.0));
        let base2 = stim2.angle();
        for ms in [50u64, 150, 80, 120, 100, 60, 140, 90, 110, 100] {
            stim2.update(&mut scene2, Duration::from_millis(ms));
        }
        assert!((stim2.angle() - base2 - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_no_motion_outside_active() {
        let config = test_config();
        let mut stim = bars(&config);
        let mut scene = SceneGraph::new();
        stim.init(&mut scene);

        // Still inside WaitBefore: no rotation.
        stim.update(&mut scene, Duration::from_millis(100));
        assert_eq!(stim.phase(), Phase::WaitBefore);
        assert_eq!(stim.angle(), 0.0);

        // Run through Active into WaitAfter, then confirm it froze.
        stim.update(&mut scene, Duration::from_secs_f32(2.95));
        assert_eq!(stim.phase(), Phase::WaitAfter);
        let frozen = stim.angle();
        stim.update(&mut scene, Duration::from_millis(100));
        assert_eq!(stim.angle(), frozen);
    }

    #[test]
    fn test_teardown_destroys_geometry() {
        let config = test_config();
        let mut stim = bars(&config);
        let mut scene = SceneGraph::new();

        stim.init(&mut scene);
        assert_eq!(scene.node_count(), 1);

        stim.teardown(&mut scene);
        assert_eq!(scene.node_count(), 0);
        assert_eq!(scene.panel_count(), 0);
    }

    #[test]
    fn test_teardown_restores_ambient_and_background() {
        let config = test_config();
        let mut stim = bars(&config);
        let mut scene = SceneGraph::new();
        scene.ambient = [0.2, 0.3, 0.4];
        scene.background = [0.1, 0.1, 0.1];

        stim.init(&mut scene);
        // The stimulus installs its own lighting while it is live.
        assert_eq!(scene.ambient, [1.0, 1.0, 1.0]);

        stim.teardown(&mut scene);
        assert_eq!(scene.ambient, [0.2, 0.3, 0.4]);
        assert_eq!(scene.background, [0.1, 0.1, 0.1]);
    }

    #[test]
    fn test_completion_after_all_phases() {
        let config = test_config();
        let mut stim = bars(&config);
        let mut scene = SceneGraph::new();
        stim.init(&mut scene);

        stim.update(&mut scene, Duration::from_secs_f32(3.4));
        assert!(!stim.is_done());
        stim.update(&mut scene, Duration::from_secs_f32(0.2));
        assert!(stim.is_done());
    }
}
