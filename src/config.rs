//! Experiment configuration.
//!
//! The whole run is described by one JSON document: display geometry, loop
//! timing, the interleave/sequence parameters, and one parameter section per
//! stimulus name. Configuration is read once at startup and is immutable
//! afterwards; every cross-reference (sequence name -> stimulus section) is
//! checked up front so an unknown name can never surface mid-run.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RigError;

fn default_display_width_m() -> f32 {
    0.33
}

fn default_display_height_m() -> f32 {
    0.26
}

fn default_width_px() -> u32 {
    1280
}

fn default_height_px() -> u32 {
    720
}

fn default_near_clip() -> f32 {
    0.01
}

fn default_far_clip() -> f32 {
    100.0
}

fn default_target_fps() -> f32 {
    60.0
}

fn default_interleave_duration() -> f32 {
    1.0
}

fn default_duty_cycle() -> f32 {
    0.5
}

fn default_spatial_period() -> u32 {
    8
}

fn default_rotation_speed() -> f32 {
    1.0
}

fn default_pattern_radius() -> f32 {
    1.0
}

fn default_panel_height() -> f32 {
    0.5
}

fn default_panel_thickness() -> f32 {
    0.01
}

fn default_light_height() -> f32 {
    1.0
}

fn default_wait() -> f32 {
    1.0
}

fn default_active_duration() -> f32 {
    5.0
}

fn default_white() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn default_black() -> [f32; 3] {
    [0.0, 0.0, 0.0]
}

/// Physical display parameters shared by all three panels of the rig.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayConfig {
    /// Width of each display surface in meters.
    #[serde(default = "default_display_width_m")]
    pub width_m: f32,

    /// Height of each display surface in meters.
    #[serde(default = "default_display_height_m")]
    pub height_m: f32,

    /// Pixel resolution of each display.
    #[serde(default = "default_width_px")]
    pub width_px: u32,

    #[serde(default = "default_height_px")]
    pub height_px: u32,

    /// Whether windows should be created fullscreen.
    #[serde(default)]
    pub fullscreen: bool,

    /// Near clip plane distance in meters.
    #[serde(default = "default_near_clip")]
    pub near_clip: f32,

    /// Far clip plane distance in meters.
    #[serde(default = "default_far_clip")]
    pub far_clip: f32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width_m: default_display_width_m(),
            height_m: default_display_height_m(),
            width_px: default_width_px(),
            height_px: default_height_px(),
            fullscreen: false,
            near_clip: default_near_clip(),
            far_clip: default_far_clip(),
        }
    }
}

/// Render loop timing parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingConfig {
    /// Target frame rate in Hz.
    #[serde(default = "default_target_fps")]
    pub target_fps: f32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            target_fps: default_target_fps(),
        }
    }
}

impl TimingConfig {
    /// Target frame period derived from the configured rate.
    pub fn target_period(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f32(1.0 / self.target_fps)
    }
}

/// Presentation sequence and inter-trial interval parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceConfig {
    /// Stimulus names to draw from, in configuration order.
    pub stimulus_order: Vec<String>,

    /// Background color shown during the interleave period.
    #[serde(default = "default_black")]
    pub interleave_color: [f32; 3],

    /// Interleave duration in seconds.
    #[serde(default = "default_interleave_duration")]
    pub interleave_duration: f32,

    /// Seed for the stimulus-selection generator. The same seed and the same
    /// `stimulus_order` reproduce the same presentation order.
    #[serde(default)]
    pub random_seed: u64,
}

/// Parameters for one named stimulus, tagged by kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StimulusSpec {
    /// A rotating cylinder of alternating fore/back colored bars.
    CylinderBars(CylinderBarsSpec),
}

/// Parameters for the cylinder-of-bars stimulus.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CylinderBarsSpec {
    /// Number of fore/back cycles around the full circle.
    #[serde(default = "default_spatial_period")]
    pub num_spatial_period: u32,

    /// Fraction of each cycle that is foreground, in [0, 1].
    #[serde(default = "default_duty_cycle")]
    pub duty_cycle: f32,

    /// Bar color.
    #[serde(default = "default_white")]
    pub fore_color: [f32; 3],

    /// Background color between bars.
    #[serde(default = "default_black")]
    pub back_color: [f32; 3],

    /// Ambient light color while this stimulus is shown.
    #[serde(default = "default_white")]
    pub back_light: [f32; 3],

    /// Height of the stimulus point light above the arena floor.
    #[serde(default = "default_light_height")]
    pub light_height: f32,

    /// Seconds the static pattern is shown before motion starts.
    #[serde(default = "default_wait")]
    pub wait_before: f32,

    /// Seconds of rotation.
    #[serde(default = "default_active_duration")]
    pub active_duration: f32,

    /// Seconds the pattern stays frozen after motion ends.
    #[serde(default = "default_wait")]
    pub wait_after: f32,

    /// Rotation speed in radians per second (sign sets direction).
    #[serde(default = "default_rotation_speed")]
    pub rotation_speed: f32,

    /// Cylinder radius in meters.
    #[serde(default = "default_pattern_radius")]
    pub pattern_radius: f32,

    /// Panel height in meters.
    #[serde(default = "default_panel_height")]
    pub panel_height: f32,

    /// Panel thickness in meters.
    #[serde(default = "default_panel_thickness")]
    pub panel_thickness: f32,
}

/// Top-level configuration for one experiment run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArenaConfig {
    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub timing: TimingConfig,

    pub sequence: SequenceConfig,

    /// Stimulus definitions, keyed by the names used in `stimulus_order`.
    pub stimuli: HashMap<String, StimulusSpec>,
}

impl ArenaConfig {
    /// Load and validate a configuration file.
    pub fn from_path(path: &Path) -> Result<Self, RigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_str(&contents)
    }

    /// Parse and validate a configuration document.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(contents: &str) -> Result<Self, RigError> {
        let config: ArenaConfig = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check internal consistency. Unknown stimulus names fail here, at load
    /// time, rather than when the sequencer first draws them.
    pub fn validate(&self) -> Result<(), RigError> {
        if self.timing.target_fps <= 0.0 {
            return Err(RigError::Config("targetFps must be positive".into()));
        }
        if self.display.near_clip <= 0.0 {
            return Err(RigError::Config("nearClip must be positive".into()));
        }
        if self.display.far_clip <= self.display.near_clip {
            return Err(RigError::Config("farClip must exceed nearClip".into()));
        }
        if self.display.width_m <= 0.0 || self.display.height_m <= 0.0 {
            return Err(RigError::Config(
                "display dimensions must be positive".into(),
            ));
        }
        if self.sequence.stimulus_order.is_empty() {
            return Err(RigError::Config("stimulusOrder must not be empty".into()));
        }
        if self.sequence.interleave_duration < 0.0 {
            return Err(RigError::Config(
                "interleaveDuration must not be negative".into(),
            ));
        }
        for name in &self.sequence.stimulus_order {
            match self.stimuli.get(name) {
                None => return Err(RigError::UnknownStimulus(name.clone())),
                Some(StimulusSpec::CylinderBars(spec)) => {
                    spec.validate(name)?;
                }
            }
        }
        Ok(())
    }
}

impl CylinderBarsSpec {
    fn validate(&self, name: &str) -> Result<(), RigError> {
        if self.num_spatial_period == 0 {
            return Err(RigError::Config(format!(
                "{name}: numSpatialPeriod must be at least 1"
            )));
        }
        if !(0.0..=1.0).contains(&self.duty_cycle) {
            return Err(RigError::Config(format!(
                "{name}: dutyCycle must be in [0, 1]"
            )));
        }
        if self.pattern_radius <= 0.0 {
            return Err(RigError::Config(format!(
                "{name}: patternRadius must be positive"
            )));
        }
        if self.wait_before < 0.0 || self.active_duration < 0.0 || self.wait_after < 0.0 {
            return Err(RigError::Config(format!(
                "{name}: phase durations must not be negative"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "sequence": {
            "stimulusOrder": ["bars"],
            "interleaveColor": [0.5, 0.5, 0.5],
            "interleaveDuration": 1.0,
            "randomSeed": 7
        },
        "stimuli": {
            "bars": {
                "kind": "cylinderBars",
                "numSpatialPeriod": 10,
                "dutyCycle": 0.5,
                "rotationSpeed": 0.8
            }
        }
    }"#;

    #[test]
    fn test_parse_minimal() {
        let config = ArenaConfig::from_str(MINIMAL).unwrap();
        assert_eq!(config.sequence.stimulus_order, vec!["bars"]);
        assert_eq!(config.sequence.random_seed, 7);
        // Defaults fill the omitted sections.
        assert_eq!(config.display.width_px, 1280);
        assert!((config.timing.target_fps - 60.0).abs() < f32::EPSILON);

        let StimulusSpec::CylinderBars(spec) = &config.stimuli["bars"];
        assert_eq!(spec.num_spatial_period, 10);
        assert!((spec.wait_before - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_unknown_name_in_order_is_fatal() {
        let doc = r#"{
            "sequence": { "stimulusOrder": ["missing"] },
            "stimuli": {}
        }"#;
        let err = ArenaConfig::from_str(doc).unwrap_err();
        assert!(matches!(err, RigError::UnknownStimulus(name) if name == "missing"));
    }

    #[test]
    fn test_empty_order_rejected() {
        let doc = r#"{
            "sequence": { "stimulusOrder": [] },
            "stimuli": {}
        }"#;
        assert!(matches!(
            ArenaConfig::from_str(doc),
            Err(RigError::Config(_))
        ));
    }

    #[test]
    fn test_bad_duty_cycle_rejected() {
        let doc = r#"{
            "sequence": { "stimulusOrder": ["bars"] },
            "stimuli": {
                "bars": { "kind": "cylinderBars", "dutyCycle": 1.5 }
            }
        }"#;
        assert!(matches!(
            ArenaConfig::from_str(doc),
            Err(RigError::Config(_))
        ));
    }

    #[test]
    fn test_target_period() {
        let timing = TimingConfig { target_fps: 50.0 };
        assert_eq!(timing.target_period(), std::time::Duration::from_millis(20));
    }
}
