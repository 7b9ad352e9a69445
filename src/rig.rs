//! Static geometry of the physical display arrangement.
//!
//! Each display surface is a rectangle in world space, described by three
//! corners: `pa` (lower-left), `pb` (lower-right) and `pc` (upper-left).
//! `pb - pa` spans the screen's horizontal edge and `pc - pa` the vertical
//! edge. The geometry is fixed at startup; only the projection matrices
//! derived from it change as the eye moves.

use glam::Vec3;

use crate::config::DisplayConfig;

/// One physical display surface.
#[derive(Debug, Clone)]
pub struct DisplayGeometry {
    pub name: String,
    /// Lower-left corner in world space.
    pub pa: Vec3,
    /// Lower-right corner in world space.
    pub pb: Vec3,
    /// Upper-left corner in world space.
    pub pc: Vec3,
    pub width_px: u32,
    pub height_px: u32,
    pub fullscreen: bool,
}

impl DisplayGeometry {
    /// Upper-right corner, derived from the other three.
    pub fn pd(&self) -> Vec3 {
        self.pb + (self.pc - self.pa)
    }
}

/// The set of display surfaces surrounding the subject.
#[derive(Debug, Clone)]
pub struct DisplayRig {
    displays: Vec<DisplayGeometry>,
}

impl DisplayRig {
    /// Build the three-panel partial-cylinder layout: a North panel directly
    /// ahead, with West and East panels at right angles to it. The subject
    /// sits at the origin, half a panel width from each screen.
    pub fn three_panel(config: &DisplayConfig) -> Self {
        let w = config.width_m;
        let h = config.height_m;

        let make = |name: &str, pa: Vec3, along: Vec3| DisplayGeometry {
            name: name.to_string(),
            pa,
            pb: pa + along,
            pc: pa + Vec3::new(0.0, h, 0.0),
            width_px: config.width_px,
            height_px: config.height_px,
            fullscreen: config.fullscreen,
        };

        let displays = vec![
            make(
                "north",
                Vec3::new(-w / 2.0, -h / 2.0, -w / 2.0),
                Vec3::new(w, 0.0, 0.0),
            ),
            make(
                "west",
                Vec3::new(-w / 2.0, -h / 2.0, w / 2.0),
                Vec3::new(0.0, 0.0, -w),
            ),
            make(
                "east",
                Vec3::new(w / 2.0, -h / 2.0, -w / 2.0),
                Vec3::new(0.0, 0.0, w),
            ),
        ];

        Self { displays }
    }

    /// Build a rig from explicit display geometry, for layouts other than
    /// the standard three-panel arrangement.
    pub fn from_displays(displays: Vec<DisplayGeometry>) -> Self {
        Self { displays }
    }

    pub fn displays(&self) -> &[DisplayGeometry] {
        &self.displays
    }

    pub fn len(&self) -> usize {
        self.displays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.displays.is_empty()
    }
}
