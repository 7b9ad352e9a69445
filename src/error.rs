//! Error taxonomy for the arena core.
//!
//! Three severities exist:
//! - fatal configuration/setup errors, surfaced from `ArenaConfig` loading or
//!   from `RenderLoop::start` before the ready signal fires;
//! - recoverable per-frame geometry errors (eye coplanar with a display),
//!   contained within the tick that produced them;
//! - performance warnings, which are logged and never raised as errors.

use thiserror::Error;

/// Errors produced by the arena core.
#[derive(Debug, Error)]
pub enum RigError {
    /// A configuration value is missing or out of range.
    #[error("configuration error: {0}")]
    Config(String),

    /// A stimulus name in the sequence has no matching definition.
    #[error("unknown stimulus \"{0}\" requested by the sequence")]
    UnknownStimulus(String),

    /// The graphics backend failed one-time setup.
    #[error("graphics setup failed: {0}")]
    Setup(String),

    /// The eye position lies on a display's plane; no valid frustum exists.
    #[error("degenerate geometry: eye lies on the plane of display \"{0}\"")]
    DegenerateGeometry(String),

    /// A frame could not be rendered.
    #[error("render failed: {0}")]
    Render(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("configuration parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
