//! Shared viewer pose state.
//!
//! The subject's tracked ("real") pose and the reference ("virtual") pose are
//! the only data shared between the control thread and the render thread.
//! Both live in a [`PoseStore`], a cloneable handle over a single mutex. The
//! lock is held only long enough to copy the pair in or out; no rendering or
//! stimulus logic ever runs under it.

use std::sync::{Arc, Mutex};

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A 6-DOF pose sample: position in meters, orientation in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pose {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Pose {
    pub fn new(x: f32, y: f32, z: f32, pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { x, y, z, pitch, yaw, roll }
    }

    /// Position component as a vector.
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Per-component difference `self - other`.
    ///
    /// The render loop moves the scene root by `real.delta(virt)` so the
    /// world tracks the subject relative to its virtual reference point.
    pub fn delta(&self, other: &Pose) -> Pose {
        Pose {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
            pitch: self.pitch - other.pitch,
            yaw: self.yaw - other.yaw,
            roll: self.roll - other.roll,
        }
    }
}

/// The real/virtual pose pair, copied atomically each tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PosePair {
    pub real: Pose,
    pub virt: Pose,
}

/// Cloneable handle to the shared pose pair.
///
/// The pose-acquisition side writes through one clone at any rate; the render
/// loop snapshots through another once per tick. There is deliberately no
/// process-wide instance: the handle is created by the caller and injected
/// into both sides, so its lifetime is tied to the run that owns it.
#[derive(Debug, Clone, Default)]
pub struct PoseStore {
    inner: Arc<Mutex<PosePair>>,
}

impl PoseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy out both poses under the lock. Never tears: the pair is copied
    /// as a unit.
    pub fn snapshot(&self) -> PosePair {
        *self.lock()
    }

    pub fn set_real(&self, pose: Pose) {
        self.lock().real = pose;
    }

    pub fn set_virt(&self, pose: Pose) {
        self.lock().virt = pose;
    }

    pub fn set_both(&self, real: Pose, virt: Pose) {
        let mut guard = self.lock();
        guard.real = real;
        guard.virt = virt;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PosePair> {
        // A poisoned lock only means a writer panicked mid-copy; the pair is
        // plain data, so recovering the guard is always safe.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
