//! Time-based spin animation
//!
//! The rotation is sampled from the wall clock every frame rather than
//! integrated, so dropped frames never change where the wheel stops.

use serde::{Deserialize, Serialize};

use crate::consts::{SPIN_DURATION_MS, SPIN_TURNS};

/// Cubic ease-out: fast start, gentle stop
#[inline]
pub fn ease_out_cubic(x: f64) -> f64 {
    1.0 - (1.0 - x).powi(3)
}

/// One spin from `start_rotation` to `target_rotation`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpinAnimation {
    pub started_at: u64,
    pub start_rotation: f64,
    pub target_rotation: f64,
    /// Stop angle in [0, 360) drawn from the seed
    pub stop_angle: f64,
}

impl SpinAnimation {
    /// Spin `SPIN_TURNS` full turns plus `stop_angle` beyond the current rotation
    pub fn new(started_at: u64, start_rotation: f64, stop_angle: f64) -> Self {
        Self {
            started_at,
            start_rotation,
            target_rotation: start_rotation + 360.0 * SPIN_TURNS + stop_angle,
            stop_angle,
        }
    }

    /// Animation progress in [0, 1]
    pub fn progress(&self, now: u64) -> f64 {
        let elapsed = now.saturating_sub(self.started_at);
        (elapsed as f64 / SPIN_DURATION_MS as f64).min(1.0)
    }

    pub fn is_finished(&self, now: u64) -> bool {
        now.saturating_sub(self.started_at) >= SPIN_DURATION_MS
    }

    /// Wheel rotation at `now`
    pub fn rotation_at(&self, now: u64) -> f64 {
        if self.is_finished(now) {
            return self.target_rotation;
        }
        let eased = ease_out_cubic(self.progress(now));
        self.start_rotation + (self.target_rotation - self.start_rotation) * eased
    }
}
