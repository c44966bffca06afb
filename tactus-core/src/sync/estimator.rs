//! Smoothed clock-offset correction

use crate::config::SyncConfig;

/// Slewing estimator for the local-minus-peer clock offset.
///
/// New measurements move a pending target, bounded per sample so one
/// bad reading cannot yank the clock. Each control tick then pulls the
/// applied correction a fixed fraction toward the target. The applied
/// value changes a little every tick, never in jumps, so a running
/// pulse sequence drifts into alignment instead of skipping.
#[derive(Debug, Clone)]
pub struct OffsetEstimator {
    /// Correction currently applied to clock reads (us)
    applied_us: f32,
    /// Target the applied correction is slewing toward (us)
    pending_us: f32,
    /// Fraction of the remaining error applied per tick
    pull_rate: f32,
    /// Largest move of the pending target per sample (us)
    max_step_us: f32,
}

impl OffsetEstimator {
    /// Create an estimator with no correction applied
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            applied_us: 0.0,
            pending_us: 0.0,
            pull_rate: config.pull_rate,
            max_step_us: config.max_step_us,
        }
    }

    /// Fold one measured offset into the pending target.
    ///
    /// The target moves toward `offset_us` by at most the configured
    /// step, in either direction.
    pub fn push_sample(&mut self, offset_us: f32) {
        let mut delta = offset_us - self.pending_us;
        if delta > self.max_step_us {
            delta = self.max_step_us;
        } else if delta < -self.max_step_us {
            delta = -self.max_step_us;
        }
        self.pending_us += delta;
    }

    /// Advance the applied correction one step toward the pending target
    pub fn tick(&mut self) {
        self.applied_us += (self.pending_us - self.applied_us) * self.pull_rate;
    }

    /// Forget all state, returning to zero correction
    pub fn reset(&mut self) {
        self.applied_us = 0.0;
        self.pending_us = 0.0;
    }

    /// Correction currently applied to clock reads, in microseconds
    pub fn applied_us(&self) -> f32 {
        self.applied_us
    }

    /// Target the applied correction is slewing toward, in microseconds
    pub fn pending_us(&self) -> f32 {
        self.pending_us
    }

    /// Read `raw_now_us` through the applied correction
    pub fn corrected_now(&self, raw_now_us: u64) -> u64 {
        corrected_now(raw_now_us, self.applied_us)
    }
}

/// Apply a clock-offset correction to a raw monotonic reading.
///
/// Subtracts the local-minus-peer offset so the result tracks the peer's
/// session clock. Saturates at zero rather than wrapping when a large
/// positive correction meets an early reading.
pub fn corrected_now(raw_now_us: u64, applied_offset_us: f32) -> u64 {
    let corrected = raw_now_us as i64 - applied_offset_us as i64;
    if corrected < 0 {
        0
    } else {
        corrected as u64
    }
}
