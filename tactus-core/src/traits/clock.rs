//! Monotonic clock trait

/// Source of local time for one device.
///
/// The count starts at an arbitrary point, never goes backward, and never
/// resets within a session. Each device has its own independent clock;
/// aligning them is the sync layer's job, not the clock's.
pub trait MonotonicClock {
    /// Current local time in microseconds
    fn now_us(&self) -> u64;
}
