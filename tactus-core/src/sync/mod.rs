//! Clock alignment between controller and node
//!
//! Both devices run free monotonic clocks with no shared epoch. The
//! controller's plan record and the node's echo replies carry
//! session-relative timestamps, from which each side derives round-trip
//! samples ([`RoundTripSample`]). The node feeds accepted samples into an
//! [`OffsetEstimator`] that slews a correction toward the measured offset
//! a little at a time, so playback never jumps. [`corrected_now`] applies
//! that correction to a raw clock reading.

pub mod estimator;
pub mod health;
pub mod sample;

pub use estimator::{corrected_now, OffsetEstimator};
pub use health::{LinkHealth, SyncStats, MAX_MISSED_ECHOES};
pub use sample::RoundTripSample;
