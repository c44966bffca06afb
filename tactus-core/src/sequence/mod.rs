//! Stimulation sequence generation
//!
//! A session is a fixed-length array of periods: three shuffled passes
//! over the finger set followed by inactive filler, with randomized timing
//! jitter inside a constant per-period span. Plans are deterministic in
//! the seed and immutable once built.

pub mod builder;
pub mod period;

pub use builder::{PlanBuilder, SessionPlan};
pub use period::StimulationPeriod;
