//! Phase-based pulse playback
//!
//! Walks a session plan against corrected local time and emits actuator
//! commands at phase boundaries. The player holds its own copy of the
//! plan; applying clock corrections is the caller's job, the player just
//! compares timestamps it is given.

pub mod command;
pub mod player;

pub use command::ActuatorCommand;
pub use player::{Phase, PulsePlayer};
