//! Collaborator traits
//!
//! These traits define the seams between the engine and its environment:
//! the monotonic clock, the per-finger actuator bank, and the record
//! transport. Board and radio specifics live behind them.

pub mod actuator;
pub mod clock;
pub mod transport;

pub use actuator::ActuatorBank;
pub use clock::MonotonicClock;
pub use transport::Transport;
