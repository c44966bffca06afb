//! Controller and node session drivers
//!
//! A session pairs one [`ControllerSession`] with one [`NodeSession`]
//! over a [`Transport`](crate::traits::Transport). The controller
//! generates the plan, sends it with a delayed start, and keeps the echo
//! exchange running; the node arms playback from the received plan,
//! answers every echo, and slews its session clock onto the controller's.
//! Both sides drive their own actuators from the shared timeline, so the
//! two devices pulse together without ever sharing a wall clock.
//!
//! Drivers are polled: call `tick` with the local monotonic clock at the
//! firmware's loop cadence. All transport and actuator access goes
//! through the injected trait objects, nothing global.

pub mod controller;
pub mod events;
pub mod node;

pub use controller::ControllerSession;
pub use events::{SessionEvent, SessionState, EVENT_QUEUE_DEPTH};
pub use node::NodeSession;
