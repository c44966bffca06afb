//! Host-side simulation of a two-device Tactus deployment.
//!
//! The firmware crates are polled state machines with every hardware
//! dependency behind a trait, so a full controller/node pair can run on a
//! workstation against simulated clocks and a simulated radio link. The
//! pieces here supply those stand-ins:
//!
//! - [`DriftingClock`]: a microsecond clock with configurable rate error
//!   and tick jitter
//! - [`SimLink`]: a bidirectional record link with latency, jitter and
//!   packet loss
//! - [`RecordingBank`]: an actuator bank that logs pulse edges on a shared
//!   simulation timeline
//! - [`SyncHarness`]: wires one controller and one node together and
//!   measures how well their pulse timelines line up

pub mod actuators;
pub mod clock;
pub mod harness;
pub mod link;

pub use actuators::{PulseEdge, RecordingBank};
pub use clock::DriftingClock;
pub use harness::{AlignmentReport, Role, SimError, SyncHarness, TimedEvent};
pub use link::{LinkConfig, LinkEndpoint, LinkError, LinkStats, SimLink};
