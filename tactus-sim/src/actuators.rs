//! Recording actuator bank
//!
//! [`RecordingBank`] stands in for the vibration hardware and keeps a log
//! of pulse edges stamped with simulation time. Both devices in a harness
//! log onto the same timeline, which is what makes cross-device pulse
//! alignment measurable.

use tactus_core::config::NUM_FINGERS;
use tactus_core::traits::ActuatorBank;

/// One actuator state change on the simulation timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseEdge {
    /// Simulation time of the edge in microseconds
    pub at_us: u64,
    /// Finger index, 0 to 3
    pub finger: u8,
    /// Drive frequency at the edge, 0.0 on stop
    pub frequency_hz: f32,
    /// True for a pulse start, false for a pulse end
    pub enabled: bool,
}

/// Actuator bank that logs state changes instead of driving hardware.
///
/// Only transitions are logged: re-asserting a state an actuator is
/// already in leaves the record untouched, so a session teardown that
/// sweeps every channel off adds no noise to the timeline.
#[derive(Debug, Default)]
pub struct RecordingBank {
    now_us: u64,
    on: [bool; NUM_FINGERS],
    edges: Vec<PulseEdge>,
}

impl RecordingBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the simulation time stamped onto subsequent edges
    pub fn set_now(&mut self, now_us: u64) {
        self.now_us = now_us;
    }

    /// Every logged edge, oldest first
    pub fn edges(&self) -> &[PulseEdge] {
        &self.edges
    }

    /// Logged pulse starts, oldest first
    pub fn pulse_starts(&self) -> impl Iterator<Item = &PulseEdge> {
        self.edges.iter().filter(|edge| edge.enabled)
    }

    /// Finger currently driven, if any
    pub fn active_finger(&self) -> Option<u8> {
        self.on.iter().position(|&on| on).map(|finger| finger as u8)
    }
}

impl ActuatorBank for RecordingBank {
    fn set_actuator(&mut self, finger: u8, frequency_hz: f32, enabled: bool) {
        let slot = &mut self.on[finger as usize];
        if *slot != enabled {
            self.edges.push(PulseEdge {
                at_us: self.now_us,
                finger,
                frequency_hz,
                enabled,
            });
        }
        *slot = enabled;
    }
}
