//! Single stimulation period

use tactus_protocol::PlanPeriod;

/// One scheduled slot of a session.
///
/// An active period waits `pre_delay_ms`, drives `finger` at
/// `frequency_hz` for `pulse_width_ms`, then waits `post_delay_ms`. A
/// filler period spends its whole span in the pre-delay with zero widths,
/// keeping session length independent of how many pulses it contains.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StimulationPeriod {
    /// Delay before the pulse (ms)
    pub pre_delay_ms: f32,
    /// Pulse drive time (ms)
    pub pulse_width_ms: f32,
    /// Delay after the pulse (ms)
    pub post_delay_ms: f32,
    /// Actuation frequency (Hz)
    pub frequency_hz: f32,
    /// Whether this period drives an actuator
    pub active: bool,
    /// Target finger index
    pub finger: u8,
}

impl StimulationPeriod {
    /// Create an active pulse period
    pub const fn pulse(
        finger: u8,
        pre_delay_ms: f32,
        pulse_width_ms: f32,
        post_delay_ms: f32,
        frequency_hz: f32,
    ) -> Self {
        Self {
            pre_delay_ms,
            pulse_width_ms,
            post_delay_ms,
            frequency_hz,
            active: true,
            finger,
        }
    }

    /// Create an inactive filler period spanning `span_ms`
    pub const fn filler(span_ms: f32, finger: u8) -> Self {
        Self {
            pre_delay_ms: span_ms,
            pulse_width_ms: 0.0,
            post_delay_ms: 0.0,
            frequency_hz: 0.0,
            active: false,
            finger,
        }
    }

    /// Whether playback should drive an actuator for this period
    pub fn is_playable(&self) -> bool {
        self.active && self.pulse_width_ms > 0.0
    }

    /// Total span of this period (ms)
    pub fn duration_ms(&self) -> f32 {
        self.pre_delay_ms + self.pulse_width_ms + self.post_delay_ms
    }
}

impl From<PlanPeriod> for StimulationPeriod {
    fn from(wire: PlanPeriod) -> Self {
        Self {
            pre_delay_ms: wire.pre_delay_ms,
            pulse_width_ms: wire.pulse_width_ms,
            post_delay_ms: wire.post_delay_ms,
            frequency_hz: wire.frequency_hz,
            active: wire.active,
            finger: wire.finger,
        }
    }
}

impl From<StimulationPeriod> for PlanPeriod {
    fn from(period: StimulationPeriod) -> Self {
        Self {
            pre_delay_ms: period.pre_delay_ms,
            pulse_width_ms: period.pulse_width_ms,
            post_delay_ms: period.post_delay_ms,
            frequency_hz: period.frequency_hz,
            active: period.active,
            finger: period.finger,
        }
    }
}
