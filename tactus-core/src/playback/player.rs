//! Pulse playback state machine

use super::command::ActuatorCommand;
use crate::config::NUM_FINGERS;
use crate::sequence::{SessionPlan, StimulationPeriod};

/// Sub-state of the current period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Waiting out the randomized pre-pulse delay
    PreDelay,
    /// Actuator driven
    Pulse,
    /// Waiting out the remaining jitter budget
    PostDelay,
}

/// Plays one session plan against a supplied clock.
///
/// `update` takes the current corrected time in microseconds and performs
/// at most one phase transition, emitting the actuator edge it crossed.
/// A player armed with a start time in the future idles until that time,
/// which is how the delayed session start works on both devices.
#[derive(Debug, Clone)]
pub struct PulsePlayer {
    plan: SessionPlan,
    period_index: u8,
    phase: Phase,
    phase_start_us: u64,
    finger_states: [bool; NUM_FINGERS],
}

impl PulsePlayer {
    /// Create a player armed to begin at `start_at_us`
    pub fn new(plan: SessionPlan, start_at_us: u64) -> Self {
        Self {
            plan,
            period_index: 0,
            phase: Phase::PreDelay,
            phase_start_us: start_at_us,
            finger_states: [false; NUM_FINGERS],
        }
    }

    /// Rewind to the first period, keeping the plan, starting at
    /// `start_at_us`
    pub fn reset(&mut self, start_at_us: u64) {
        self.period_index = 0;
        self.phase = Phase::PreDelay;
        self.phase_start_us = start_at_us;
        self.finger_states = [false; NUM_FINGERS];
    }

    /// Advance playback to `now_us`, emitting at most one actuator edge
    pub fn update(&mut self, now_us: u64) -> Option<ActuatorCommand> {
        let period = *self.plan.get(self.period_index as usize)?;

        // Before the armed start (or after a backward correction) there is
        // nothing to advance
        let elapsed_us = now_us as i64 - self.phase_start_us as i64;
        if elapsed_us < 0 {
            return None;
        }
        let elapsed_ms = elapsed_us as f32 / 1000.0;

        match self.phase {
            Phase::PreDelay => {
                if elapsed_ms >= period.pre_delay_ms {
                    self.phase = Phase::Pulse;
                    self.phase_start_us = now_us;
                    return self.start_pulse(&period);
                }
            }
            Phase::Pulse => {
                if elapsed_ms >= period.pulse_width_ms {
                    self.phase = Phase::PostDelay;
                    self.phase_start_us = now_us;
                    return self.stop_pulse(&period);
                }
            }
            Phase::PostDelay => {
                if elapsed_ms >= period.post_delay_ms {
                    self.period_index += 1;
                    self.phase = Phase::PreDelay;
                    self.phase_start_us = now_us;
                }
            }
        }

        None
    }

    /// Whether every period has been played; latches until [`reset`]
    ///
    /// [`reset`]: Self::reset
    pub fn is_finished(&self) -> bool {
        self.period_index as usize >= crate::config::NUM_PERIODS
    }

    /// Whether the current period is live stimulation rather than filler
    pub fn is_active(&self) -> bool {
        self.current_period().map(|p| p.active).unwrap_or(false)
    }

    /// Current playback phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Index of the period being played
    pub fn period_index(&self) -> u8 {
        self.period_index
    }

    /// Period being played, if the session is not finished
    pub fn current_period(&self) -> Option<&StimulationPeriod> {
        self.plan.get(self.period_index as usize)
    }

    /// Finger currently driven, if any
    pub fn active_finger(&self) -> Option<u8> {
        self.finger_states
            .iter()
            .position(|&on| on)
            .map(|i| i as u8)
    }

    /// The plan this player is executing
    pub fn plan(&self) -> &SessionPlan {
        &self.plan
    }

    fn start_pulse(&mut self, period: &StimulationPeriod) -> Option<ActuatorCommand> {
        if !period.is_playable() || period.finger as usize >= NUM_FINGERS {
            return None;
        }
        // Exactly one finger at a time
        self.finger_states = [false; NUM_FINGERS];
        self.finger_states[period.finger as usize] = true;
        Some(ActuatorCommand::start(period.finger, period.frequency_hz))
    }

    fn stop_pulse(&mut self, period: &StimulationPeriod) -> Option<ActuatorCommand> {
        if !period.is_playable() || period.finger as usize >= NUM_FINGERS {
            return None;
        }
        self.finger_states[period.finger as usize] = false;
        Some(ActuatorCommand::stop(period.finger, period.frequency_hz))
    }
}
