//! Configuration type definitions
//!
//! These types carry the tunable parameters of a stimulation session.
//! Defaults reproduce the study configuration; user adjustments are stored
//! as a postcard-serialized settings blob (see [`super::persist`]).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use tactus_protocol::{NUM_FINGERS, NUM_PERIODS};

/// Passes over the full finger set at the head of every plan
pub const ACTIVE_ROUNDS: usize = 3;

/// Active periods per plan; the remainder up to [`NUM_PERIODS`] is filler
pub const ACTIVE_PERIODS: usize = ACTIVE_ROUNDS * NUM_FINGERS;

/// Pulse drive time per active period (ms)
pub const PULSE_WIDTH_MS: f32 = 100.0;

/// Upper bound of the randomized pre-pulse delay (ms, exclusive)
pub const MAX_PRE_JITTER_MS: f32 = 31.5;

/// Combined pre+post delay budget per active period (ms)
pub const MAX_JITTER_MS: f32 = 66.5;

/// Full span of one period, pulse plus delay budget (ms)
pub const TOTAL_TIME_MS: f32 = PULSE_WIDTH_MS + MAX_JITTER_MS;

/// Actuation frequency when randomization is off (Hz)
pub const DEFAULT_FREQ_HZ: f32 = 300.0;

/// Smoothing gain applied per tick when pulling toward a pending offset
pub const DEFAULT_PULL_RATE: f32 = 0.02;

/// Largest move a single sample may apply to the pending offset (µs)
pub const MAX_OFFSET_STEP_US: f32 = 2000.0;

/// Errors detected during configuration validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Pulse width must be positive
    InvalidPulseWidth,
    /// Jitter bounds must be non-negative
    NegativeJitter,
    /// Pre-pulse jitter cannot exceed the pre+post budget, or post delays
    /// would go negative
    JitterExceedsEnvelope,
    /// Frequency range empty, inverted, or containing zero
    InvalidFrequencyRange,
    /// Pull rate must lie in (0, 1]
    InvalidPullRate,
    /// Offset step clamp must be positive
    InvalidOffsetStep,
    /// Echo interval must be positive and shorter than the link timeout
    InvalidEchoTiming,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Debug::fmt(self, f)
    }
}

impl core::error::Error for ConfigError {}

/// Parameters of the randomized sequence builder
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SequenceConfig {
    /// Randomize the pre-pulse delay of each active period
    pub jitter_enabled: bool,
    /// Exclusive upper bound of the pre-pulse delay (ms)
    pub max_pre_jitter_ms: f32,
    /// Fixed pre+post delay budget per active period (ms)
    pub jitter_envelope_ms: f32,
    /// Pulse drive time (ms)
    pub pulse_width_ms: f32,
    /// Draw an actuation frequency per period instead of the default
    pub freq_random_enabled: bool,
    /// Lowest randomized frequency (Hz, inclusive)
    pub freq_min_hz: u32,
    /// Highest randomized frequency (Hz, inclusive)
    pub freq_max_hz: u32,
    /// Actuation frequency when randomization is off (Hz)
    pub default_freq_hz: f32,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            jitter_enabled: true,
            max_pre_jitter_ms: MAX_PRE_JITTER_MS,
            jitter_envelope_ms: MAX_JITTER_MS,
            pulse_width_ms: PULSE_WIDTH_MS,
            freq_random_enabled: false,
            freq_min_hz: 80,
            freq_max_hz: 10_000,
            default_freq_hz: DEFAULT_FREQ_HZ,
        }
    }
}

impl SequenceConfig {
    /// Full span of one period: pulse width plus the delay budget (ms).
    /// Filler periods idle for exactly this long.
    pub fn total_period_ms(&self) -> f32 {
        self.pulse_width_ms + self.jitter_envelope_ms
    }

    /// Check parameter consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.pulse_width_ms > 0.0) {
            return Err(ConfigError::InvalidPulseWidth);
        }
        if self.max_pre_jitter_ms < 0.0 || self.jitter_envelope_ms < 0.0 {
            return Err(ConfigError::NegativeJitter);
        }
        if self.max_pre_jitter_ms > self.jitter_envelope_ms {
            return Err(ConfigError::JitterExceedsEnvelope);
        }
        if self.freq_min_hz == 0 || self.freq_min_hz > self.freq_max_hz {
            return Err(ConfigError::InvalidFrequencyRange);
        }
        if !(self.default_freq_hz > 0.0) {
            return Err(ConfigError::InvalidFrequencyRange);
        }
        Ok(())
    }
}

/// Parameters of the clock-offset estimator and echo exchange
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SyncConfig {
    /// Fraction of the pending offset applied per tick
    pub pull_rate: f32,
    /// Largest pending-offset move per accepted sample (µs)
    pub max_step_us: f32,
    /// Controller echo transmit period (ms)
    pub echo_interval_ms: u32,
    /// Round trips longer than this are treated as stale and rejected (µs)
    pub max_rtt_us: u64,
    /// Silence on the link longer than this counts as a missed window (ms)
    pub echo_timeout_ms: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            pull_rate: DEFAULT_PULL_RATE,
            max_step_us: MAX_OFFSET_STEP_US,
            echo_interval_ms: 100,
            max_rtt_us: 250_000,
            echo_timeout_ms: 3000,
        }
    }
}

impl SyncConfig {
    /// Check parameter consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.pull_rate > 0.0 && self.pull_rate <= 1.0) {
            return Err(ConfigError::InvalidPullRate);
        }
        if !(self.max_step_us > 0.0) {
            return Err(ConfigError::InvalidOffsetStep);
        }
        if self.echo_interval_ms == 0 || self.echo_timeout_ms < self.echo_interval_ms {
            return Err(ConfigError::InvalidEchoTiming);
        }
        Ok(())
    }
}

/// Complete per-session configuration for either device role
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SessionConfig {
    /// Sequence builder parameters
    pub sequence: SequenceConfig,
    /// Offset estimation parameters
    pub sync: SyncConfig,
    /// Delay between plan transmission and the first period (µs)
    pub start_delay_us: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sequence: SequenceConfig::default(),
            sync: SyncConfig::default(),
            start_delay_us: 1_000_000,
        }
    }
}

impl SessionConfig {
    /// Check parameter consistency of all sections
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sequence.validate()?;
        self.sync.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SessionConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.sequence.total_period_ms(), TOTAL_TIME_MS);
        assert_eq!(config.start_delay_us, 1_000_000);
    }

    #[test]
    fn test_active_period_split() {
        assert_eq!(ACTIVE_PERIODS, 12);
        assert!(ACTIVE_PERIODS < NUM_PERIODS);
    }

    #[test]
    fn test_jitter_exceeding_envelope_rejected() {
        let config = SequenceConfig {
            max_pre_jitter_ms: 70.0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::JitterExceedsEnvelope));
    }

    #[test]
    fn test_zero_pulse_width_rejected() {
        let config = SequenceConfig {
            pulse_width_ms: 0.0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidPulseWidth));
    }

    #[test]
    fn test_inverted_frequency_range_rejected() {
        let config = SequenceConfig {
            freq_random_enabled: true,
            freq_min_hz: 500,
            freq_max_hz: 80,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidFrequencyRange));
    }

    #[test]
    fn test_pull_rate_bounds() {
        let mut config = SyncConfig::default();
        config.pull_rate = 0.0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidPullRate));

        config.pull_rate = 1.5;
        assert_eq!(config.validate(), Err(ConfigError::InvalidPullRate));

        config.pull_rate = 1.0;
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_echo_timing_rejected_when_timeout_short() {
        let config = SyncConfig {
            echo_interval_ms: 500,
            echo_timeout_ms: 400,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidEchoTiming));
    }
}
