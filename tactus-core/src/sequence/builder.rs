//! Plan construction
//!
//! Builds the randomized per-session plan: every block of four active
//! periods covers each finger exactly once in shuffled order, pre/post
//! delays split a fixed jitter budget, and the tail is inactive filler so
//! a subject cannot predict when the last pulse has passed.

use tactus_protocol::{PlanPeriod, PlanRecord};

use super::period::StimulationPeriod;
use crate::config::{SequenceConfig, ACTIVE_PERIODS, ACTIVE_ROUNDS, NUM_FINGERS, NUM_PERIODS};
use crate::rng::SessionRng;

/// Complete plan for one session, immutable once built
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SessionPlan {
    periods: [StimulationPeriod; NUM_PERIODS],
}

impl SessionPlan {
    /// Build a plan from an explicit period array
    pub fn from_periods(periods: [StimulationPeriod; NUM_PERIODS]) -> Self {
        Self { periods }
    }

    /// Build the deterministic plan for `seed` under `config`
    pub fn generate(seed: u64, config: &SequenceConfig) -> Self {
        let mut rng = SessionRng::new(seed);
        PlanBuilder::new(*config).build(&mut rng)
    }

    /// All periods in playback order
    pub fn periods(&self) -> &[StimulationPeriod; NUM_PERIODS] {
        &self.periods
    }

    /// Period at `index`, if within the session
    pub fn get(&self, index: usize) -> Option<&StimulationPeriod> {
        self.periods.get(index)
    }

    /// Package for transmission
    pub fn to_record(&self, t_send_us: u64, start_delay_us: u32) -> PlanRecord {
        let mut periods = [PlanPeriod::default(); NUM_PERIODS];
        for (slot, period) in periods.iter_mut().zip(self.periods.iter()) {
            *slot = (*period).into();
        }
        PlanRecord {
            t_send_us,
            start_delay_us,
            periods,
        }
    }

    /// Rebuild from a received record
    pub fn from_record(record: &PlanRecord) -> Self {
        let mut periods = [StimulationPeriod::default(); NUM_PERIODS];
        for (slot, wire) in periods.iter_mut().zip(record.periods.iter()) {
            *slot = (*wire).into();
        }
        Self { periods }
    }
}

/// Randomized plan builder
///
/// Draw order per active period is fixed (pre-delay, then frequency) so a
/// seed replays to an identical plan everywhere.
#[derive(Debug, Clone)]
pub struct PlanBuilder {
    config: SequenceConfig,
}

impl PlanBuilder {
    /// Create a builder for the given parameters
    pub fn new(config: SequenceConfig) -> Self {
        Self { config }
    }

    /// Draw a complete plan from `rng`
    pub fn build(&self, rng: &mut SessionRng) -> SessionPlan {
        let mut periods = [StimulationPeriod::default(); NUM_PERIODS];

        // Active head: each round covers every finger once, shuffled
        for round in 0..ACTIVE_ROUNDS {
            let mut fingers: [u8; NUM_FINGERS] = core::array::from_fn(|i| i as u8);
            rng.shuffle(&mut fingers);

            for (slot, &finger) in fingers.iter().enumerate() {
                let pre = self.draw_pre_delay(rng);
                let freq = self.draw_frequency(rng);
                let post = self.config.jitter_envelope_ms - pre;
                debug_assert!(post >= 0.0, "pre-delay exceeded jitter envelope");

                periods[round * NUM_FINGERS + slot] = StimulationPeriod::pulse(
                    finger,
                    pre,
                    self.config.pulse_width_ms,
                    post,
                    freq,
                );
            }
        }

        // Inactive tail spans the same time as an active period
        let span = self.config.total_period_ms();
        for slot in periods.iter_mut().skip(ACTIVE_PERIODS) {
            let finger = rng.next_below(NUM_FINGERS as u32) as u8;
            *slot = StimulationPeriod::filler(span, finger);
        }

        SessionPlan::from_periods(periods)
    }

    /// Pre-pulse delay at 0.1 ms resolution in `[0, max_pre_jitter_ms)`
    fn draw_pre_delay(&self, rng: &mut SessionRng) -> f32 {
        if !self.config.jitter_enabled {
            return 0.0;
        }
        let steps = (self.config.max_pre_jitter_ms * 10.0) as u32;
        rng.next_below(steps) as f32 / 10.0
    }

    /// Per-period frequency: configured default, or a whole-Hz draw
    fn draw_frequency(&self, rng: &mut SessionRng) -> f32 {
        if !self.config.freq_random_enabled {
            return self.config.default_freq_hz;
        }
        rng.range_inclusive(self.config.freq_min_hz, self.config.freq_max_hz) as f32
    }
}
