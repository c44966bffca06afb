//! Simulated device clocks
//!
//! Each device in a simulation owns a [`DriftingClock`] advanced in lock
//! step with simulation time. The clock applies a constant rate error plus
//! per-step jitter, so two clocks fed identical wall time slowly walk away
//! from each other the way independent crystal oscillators do.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tactus_core::traits::MonotonicClock;

/// Microsecond clock with configurable rate error and tick jitter.
#[derive(Debug, Clone)]
pub struct DriftingClock {
    /// Current reading in microseconds
    now_us: u64,
    /// Rate multiplier, 1.0 is a perfect crystal
    drift_rate: f64,
    /// Uniform jitter applied per advance, in microseconds
    jitter_us: u32,
    /// Sub-microsecond remainder carried between advances
    remainder: f64,
    rng: StdRng,
}

impl DriftingClock {
    /// A clock starting at `start_us` with the given rate error and jitter.
    ///
    /// `drift_rate` scales elapsed time: 1.0001 gains 100 ppm, 0.9999
    /// loses 100 ppm. Jitter is drawn uniformly from `±jitter_us` on every
    /// advance; the reading itself never moves backward.
    pub fn new(start_us: u64, drift_rate: f64, jitter_us: u32, seed: u64) -> Self {
        Self {
            now_us: start_us,
            drift_rate,
            jitter_us,
            remainder: 0.0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// An ideal crystal: no rate error, no jitter
    pub fn perfect(start_us: u64) -> Self {
        Self::new(start_us, 1.0, 0, 0)
    }

    /// Gains 100 ppm with 50 us of tick jitter
    pub fn fast(start_us: u64, seed: u64) -> Self {
        Self::new(start_us, 1.0001, 50, seed)
    }

    /// Loses 100 ppm with 50 us of tick jitter
    pub fn slow(start_us: u64, seed: u64) -> Self {
        Self::new(start_us, 0.9999, 50, seed)
    }

    /// Advance the clock by `dt_us` of true time.
    ///
    /// The reading moves by `dt_us` scaled through the rate error, plus
    /// jitter, with the fractional part carried to the next advance. A
    /// jitter draw that would move the clock backward clamps to zero.
    pub fn advance(&mut self, dt_us: u64) {
        let mut stepped = dt_us as f64 * self.drift_rate + self.remainder;
        if self.jitter_us > 0 {
            let bound = self.jitter_us as i64;
            stepped += self.rng.gen_range(-bound..=bound) as f64;
        }
        if stepped < 0.0 {
            stepped = 0.0;
        }
        let whole = stepped as u64;
        self.remainder = stepped - whole as f64;
        self.now_us += whole;
    }

    /// Current reading in microseconds
    pub fn now_us(&self) -> u64 {
        self.now_us
    }
}

impl MonotonicClock for DriftingClock {
    fn now_us(&self) -> u64 {
        self.now_us
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_clock_tracks_true_time() {
        let mut clock = DriftingClock::perfect(500);
        for _ in 0..1000 {
            clock.advance(1_000);
        }
        assert_eq!(clock.now_us(), 1_000_500);
    }

    #[test]
    fn test_fast_clock_gains_on_true_time() {
        let mut clock = DriftingClock::new(0, 1.0001, 0, 7);
        for _ in 0..1_000_000 {
            clock.advance(10);
        }
        // 10 s of true time at +100 ppm gains about 1 ms.
        let gained = clock.now_us() as i64 - 10_000_000;
        assert!(gained > 900, "gained {gained} us");
        assert!(gained < 1_100, "gained {gained} us");
    }

    #[test]
    fn test_jittery_clock_never_steps_backward() {
        let mut clock = DriftingClock::new(0, 1.0, 500, 99);
        let mut last = clock.now_us();
        for _ in 0..10_000 {
            clock.advance(100);
            assert!(clock.now_us() >= last);
            last = clock.now_us();
        }
    }

    #[test]
    fn test_remainder_carries_sub_microsecond_drift() {
        // 0.5 us of drift per advance must not be lost to truncation.
        let mut clock = DriftingClock::new(0, 1.5, 0, 0);
        clock.advance(1);
        clock.advance(1);
        assert_eq!(clock.now_us(), 3);
    }
}
