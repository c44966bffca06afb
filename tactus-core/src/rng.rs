//! Deterministic random number generator
//!
//! Uses a simple xorshift64 algorithm for reproducibility across platforms:
//! the same seed produces the same stimulation plan on the controller, the
//! host simulator, and in tests. Bounded draws use rejection sampling so
//! shuffles stay unbiased.

/// A deterministic per-session random number generator
#[derive(Debug, Clone)]
pub struct SessionRng {
    state: u64,
}

impl SessionRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u64) -> Self {
        // xorshift requires non-zero state
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate the next raw u64 value
    pub fn next_u64(&mut self) -> u64 {
        // xorshift64
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Generate a random u32
    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    /// Generate a uniform value in `[0, bound)` without modulo bias
    pub fn next_below(&mut self, bound: u32) -> u32 {
        if bound <= 1 {
            return 0;
        }
        // Reject draws beyond the largest multiple of `bound` in u32 range
        let limit = u32::MAX - (u32::MAX % bound);
        loop {
            let value = self.next_u32();
            if value < limit {
                return value % bound;
            }
        }
    }

    /// Generate a uniform value in `[min, max]` inclusive
    pub fn range_inclusive(&mut self, min: u32, max: u32) -> u32 {
        debug_assert!(min <= max);
        min + self.next_below(max - min + 1)
    }

    /// Shuffle a slice in place (Fisher-Yates)
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = self.next_below(i as u32 + 1) as usize;
            slice.swap(i, j);
        }
    }
}
