//! Record-channel health tracking

use super::sample::RoundTripSample;

/// Missed echo windows before the link is considered lost
pub const MAX_MISSED_ECHOES: u8 = 3;

/// Tracks whether the peer is still answering echo records.
///
/// Counts timeout windows in which no echo arrived. Any received echo
/// clears the count, so a link only goes unhealthy after several silent
/// windows in a row.
#[derive(Debug, Clone)]
pub struct LinkHealth {
    /// Length of one silent window before it counts as missed (us)
    timeout_us: u64,
    /// Session time the current window opened (us)
    window_start_us: u64,
    /// Silent windows since the last echo
    missed_echoes: u8,
}

impl LinkHealth {
    /// Create a tracker with its window opening at session time zero
    pub fn new(timeout_ms: u32) -> Self {
        Self {
            timeout_us: timeout_ms as u64 * 1000,
            window_start_us: 0,
            missed_echoes: 0,
        }
    }

    /// Record an echo received at `now_us` session time
    pub fn echo_received(&mut self, now_us: u64) {
        self.missed_echoes = 0;
        self.window_start_us = now_us;
    }

    /// Advance the window clock to `now_us` session time
    pub fn update(&mut self, now_us: u64) {
        if now_us.saturating_sub(self.window_start_us) >= self.timeout_us {
            self.missed_echoes = self.missed_echoes.saturating_add(1);
            self.window_start_us = now_us;
        }
    }

    /// Whether the peer has answered recently enough
    pub fn is_link_healthy(&self) -> bool {
        self.missed_echoes < MAX_MISSED_ECHOES
    }

    /// Silent windows since the last echo
    pub fn missed_echoes(&self) -> u8 {
        self.missed_echoes
    }
}

/// Running counters for the sync exchange on one device
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SyncStats {
    /// Samples that passed the round-trip gate
    pub samples_accepted: u32,
    /// Samples rejected as stale or congested
    pub samples_rejected: u32,
    /// Echo records sent
    pub echoes_sent: u32,
    /// Transport send errors, echoes and plans both
    pub send_failures: u32,
    /// Offset from the most recent accepted sample (us)
    pub last_offset_us: f32,
    /// Round trip from the most recent accepted sample (us)
    pub last_rtt_us: i64,
}

impl SyncStats {
    /// Count an accepted sample and remember its measurements
    pub fn record_accepted(&mut self, sample: &RoundTripSample) {
        self.samples_accepted = self.samples_accepted.saturating_add(1);
        self.last_offset_us = sample.offset_us;
        self.last_rtt_us = sample.rtt_us;
    }

    /// Count a sample that failed the round-trip gate
    pub fn record_rejected(&mut self) {
        self.samples_rejected = self.samples_rejected.saturating_add(1);
    }

    /// Count an echo handed to the transport
    pub fn record_sent(&mut self) {
        self.echoes_sent = self.echoes_sent.saturating_add(1);
    }

    /// Count a transport send error
    pub fn record_send_failure(&mut self) {
        self.send_failures = self.send_failures.saturating_add(1);
    }
}
