//! Round-trip measurement from one echo exchange

/// One clock-offset measurement derived from an echo exchange.
///
/// The four timestamps follow the usual two-way pattern: the local side
/// records send (`t1`) and receive (`t4`) on its own session clock, the
/// peer reports receive (`t2`) and send (`t3`) on its session clock
/// inside the echo record.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RoundTripSample {
    /// Estimated `local - peer` clock offset in microseconds
    pub offset_us: f32,
    /// Round-trip time with peer processing removed, in microseconds
    pub rtt_us: i64,
}

impl RoundTripSample {
    /// Derive offset and round-trip time from one exchange.
    ///
    /// All timestamps are session-relative microseconds; `t1` and `t4`
    /// on the local clock, `t2` and `t3` on the peer clock.
    pub fn from_exchange(t1: u64, t2: u64, t3: u64, t4: u64) -> Self {
        let outbound = t1 as i64 - t2 as i64;
        let inbound = t4 as i64 - t3 as i64;
        let offset_us = (outbound + inbound) as f32 / 2.0;
        let rtt_us = (t4 as i64 - t1 as i64) - (t3 as i64 - t2 as i64);
        Self { offset_us, rtt_us }
    }

    /// Whether this sample came from a coherent, fresh exchange.
    ///
    /// A negative round trip means the reply was paired with the wrong
    /// outbound record (a stale or duplicated echo); an oversized one
    /// means the link was too congested for the offset to be trusted.
    pub fn is_plausible(&self, max_rtt_us: u64) -> bool {
        self.rtt_us >= 0 && self.rtt_us as u64 <= max_rtt_us
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetric_exchange_recovers_offset() {
        // Local clock runs 1000 us ahead of the peer, 500 us latency
        // each way, 200 us peer processing.
        let sample = RoundTripSample::from_exchange(10_000, 9_500, 9_700, 11_200);
        assert_eq!(sample.offset_us, 1000.0);
        assert_eq!(sample.rtt_us, 1000);
        assert!(sample.is_plausible(250_000));
    }

    #[test]
    fn test_peer_ahead_gives_negative_offset() {
        // Peer clock runs 2000 us ahead, 400 us latency, 100 us processing.
        let sample = RoundTripSample::from_exchange(5_000, 7_400, 7_500, 5_900);
        assert_eq!(sample.offset_us, -2000.0);
        assert_eq!(sample.rtt_us, 800);
        assert!(sample.is_plausible(250_000));
    }

    #[test]
    fn test_congested_link_is_implausible() {
        // 150 ms on the wire.
        let sample = RoundTripSample::from_exchange(0, 75_000, 75_000, 300_000);
        assert_eq!(sample.rtt_us, 300_000);
        assert!(!sample.is_plausible(250_000));
        assert!(sample.is_plausible(300_000));
    }

    #[test]
    fn test_stale_reply_is_implausible() {
        // Reply paired with a later outbound stamp than it answered.
        let sample = RoundTripSample::from_exchange(10_000, 0, 100, 9_000);
        assert!(sample.rtt_us < 0);
        assert!(!sample.is_plausible(250_000));
    }
}
