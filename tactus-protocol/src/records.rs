//! Typed records and their fixed byte layouts.
//!
//! Two records cross the link:
//! - `PlanRecord`: the controller's full stimulation plan plus the delayed
//!   start offset. Sent once per session.
//! - `EchoRecord`: a receive/send timestamp pair in session time, sent
//!   periodically by the controller and echoed immediately by the node.

use heapless::Vec;

use crate::wire::{
    check_header, put_f32, put_u32, put_u64, read_f32, read_u32, read_u64, RecordError,
    ECHO_RECORD_SIZE, MAX_RECORD_SIZE, NUM_FINGERS, NUM_PERIODS, PERIOD_WIRE_SIZE,
    PLAN_RECORD_SIZE, PROTOCOL_VERSION, RECORD_ECHO, RECORD_HEADER_SIZE, RECORD_PLAN,
};

/// One scheduled period as carried inside a plan record.
///
/// Field meanings match the playback engine: a period waits `pre_delay_ms`,
/// drives `finger` at `frequency_hz` for `pulse_width_ms`, then waits
/// `post_delay_ms`. Filler periods are inactive with zero widths.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlanPeriod {
    pub pre_delay_ms: f32,
    pub pulse_width_ms: f32,
    pub post_delay_ms: f32,
    pub frequency_hz: f32,
    pub active: bool,
    pub finger: u8,
}

impl PlanPeriod {
    fn write(&self, buf: &mut [u8], offset: usize) {
        put_f32(buf, offset, self.pre_delay_ms);
        put_f32(buf, offset + 4, self.pulse_width_ms);
        put_f32(buf, offset + 8, self.post_delay_ms);
        put_f32(buf, offset + 12, self.frequency_hz);
        buf[offset + 16] = self.active as u8;
        buf[offset + 17] = self.finger;
    }

    fn read(buf: &[u8], offset: usize, index: u8) -> Result<Self, RecordError> {
        let active = match buf[offset + 16] {
            0 => false,
            1 => true,
            _ => return Err(RecordError::InvalidPeriod { index }),
        };
        let finger = buf[offset + 17];
        if active && finger as usize >= NUM_FINGERS {
            return Err(RecordError::InvalidPeriod { index });
        }
        Ok(Self {
            pre_delay_ms: read_f32(buf, offset),
            pulse_width_ms: read_f32(buf, offset + 4),
            post_delay_ms: read_f32(buf, offset + 8),
            frequency_hz: read_f32(buf, offset + 12),
            active,
            finger,
        })
    }
}

/// Complete session plan, controller → node.
///
/// `t_send_us` is the controller's raw clock at transmit, kept for
/// diagnostics; synchronization works on session-relative echo timestamps.
/// On receipt at local time `T` the node arms playback at
/// `T + start_delay_us` and treats `T` as its session epoch.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlanRecord {
    pub t_send_us: u64,
    pub start_delay_us: u32,
    pub periods: [PlanPeriod; NUM_PERIODS],
}

impl PlanRecord {
    /// Encode into a byte buffer, returning the number of bytes written
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, RecordError> {
        if buf.len() < PLAN_RECORD_SIZE {
            return Err(RecordError::BufferTooSmall);
        }
        buf[0] = RECORD_PLAN;
        buf[1] = PROTOCOL_VERSION;
        put_u64(buf, 2, self.t_send_us);
        put_u32(buf, 10, self.start_delay_us);
        let mut offset = RECORD_HEADER_SIZE + 12;
        for period in &self.periods {
            period.write(buf, offset);
            offset += PERIOD_WIRE_SIZE;
        }
        Ok(PLAN_RECORD_SIZE)
    }

    /// Encode into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_RECORD_SIZE>, RecordError> {
        let mut buf = [0u8; MAX_RECORD_SIZE];
        let len = self.encode(&mut buf)?;
        let mut vec = Vec::new();
        vec.extend_from_slice(&buf[..len])
            .map_err(|_| RecordError::BufferTooSmall)?;
        Ok(vec)
    }

    /// Encode into an owned, exactly-sized byte image
    pub fn encode_bytes(&self) -> [u8; PLAN_RECORD_SIZE] {
        let mut buf = [0u8; PLAN_RECORD_SIZE];
        let _ = self.encode(&mut buf);
        buf
    }

    /// Parse from an exact-length byte image, validating period shape
    pub fn parse(bytes: &[u8]) -> Result<Self, RecordError> {
        check_header(bytes, RECORD_PLAN, PLAN_RECORD_SIZE)?;
        let t_send_us = read_u64(bytes, 2);
        let start_delay_us = read_u32(bytes, 10);

        let mut periods = [PlanPeriod::default(); NUM_PERIODS];
        let mut offset = RECORD_HEADER_SIZE + 12;
        for (index, slot) in periods.iter_mut().enumerate() {
            *slot = PlanPeriod::read(bytes, offset, index as u8)?;
            offset += PERIOD_WIRE_SIZE;
        }

        Ok(Self {
            t_send_us,
            start_delay_us,
            periods,
        })
    }
}

/// Receive/send timestamp pair, both in microseconds since the sender's
/// session epoch.
///
/// `recv_session_us` stamps the arrival of the peer's most recent record;
/// `send_session_us` stamps this record's own transmit. Combined with the
/// receiver's matching local stamps these close a four-timestamp exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EchoRecord {
    pub recv_session_us: u64,
    pub send_session_us: u64,
}

impl EchoRecord {
    /// Encode into a byte buffer, returning the number of bytes written
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, RecordError> {
        if buf.len() < ECHO_RECORD_SIZE {
            return Err(RecordError::BufferTooSmall);
        }
        buf[0] = RECORD_ECHO;
        buf[1] = PROTOCOL_VERSION;
        put_u64(buf, 2, self.recv_session_us);
        put_u64(buf, 10, self.send_session_us);
        Ok(ECHO_RECORD_SIZE)
    }

    /// Encode into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_RECORD_SIZE>, RecordError> {
        let mut buf = [0u8; ECHO_RECORD_SIZE];
        let len = self.encode(&mut buf)?;
        let mut vec = Vec::new();
        vec.extend_from_slice(&buf[..len])
            .map_err(|_| RecordError::BufferTooSmall)?;
        Ok(vec)
    }

    /// Encode into an owned, exactly-sized byte image
    pub fn encode_bytes(&self) -> [u8; ECHO_RECORD_SIZE] {
        let mut buf = [0u8; ECHO_RECORD_SIZE];
        let _ = self.encode(&mut buf);
        buf
    }

    /// Parse from an exact-length byte image
    pub fn parse(bytes: &[u8]) -> Result<Self, RecordError> {
        check_header(bytes, RECORD_ECHO, ECHO_RECORD_SIZE)?;
        Ok(Self {
            recv_session_us: read_u64(bytes, 2),
            send_session_us: read_u64(bytes, 10),
        })
    }
}

/// A record parsed off the link, dispatched on its kind byte
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SyncMessage {
    Plan(PlanRecord),
    Echo(EchoRecord),
}

impl SyncMessage {
    /// Parse any known record from its byte image
    pub fn parse(bytes: &[u8]) -> Result<Self, RecordError> {
        let kind = match bytes.first() {
            Some(&kind) => kind,
            None => {
                return Err(RecordError::WrongLength {
                    expected: RECORD_HEADER_SIZE,
                    actual: 0,
                })
            }
        };
        match kind {
            RECORD_PLAN => PlanRecord::parse(bytes).map(SyncMessage::Plan),
            RECORD_ECHO => EchoRecord::parse(bytes).map(SyncMessage::Echo),
            other => Err(RecordError::UnknownKind(other)),
        }
    }

    /// Encode into a byte buffer, returning the number of bytes written
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, RecordError> {
        match self {
            SyncMessage::Plan(plan) => plan.encode(buf),
            SyncMessage::Echo(echo) => echo.encode(buf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pulse_period(finger: u8, pre: f32) -> PlanPeriod {
        PlanPeriod {
            pre_delay_ms: pre,
            pulse_width_ms: 100.0,
            post_delay_ms: 66.5 - pre,
            frequency_hz: 300.0,
            active: true,
            finger,
        }
    }

    fn filler_period(finger: u8) -> PlanPeriod {
        PlanPeriod {
            pre_delay_ms: 166.5,
            pulse_width_ms: 0.0,
            post_delay_ms: 0.0,
            frequency_hz: 300.0,
            active: false,
            finger,
        }
    }

    fn sample_plan() -> PlanRecord {
        let mut periods = [PlanPeriod::default(); NUM_PERIODS];
        for (i, slot) in periods.iter_mut().enumerate() {
            *slot = if i < 12 {
                pulse_period((i % NUM_FINGERS) as u8, 10.5)
            } else {
                filler_period((i % NUM_FINGERS) as u8)
            };
        }
        PlanRecord {
            t_send_us: 123_456_789,
            start_delay_us: 1_000_000,
            periods,
        }
    }

    #[test]
    fn test_echo_layout() {
        let echo = EchoRecord {
            recv_session_us: 0x1122_3344_5566_7788,
            send_session_us: 42,
        };
        let mut buf = [0u8; ECHO_RECORD_SIZE];
        let len = echo.encode(&mut buf).unwrap();

        assert_eq!(len, ECHO_RECORD_SIZE);
        assert_eq!(buf[0], RECORD_ECHO);
        assert_eq!(buf[1], PROTOCOL_VERSION);
        assert_eq!(buf[2], 0x88); // recv, little-endian
        assert_eq!(buf[10], 42); // send, little-endian
    }

    #[test]
    fn test_echo_roundtrip() {
        let echo = EchoRecord {
            recv_session_us: 250_000,
            send_session_us: 250_150,
        };
        let encoded = echo.encode_to_vec().unwrap();
        let parsed = EchoRecord::parse(&encoded).unwrap();
        assert_eq!(parsed, echo);
        assert_eq!(&echo.encode_bytes()[..], &encoded[..]);
    }

    #[test]
    fn test_plan_roundtrip() {
        let plan = sample_plan();
        let encoded = plan.encode_to_vec().unwrap();
        assert_eq!(encoded.len(), PLAN_RECORD_SIZE);

        let parsed = PlanRecord::parse(&encoded).unwrap();
        assert_eq!(parsed, plan);
        assert_eq!(parsed.periods[0].pulse_width_ms, 100.0);
        assert!(parsed.periods[0].active);
        assert!(!parsed.periods[12].active);
    }

    #[test]
    fn test_plan_field_offsets() {
        let plan = sample_plan();
        let encoded = plan.encode_to_vec().unwrap();

        assert_eq!(encoded[0], RECORD_PLAN);
        // t_send_us at [2..10]
        assert_eq!(
            u64::from_le_bytes(encoded[2..10].try_into().unwrap()),
            123_456_789
        );
        // start_delay_us at [10..14]
        assert_eq!(
            u32::from_le_bytes(encoded[10..14].try_into().unwrap()),
            1_000_000
        );
        // first period's pre_delay at [14..18]
        assert_eq!(
            f32::from_le_bytes(encoded[14..18].try_into().unwrap()),
            10.5
        );
    }

    #[test]
    fn test_truncated_plan_rejected() {
        let plan = sample_plan();
        let encoded = plan.encode_to_vec().unwrap();
        let result = PlanRecord::parse(&encoded[..PLAN_RECORD_SIZE - 1]);
        assert_eq!(
            result,
            Err(RecordError::WrongLength {
                expected: PLAN_RECORD_SIZE,
                actual: PLAN_RECORD_SIZE - 1
            })
        );
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let mut encoded = sample_plan().encode_to_vec().unwrap();
        encoded[0] = 0x77;
        assert_eq!(
            SyncMessage::parse(&encoded),
            Err(RecordError::UnknownKind(0x77))
        );
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let mut encoded = sample_plan().encode_to_vec().unwrap();
        encoded[1] = PROTOCOL_VERSION + 1;
        assert_eq!(
            PlanRecord::parse(&encoded),
            Err(RecordError::UnsupportedVersion(PROTOCOL_VERSION + 1))
        );
    }

    #[test]
    fn test_active_period_with_bad_finger_rejected() {
        let mut plan = sample_plan();
        plan.periods[3].finger = NUM_FINGERS as u8;
        let encoded = plan.encode_to_vec().unwrap();
        assert_eq!(
            PlanRecord::parse(&encoded),
            Err(RecordError::InvalidPeriod { index: 3 })
        );
    }

    #[test]
    fn test_inactive_period_finger_unconstrained() {
        // Filler fingers are never driven, so parsing does not bound them
        let mut plan = sample_plan();
        plan.periods[15].finger = 200;
        let encoded = plan.encode_to_vec().unwrap();
        let parsed = PlanRecord::parse(&encoded).unwrap();
        assert_eq!(parsed.periods[15].finger, 200);
    }

    #[test]
    fn test_corrupt_active_flag_rejected() {
        let mut encoded = sample_plan().encode_to_vec().unwrap();
        // active byte of period 0 lives at header(2) + 12 + 16
        encoded[2 + 12 + 16] = 7;
        assert_eq!(
            PlanRecord::parse(&encoded),
            Err(RecordError::InvalidPeriod { index: 0 })
        );
    }

    #[test]
    fn test_sync_message_dispatch() {
        let plan = sample_plan();
        let echo = EchoRecord {
            recv_session_us: 1,
            send_session_us: 2,
        };

        let plan_bytes = plan.encode_to_vec().unwrap();
        let echo_bytes = echo.encode_to_vec().unwrap();

        assert_eq!(
            SyncMessage::parse(&plan_bytes).unwrap(),
            SyncMessage::Plan(plan)
        );
        assert_eq!(
            SyncMessage::parse(&echo_bytes).unwrap(),
            SyncMessage::Echo(echo)
        );
        assert_eq!(
            SyncMessage::parse(&[]),
            Err(RecordError::WrongLength {
                expected: 2,
                actual: 0
            })
        );
    }

    #[test]
    fn test_encode_buffer_too_small() {
        let echo = EchoRecord {
            recv_session_us: 0,
            send_session_us: 0,
        };
        let mut buf = [0u8; ECHO_RECORD_SIZE - 1];
        assert_eq!(echo.encode(&mut buf), Err(RecordError::BufferTooSmall));
    }
}
