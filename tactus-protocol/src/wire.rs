//! Wire-level constants, validation errors, and byte helpers.
//!
//! All multi-byte fields are little-endian. Record sizes are fixed per
//! kind; a received buffer must match its kind's size exactly.

/// Protocol revision carried in every record. Bumped on layout changes so
/// mixed-firmware device pairs reject each other's records instead of
/// misreading them.
pub const PROTOCOL_VERSION: u8 = 0x01;

/// Record kind: stimulation plan, controller → node
pub const RECORD_PLAN: u8 = 0x01;
/// Record kind: timestamp echo, either direction
pub const RECORD_ECHO: u8 = 0x02;

/// Periods carried in one plan record (one full session)
pub const NUM_PERIODS: usize = 20;
/// Actuators addressed per device
pub const NUM_FINGERS: usize = 4;

/// Bytes per serialized period: three delays + frequency + active + finger
pub const PERIOD_WIRE_SIZE: usize = 4 + 4 + 4 + 4 + 1 + 1;

/// KIND + VERSION prefix shared by every record
pub const RECORD_HEADER_SIZE: usize = 2;

/// Complete plan record size in bytes
pub const PLAN_RECORD_SIZE: usize = RECORD_HEADER_SIZE + 8 + 4 + NUM_PERIODS * PERIOD_WIRE_SIZE;

/// Complete echo record size in bytes
pub const ECHO_RECORD_SIZE: usize = RECORD_HEADER_SIZE + 8 + 8;

/// Largest record the protocol produces; sizes receive buffers
pub const MAX_RECORD_SIZE: usize = PLAN_RECORD_SIZE;

/// Errors that can occur during record parsing or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecordError {
    /// Received buffer does not match the record's fixed size
    WrongLength { expected: usize, actual: usize },
    /// First byte names no known record kind
    UnknownKind(u8),
    /// Record was produced by an incompatible protocol revision
    UnsupportedVersion(u8),
    /// Period fields violate the plan invariants (bad active flag, or an
    /// active period addressing a finger that does not exist)
    InvalidPeriod { index: u8 },
    /// Encode target buffer is too small
    BufferTooSmall,
}

pub(crate) fn put_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

pub(crate) fn put_u64(buf: &mut [u8], offset: usize, value: u64) {
    buf[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}

pub(crate) fn put_f32(buf: &mut [u8], offset: usize, value: f32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

pub(crate) fn read_u32(buf: &[u8], offset: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&buf[offset..offset + 4]);
    u32::from_le_bytes(raw)
}

pub(crate) fn read_u64(buf: &[u8], offset: usize) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&buf[offset..offset + 8]);
    u64::from_le_bytes(raw)
}

pub(crate) fn read_f32(buf: &[u8], offset: usize) -> f32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&buf[offset..offset + 4]);
    f32::from_le_bytes(raw)
}

/// Check the `[kind, version]` prefix common to all records.
pub(crate) fn check_header(bytes: &[u8], kind: u8, size: usize) -> Result<(), RecordError> {
    if bytes.len() != size {
        return Err(RecordError::WrongLength {
            expected: size,
            actual: bytes.len(),
        });
    }
    if bytes[0] != kind {
        return Err(RecordError::UnknownKind(bytes[0]));
    }
    if bytes[1] != PROTOCOL_VERSION {
        return Err(RecordError::UnsupportedVersion(bytes[1]));
    }
    Ok(())
}
