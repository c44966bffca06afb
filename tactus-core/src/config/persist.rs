//! Persisted settings blob
//!
//! Devices keep user-adjusted session parameters across power cycles as a
//! postcard-serialized blob with a magic/version header and a CRC over the
//! parameter fields. A blob that fails any check is rejected and the
//! caller falls back to `SessionConfig::default()`.

use serde::{Deserialize, Serialize};

use super::types::{ConfigError, SessionConfig};

/// Magic number identifying a Tactus settings blob
pub const SETTINGS_MAGIC: u32 = 0x5441_4354; // "TACT"

/// Current settings blob version
pub const SETTINGS_VERSION: u8 = 1;

/// Upper bound on the encoded blob size; sizes storage buffers
pub const SETTINGS_BLOB_MAX: usize = 96;

/// Errors raised while saving or loading the settings blob
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SettingsError {
    /// Encode target buffer too small or serialization failed
    Encode,
    /// Blob bytes are not a well-formed settings record
    Decode,
    /// Blob was not written by this firmware family
    BadMagic,
    /// Blob layout version is not understood
    UnsupportedVersion,
    /// Field checksum does not match the stored one
    ChecksumMismatch,
    /// Stored parameters fail validation
    Invalid(ConfigError),
}

/// Settings blob as written to storage
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StoredSettings {
    /// Magic number for validation
    pub magic: u32,
    /// Blob format version
    pub version: u8,
    /// The persisted session parameters
    pub config: SessionConfig,
    /// CRC32 over the parameter fields
    pub crc: u32,
}

impl StoredSettings {
    /// Wrap a configuration for storage, computing its checksum
    pub fn new(config: SessionConfig) -> Self {
        let mut stored = Self {
            magic: SETTINGS_MAGIC,
            version: SETTINGS_VERSION,
            config,
            crc: 0,
        };
        stored.crc = stored.calculate_crc();
        stored
    }

    /// CRC32 over every parameter field, in declaration order
    pub fn calculate_crc(&self) -> u32 {
        let seq = &self.config.sequence;
        let sync = &self.config.sync;
        let mut crc: u32 = 0xFFFF_FFFF;

        crc = crc32_update(crc, &[seq.jitter_enabled as u8]);
        crc = crc32_update(crc, &seq.max_pre_jitter_ms.to_le_bytes());
        crc = crc32_update(crc, &seq.jitter_envelope_ms.to_le_bytes());
        crc = crc32_update(crc, &seq.pulse_width_ms.to_le_bytes());
        crc = crc32_update(crc, &[seq.freq_random_enabled as u8]);
        crc = crc32_update(crc, &seq.freq_min_hz.to_le_bytes());
        crc = crc32_update(crc, &seq.freq_max_hz.to_le_bytes());
        crc = crc32_update(crc, &seq.default_freq_hz.to_le_bytes());

        crc = crc32_update(crc, &sync.pull_rate.to_le_bytes());
        crc = crc32_update(crc, &sync.max_step_us.to_le_bytes());
        crc = crc32_update(crc, &sync.echo_interval_ms.to_le_bytes());
        crc = crc32_update(crc, &sync.max_rtt_us.to_le_bytes());
        crc = crc32_update(crc, &sync.echo_timeout_ms.to_le_bytes());

        crc = crc32_update(crc, &self.config.start_delay_us.to_le_bytes());

        !crc
    }

    /// Serialize into `buf`, returning the encoded length
    pub fn save(&self, buf: &mut [u8]) -> Result<usize, SettingsError> {
        let used = postcard::to_slice(self, buf).map_err(|_| SettingsError::Encode)?;
        Ok(used.len())
    }

    /// Deserialize and fully validate a blob, yielding its configuration
    pub fn load(bytes: &[u8]) -> Result<SessionConfig, SettingsError> {
        let stored: StoredSettings =
            postcard::from_bytes(bytes).map_err(|_| SettingsError::Decode)?;

        if stored.magic != SETTINGS_MAGIC {
            return Err(SettingsError::BadMagic);
        }
        if stored.version != SETTINGS_VERSION {
            return Err(SettingsError::UnsupportedVersion);
        }
        if stored.crc != stored.calculate_crc() {
            return Err(SettingsError::ChecksumMismatch);
        }
        stored.config.validate().map_err(SettingsError::Invalid)?;

        Ok(stored.config)
    }
}

/// CRC32 update (IEEE 802.3 polynomial), bitwise
fn crc32_update(crc: u32, data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB8_8320;
    let mut crc = crc;

    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }

    crc
}
