//! Actuator commands emitted by the player

/// One edge of a pulse: start or stop driving a finger.
///
/// Commands carry the actuation frequency both ways so drivers that
/// program a PWM channel per call never need to look anything up.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActuatorCommand {
    /// Target finger index
    pub finger: u8,
    /// Actuation frequency (Hz)
    pub frequency_hz: f32,
    /// true to start driving, false to stop
    pub enabled: bool,
}

impl ActuatorCommand {
    /// Start driving a finger
    pub const fn start(finger: u8, frequency_hz: f32) -> Self {
        Self {
            finger,
            frequency_hz,
            enabled: true,
        }
    }

    /// Stop driving a finger
    pub const fn stop(finger: u8, frequency_hz: f32) -> Self {
        Self {
            finger,
            frequency_hz,
            enabled: false,
        }
    }
}
