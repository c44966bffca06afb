//! Actuator bank trait

use crate::config::NUM_FINGERS;

/// Driver for the per-finger vibration actuators.
///
/// Implementations map a finger index to whatever produces the vibration
/// (PWM channel, haptic driver chip, or a recording stub in tests). The
/// engine guarantees `finger < NUM_FINGERS` and drives at most one finger
/// at a time.
pub trait ActuatorBank {
    /// Drive one actuator at the given frequency, or stop it
    fn set_actuator(&mut self, finger: u8, frequency_hz: f32, enabled: bool);

    /// Stop every actuator
    fn all_off(&mut self) {
        for finger in 0..NUM_FINGERS as u8 {
            self.set_actuator(finger, 0.0, false);
        }
    }
}
