//! Homing reference configuration.

use serde::Deserialize;

use super::units::Hertz;

/// How the potentiometer reading is interpreted while homing.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct HomingConfig {
    /// Step rate of the corrective homing move.
    #[serde(rename = "speed_hz")]
    pub speed: Hertz,

    /// Readings at or below this value mean "at home".
    pub threshold: u16,

    /// Right shift applied to the raw 16-bit ADC sample.
    pub adc_shift: u8,
}

impl HomingConfig {
    /// Scale a raw 16-bit ADC sample to the reference resolution.
    #[inline]
    pub fn scale(&self, raw: u16) -> u16 {
        raw.checked_shr(u32::from(self.adc_shift)).unwrap_or(0)
    }

    /// Check whether a scaled reading indicates the home position.
    #[inline]
    pub fn is_home(&self, reading: u16) -> bool {
        reading <= self.threshold
    }
}

impl Default for HomingConfig {
    fn default() -> Self {
        Self {
            speed: Hertz::from_hz(500),
            threshold: 0,
            adc_shift: 4,
        }
    }
}
