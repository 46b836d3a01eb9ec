//! Driver wiring configuration.

use serde::Deserialize;

use super::limits::SoftLimits;
use super::units::Hertz;

/// Step/dir driver configuration from TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MotorConfig {
    /// Invert direction pin logic.
    pub invert_direction: bool,

    /// Driver enable line energizes the motor when driven low.
    pub enable_active_low: bool,

    /// Width of the high phase of a step pulse in microseconds.
    pub pulse_width_us: u32,

    /// Highest step rate a move may request.
    pub max_speed_hz: Option<Hertz>,

    /// Optional soft limits.
    pub limits: Option<SoftLimits>,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            invert_direction: false,
            enable_active_low: true,
            pulse_width_us: 10,
            max_speed_hz: None,
            limits: None,
        }
    }
}
