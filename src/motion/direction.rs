//! Direction of motor motion.

use crate::error::{ProtocolError, Result};

/// Direction of motor motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Clockwise / forward (positive step count, wire value 1).
    #[default]
    Clockwise,
    /// Counter-clockwise / reverse (negative step count, wire value 0).
    CounterClockwise,
}

impl Direction {
    /// Get direction from signed step count.
    #[inline]
    pub fn from_steps(steps: i64) -> Self {
        if steps >= 0 {
            Direction::Clockwise
        } else {
            Direction::CounterClockwise
        }
    }

    /// Decode the wire value (`1` clockwise, `0` counter-clockwise).
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::BadRequest` for any other value.
    pub fn from_wire(value: i64) -> Result<Self> {
        match value {
            1 => Ok(Direction::Clockwise),
            0 => Ok(Direction::CounterClockwise),
            other => Err(ProtocolError::bad_request(format_args!(
                "direction must be 0 or 1, got {}",
                other
            ))
            .into()),
        }
    }

    /// Wire value (`1` clockwise, `0` counter-clockwise).
    #[inline]
    pub fn wire(self) -> u8 {
        match self {
            Direction::Clockwise => 1,
            Direction::CounterClockwise => 0,
        }
    }

    /// Get the sign multiplier.
    #[inline]
    pub fn sign(self) -> i64 {
        match self {
            Direction::Clockwise => 1,
            Direction::CounterClockwise => -1,
        }
    }

    /// Short label used on the status display.
    #[inline]
    pub fn label(self) -> &'static str {
        match self {
            Direction::Clockwise => "CW",
            Direction::CounterClockwise => "CCW",
        }
    }
}
