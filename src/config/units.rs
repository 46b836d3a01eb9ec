//! Unit types for physical quantities.
//!
//! Step counts and step rates are kept as distinct types so a frequency can
//! never be passed where a distance is expected.

use core::ops::{Add, Sub};

use serde::Deserialize;

use crate::error::MotorError;

/// Motor position in steps (absolute from home).
///
/// Uses i64 for unlimited range in either direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(transparent)]
pub struct Steps(pub i64);

impl Steps {
    /// Create a new Steps value.
    #[inline]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> i64 {
        self.0
    }

    /// Get absolute value as u64.
    #[inline]
    pub fn abs(self) -> u64 {
        self.0.unsigned_abs()
    }
}

impl Add for Steps {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Steps {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

/// Step rate in pulses per second.
///
/// Only constructible from a positive value, so an armed timer always has a
/// period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Hertz(u32);

impl Hertz {
    /// Lowest representable rate, one step per second.
    pub const MIN: Self = Self(1);

    /// Build a rate from a constant; zero is raised to [`Hertz::MIN`].
    #[inline]
    pub const fn from_hz(hz: u32) -> Self {
        if hz == 0 {
            Self::MIN
        } else {
            Self(hz)
        }
    }

    /// Validate a caller-supplied frequency.
    ///
    /// # Errors
    ///
    /// Returns `MotorError::InvalidFrequency` if `hz` is zero, negative, or
    /// does not fit in a `u32`.
    pub fn new(hz: i64) -> Result<Self, MotorError> {
        match u32::try_from(hz) {
            Ok(v) if v > 0 => Ok(Self(v)),
            _ => Err(MotorError::InvalidFrequency(hz)),
        }
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Period between two ticks in nanoseconds.
    #[inline]
    pub const fn period_ns(self) -> u64 {
        1_000_000_000 / self.0 as u64
    }
}

impl<'de> Deserialize<'de> for Hertz {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use core::fmt::Write;
        let value = i64::deserialize(deserializer)?;
        Hertz::new(value).map_err(|e| {
            let mut buf = heapless::String::<64>::new();
            let _ = write!(buf, "{}", e);
            serde::de::Error::custom(buf.as_str())
        })
    }
}
