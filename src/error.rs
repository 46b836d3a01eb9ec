//! Error types for stepper-server.
//!
//! Provides unified error handling across configuration, the motion engine,
//! the request protocol and the hardware collaborators.

use core::fmt;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all stepper-server operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration parsing or validation error
    Config(ConfigError),
    /// Motion engine error
    Motor(MotorError),
    /// Request parsing or routing error
    Protocol(ProtocolError),
    /// Sensor or output pin not accessible
    Hardware(HardwareError),
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// Homing speed exceeds the configured step-rate ceiling
    InvalidHomingSpeed(i64),
    /// Listener port must be non-zero
    InvalidPort(u16),
    /// Two listeners share a port
    DuplicatePort(u16),
    /// At least one listener is required
    NoListeners,
    /// A required engine part was not supplied to the builder
    MissingPart(&'static str),
    /// Invalid soft limits (min must be < max)
    InvalidSoftLimits {
        /// Minimum limit value
        min: i64,
        /// Maximum limit value
        max: i64,
    },
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

/// Motion engine errors.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorError {
    /// Step frequency is zero, negative, or above the configured maximum
    InvalidFrequency(i64),
    /// Step count is negative
    InvalidSteps(i64),
    /// Distance of a single move exceeds `u32::MAX` steps
    TooManySteps(u64),
    /// Pin operation failed
    PinError,
    /// Reference is not at home although the logical position is already zero
    NotHomed {
        /// Scaled reference reading
        reading: u16,
    },
    /// Target position exceeds soft limits
    LimitExceeded {
        /// Requested position
        position: i64,
        /// Limit that was exceeded (min or max)
        limit: i64,
    },
}

/// Request protocol errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolError {
    /// Malformed request, missing field or non-numeric value
    BadRequest(heapless::String<128>),
    /// No route serves the requested method and path
    NotFound(heapless::String<64>),
}

/// Hardware collaborator errors.
#[derive(Debug, Clone, PartialEq)]
pub enum HardwareError {
    /// Reference sensor or output not accessible
    Unavailable(heapless::String<32>),
}

impl ProtocolError {
    /// Build a `BadRequest` from any displayable cause, truncating long messages.
    pub fn bad_request(cause: impl fmt::Display) -> Self {
        ProtocolError::BadRequest(truncated(cause))
    }
}

impl HardwareError {
    /// Build an `Unavailable` error naming the missing device.
    pub fn unavailable(device: &str) -> Self {
        HardwareError::Unavailable(truncated(device))
    }
}

/// Format `value` into a fixed-capacity string, dropping what does not fit.
pub(crate) fn truncated<const N: usize>(value: impl fmt::Display) -> heapless::String<N> {
    struct Truncate<'a, const N: usize>(&'a mut heapless::String<N>);

    impl<const N: usize> fmt::Write for Truncate<'_, N> {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            for c in s.chars() {
                if self.0.push(c).is_err() {
                    break;
                }
            }
            Ok(())
        }
    }

    let mut out = heapless::String::new();
    let _ = fmt::write(&mut Truncate(&mut out), format_args!("{}", value));
    out
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Motor(e) => write!(f, "{}", e),
            Error::Protocol(e) => write!(f, "{}", e),
            Error::Hardware(e) => write!(f, "{}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::InvalidHomingSpeed(v) => {
                write!(f, "Invalid homing speed: {} Hz exceeds max_speed_hz", v)
            }
            ConfigError::InvalidPort(p) => write!(f, "Invalid listener port: {}", p),
            ConfigError::DuplicatePort(p) => write!(f, "Duplicate listener port: {}", p),
            ConfigError::NoListeners => write!(f, "At least one listener is required"),
            ConfigError::MissingPart(part) => write!(f, "{} is required", part),
            ConfigError::InvalidSoftLimits { min, max } => {
                write!(f, "Invalid soft limits: min ({}) must be < max ({})", min, max)
            }
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for MotorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotorError::InvalidFrequency(hz) => write!(f, "Invalid step frequency: {} Hz", hz),
            MotorError::InvalidSteps(steps) => {
                write!(f, "Invalid step count: {}. Must be >= 0", steps)
            }
            MotorError::TooManySteps(steps) => {
                write!(f, "Move of {} steps is too large, at most {} per move", steps, u32::MAX)
            }
            MotorError::PinError => write!(f, "GPIO pin operation failed"),
            MotorError::NotHomed { reading } => {
                write!(f, "Reference reads {} at position 0, home not found", reading)
            }
            MotorError::LimitExceeded { position, limit } => {
                write!(f, "Position {} exceeds limit {}", position, limit)
            }
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::BadRequest(msg) => write!(f, "{}", msg),
            ProtocolError::NotFound(route) => write!(f, "No route for {}", route),
        }
    }
}

impl fmt::Display for HardwareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HardwareError::Unavailable(device) => write!(f, "{} unavailable", device),
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<MotorError> for Error {
    fn from(e: MotorError) -> Self {
        Error::Motor(e)
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Error::Protocol(e)
    }
}

impl From<HardwareError> for Error {
    fn from(e: HardwareError) -> Self {
        Error::Hardware(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for MotorError {}

#[cfg(feature = "std")]
impl std::error::Error for ProtocolError {}

#[cfg(feature = "std")]
impl std::error::Error for HardwareError {}
