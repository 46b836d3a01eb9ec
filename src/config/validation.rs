//! Configuration validation.

use crate::error::{ConfigError, Error, Result};

use super::SystemConfig;

/// Validate a system configuration.
///
/// Checks:
/// - Soft limits are valid (min < max)
/// - The homing speed does not exceed the step-rate ceiling
/// - At least one listener exists
/// - Listener ports are non-zero and unique
pub fn validate_config(config: &SystemConfig) -> Result<()> {
    validate_motor(&config.motor)?;
    validate_homing(config)?;
    validate_server(&config.server)?;
    Ok(())
}

fn validate_motor(config: &super::MotorConfig) -> Result<()> {
    // Soft limits: min must be < max
    if let Some(ref limits) = config.limits {
        if !limits.is_valid() {
            return Err(Error::Config(ConfigError::InvalidSoftLimits {
                min: limits.min_steps,
                max: limits.max_steps,
            }));
        }
    }

    Ok(())
}

fn validate_homing(config: &SystemConfig) -> Result<()> {
    if let Some(max) = config.motor.max_speed_hz {
        if config.homing.speed > max {
            return Err(Error::Config(ConfigError::InvalidHomingSpeed(i64::from(
                config.homing.speed.value(),
            ))));
        }
    }
    Ok(())
}

fn validate_server(config: &super::ServerConfig) -> Result<()> {
    if config.listeners.is_empty() {
        return Err(Error::Config(ConfigError::NoListeners));
    }

    for (i, listener) in config.listeners.iter().enumerate() {
        if listener.port == 0 {
            return Err(Error::Config(ConfigError::InvalidPort(listener.port)));
        }
        if config.listeners[..i].iter().any(|l| l.port == listener.port) {
            return Err(Error::Config(ConfigError::DuplicatePort(listener.port)));
        }
    }

    Ok(())
}
