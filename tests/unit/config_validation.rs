//! Unit tests for configuration validation.

use stepper_server::config::{parse_config, validate_config, ListenerConfig, Route, SystemConfig};
use stepper_server::error::{ConfigError, Error};

/// The defaults are valid.
#[test]
fn test_default_config_passes_validation() {
    assert!(validate_config(&SystemConfig::default()).is_ok());
}

/// Homing faster than the step-rate ceiling is rejected.
#[test]
fn test_homing_above_ceiling() {
    let result = parse_config(
        r#"
[motor]
max_speed_hz = 400

[homing]
speed_hz = 500
"#,
    );
    assert_eq!(
        result.err(),
        Some(Error::Config(ConfigError::InvalidHomingSpeed(500)))
    );
}

/// Inverted soft limits are rejected.
#[test]
fn test_inverted_soft_limits() {
    let result = parse_config(
        r#"
[motor.limits]
min_steps = 10
max_steps = -10
"#,
    );
    assert_eq!(
        result.err(),
        Some(Error::Config(ConfigError::InvalidSoftLimits { min: 10, max: -10 }))
    );
}

/// Port zero cannot be served.
#[test]
fn test_port_zero() {
    let mut config = SystemConfig::default();
    config.server.listeners.clear();
    config
        .server
        .listeners
        .push(ListenerConfig::new(0, &[Route::Status]))
        .expect("capacity");
    assert_eq!(
        validate_config(&config),
        Err(Error::Config(ConfigError::InvalidPort(0)))
    );
}

/// Two listeners on one port are rejected.
#[test]
fn test_duplicate_ports() {
    let result = parse_config(
        r#"
[[server.listeners]]
port = 80
routes = ["status"]

[[server.listeners]]
port = 80
routes = ["pot"]
"#,
    );
    assert_eq!(
        result.err(),
        Some(Error::Config(ConfigError::DuplicatePort(80)))
    );
}

/// A server needs at least one listener.
#[test]
fn test_no_listeners() {
    let mut config = SystemConfig::default();
    config.server.listeners.clear();
    assert_eq!(
        validate_config(&config),
        Err(Error::Config(ConfigError::NoListeners))
    );
}
