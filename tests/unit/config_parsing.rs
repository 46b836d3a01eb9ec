//! Unit tests for TOML configuration parsing.

use stepper_server::config::{
    load_config, parse_config, LimitPolicy, Method, Route, SystemConfig,
};
use stepper_server::error::{ConfigError, Error};

const FIRMWARE_CONFIG: &str = r#"
[motor]
invert_direction = false
enable_active_low = true
pulse_width_us = 10

[homing]
speed_hz = 500
threshold = 0
adc_shift = 4

[display]
refresh_ms = 1000

[server]
bind = "0.0.0.0"
read_timeout_ms = 2000
home_methods = ["GET", "POST"]

[[server.listeners]]
port = 80
routes = ["status", "home", "move", "move_to", "stop"]

[[server.listeners]]
port = 8080
routes = ["move", "pot", "panel"]
"#;

/// The documented stock configuration parses to the built-in defaults.
#[test]
fn test_stock_config_matches_defaults() {
    let parsed = parse_config(FIRMWARE_CONFIG).expect("stock config parses");
    let defaults = SystemConfig::default();

    assert_eq!(parsed.homing.speed, defaults.homing.speed);
    assert_eq!(parsed.homing.adc_shift, defaults.homing.adc_shift);
    assert_eq!(parsed.motor.pulse_width_us, defaults.motor.pulse_width_us);
    assert_eq!(parsed.display.refresh_ms, defaults.display.refresh_ms);
    assert_eq!(parsed.server.read_timeout_ms, defaults.server.read_timeout_ms);
    assert_eq!(parsed.server.listeners.len(), defaults.server.listeners.len());
    for (a, b) in parsed.server.listeners.iter().zip(defaults.server.listeners.iter()) {
        assert_eq!(a.port, b.port);
        assert_eq!(a.routes, b.routes);
    }
}

/// Test parsing soft limits and a speed ceiling.
#[test]
fn test_parse_motor_limits() {
    let config = parse_config(
        r#"
[motor]
max_speed_hz = 2000

[motor.limits]
min_steps = -100
max_steps = 100
"#,
    )
    .expect("limits parse");

    let limits = config.motor.limits.expect("limits present");
    assert_eq!(limits.min_steps, -100);
    assert_eq!(limits.max_steps, 100);
    assert_eq!(limits.policy, LimitPolicy::Reject);
    assert_eq!(config.motor.max_speed_hz.map(|hz| hz.value()), Some(2000));
}

/// Listener routes and `/home` methods come from configuration.
#[test]
fn test_parse_single_listener_variant() {
    let config = parse_config(
        r#"
[server]
home_methods = ["POST"]

[[server.listeners]]
port = 8080
routes = ["status", "home", "move", "pot"]
"#,
    )
    .expect("listener config parses");

    assert_eq!(config.server.listeners.len(), 1);
    let listener = &config.server.listeners[0];
    assert!(listener.serves(Route::Pot));
    assert!(!listener.serves(Route::Panel));
    assert!(config.server.home_accepts(Method::Post));
    assert!(!config.server.home_accepts(Method::Get));
}

/// Unknown route names are a parse error.
#[test]
fn test_unknown_route_rejected() {
    let result = parse_config(
        r#"
[[server.listeners]]
port = 80
routes = ["teleport"]
"#,
    );
    assert!(matches!(result, Err(Error::Config(ConfigError::ParseError(_)))));
}

/// Negative step rates never make it past parsing.
#[test]
fn test_negative_speed_rejected() {
    let result = parse_config("[motor]\nmax_speed_hz = -5\n");
    assert!(matches!(result, Err(Error::Config(ConfigError::ParseError(_)))));
}

/// Configuration files are read from disk.
#[test]
fn test_load_from_file() {
    let path = std::env::temp_dir().join(format!("stepper-server-{}.toml", std::process::id()));
    std::fs::write(&path, "[homing]\nspeed_hz = 120\n").expect("temp file writable");

    let config = load_config(&path);
    let _ = std::fs::remove_file(&path);

    assert_eq!(config.expect("file loads").homing.speed.value(), 120);
}
