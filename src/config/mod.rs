//! Configuration module for stepper-server.
//!
//! Provides types for loading and validating driver, homing and server
//! configuration from TOML files (with `std` feature) or pre-parsed data.

mod homing;
mod limits;
mod motor;
mod server;
mod system;
pub mod units;
#[cfg(feature = "std")]
mod loader;
mod validation;

pub use homing::HomingConfig;
pub use limits::{LimitPolicy, SoftLimits};
pub use motor::MotorConfig;
pub use server::{DisplayConfig, ListenerConfig, Method, Route, ServerConfig, MAX_LISTENERS};
pub use system::SystemConfig;
pub use validation::validate_config;

#[cfg(feature = "std")]
pub use loader::{load_config, parse_config};

// Re-export unit types at config level
pub use units::{Hertz, Steps};
