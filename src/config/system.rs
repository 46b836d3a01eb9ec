//! System configuration - root configuration structure.

use serde::Deserialize;

use super::homing::HomingConfig;
use super::motor::MotorConfig;
use super::server::{DisplayConfig, ServerConfig};

/// Root configuration structure from TOML.
///
/// Every section is optional; an empty document yields the stock firmware
/// behaviour.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Step/dir driver wiring.
    pub motor: MotorConfig,

    /// Homing reference interpretation.
    pub homing: HomingConfig,

    /// Status display refresh.
    pub display: DisplayConfig,

    /// Command server listeners.
    pub server: ServerConfig,
}
