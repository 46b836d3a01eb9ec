//! Builder pattern for MotionEngine.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::config::{HomingConfig, Hertz, SoftLimits, SystemConfig};
use crate::error::{ConfigError, Error, Result};
use crate::timer::StepTimer;

use super::engine::{EngineSettings, MotionEngine};

/// Builder for creating MotionEngine instances.
pub struct MotionEngineBuilder<STEP, DIR, EN, DELAY, TIMER>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    DELAY: DelayNs,
    TIMER: StepTimer,
{
    step_pin: Option<STEP>,
    dir_pin: Option<DIR>,
    enable_pin: Option<EN>,
    delay: Option<DELAY>,
    timer: Option<TIMER>,
    settings: EngineSettings,
}

impl<STEP, DIR, EN, DELAY, TIMER> Default for MotionEngineBuilder<STEP, DIR, EN, DELAY, TIMER>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    DELAY: DelayNs,
    TIMER: StepTimer,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<STEP, DIR, EN, DELAY, TIMER> MotionEngineBuilder<STEP, DIR, EN, DELAY, TIMER>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    DELAY: DelayNs,
    TIMER: StepTimer,
{
    /// Create a new builder with the stock firmware settings.
    pub fn new() -> Self {
        Self {
            step_pin: None,
            dir_pin: None,
            enable_pin: None,
            delay: None,
            timer: None,
            settings: EngineSettings::default(),
        }
    }

    /// Set the STEP pin.
    pub fn step_pin(mut self, pin: STEP) -> Self {
        self.step_pin = Some(pin);
        self
    }

    /// Set the DIR pin.
    pub fn dir_pin(mut self, pin: DIR) -> Self {
        self.dir_pin = Some(pin);
        self
    }

    /// Set the driver enable pin.
    pub fn enable_pin(mut self, pin: EN) -> Self {
        self.enable_pin = Some(pin);
        self
    }

    /// Set the delay provider used for the step pulse width.
    pub fn delay(mut self, delay: DELAY) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Set the step timer.
    pub fn timer(mut self, timer: TIMER) -> Self {
        self.timer = Some(timer);
        self
    }

    /// Set direction inversion.
    pub fn invert_direction(mut self, invert: bool) -> Self {
        self.settings.invert_direction = invert;
        self
    }

    /// Set whether the enable line is active-low.
    pub fn enable_active_low(mut self, active_low: bool) -> Self {
        self.settings.enable_active_low = active_low;
        self
    }

    /// Set the step pulse high time in microseconds.
    pub fn pulse_width_us(mut self, us: u32) -> Self {
        self.settings.pulse_width_ns = us.saturating_mul(1000);
        self
    }

    /// Set the highest accepted step rate.
    pub fn max_speed(mut self, max: Hertz) -> Self {
        self.settings.max_speed = Some(max);
        self
    }

    /// Set soft travel limits.
    pub fn limits(mut self, limits: SoftLimits) -> Self {
        self.settings.limits = Some(limits);
        self
    }

    /// Set homing reference interpretation and speed.
    pub fn homing(mut self, homing: HomingConfig) -> Self {
        self.settings.homing = homing;
        self
    }

    /// Replace all driver settings at once.
    pub fn settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Configure from a SystemConfig.
    pub fn from_config(mut self, config: &SystemConfig) -> Self {
        self.settings = EngineSettings::from_config(config);
        self
    }

    /// Build the MotionEngine.
    ///
    /// # Errors
    ///
    /// Returns an error if required parts are missing or the driver lines
    /// cannot be put in their idle state.
    pub fn build(self) -> Result<MotionEngine<STEP, DIR, EN, DELAY, TIMER>> {
        let step_pin = self.step_pin.ok_or(missing("step_pin"))?;
        let dir_pin = self.dir_pin.ok_or(missing("dir_pin"))?;
        let enable_pin = self.enable_pin.ok_or(missing("enable_pin"))?;
        let delay = self.delay.ok_or(missing("delay"))?;
        let timer = self.timer.ok_or(missing("timer"))?;

        MotionEngine::new(step_pin, dir_pin, enable_pin, delay, timer, self.settings)
    }
}

fn missing(part: &'static str) -> Error {
    Error::Config(ConfigError::MissingPart(part))
}
