//! Motion engine.
//!
//! Generic over embedded-hal 1.0 pin types and a [`StepTimer`]. All mutation
//! goes through `&mut self`; sharing between the tick context and the command
//! path is done by [`SharedEngine`](super::SharedEngine).

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::config::{HomingConfig, Hertz, SoftLimits, SystemConfig};
use crate::error::{HardwareError, MotorError, Result};
use crate::motion::{Completion, Direction, HomeOutcome, MoveCommand, MoveOutcome};
use crate::reference::HomingReference;
use crate::timer::StepTimer;

use super::builder::MotionEngineBuilder;
use super::state::{MotionState, MotorState};

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickOutcome {
    /// No move in flight.
    Idle,
    /// One step issued; more remain.
    Stepped,
    /// The last step of the move was issued and the engine went idle.
    Completed,
}

/// Driver behaviour derived from configuration.
#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    /// Whether direction pin logic is inverted.
    pub invert_direction: bool,
    /// Whether the enable line energizes the driver when low.
    pub enable_active_low: bool,
    /// Step pulse high time in nanoseconds.
    pub pulse_width_ns: u32,
    /// Highest accepted step rate.
    pub max_speed: Option<Hertz>,
    /// Travel limits applied to every move.
    pub limits: Option<SoftLimits>,
    /// Homing reference interpretation and speed.
    pub homing: HomingConfig,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&SystemConfig::default())
    }
}

impl EngineSettings {
    /// Extract engine settings from the system configuration.
    pub fn from_config(config: &SystemConfig) -> Self {
        Self {
            invert_direction: config.motor.invert_direction,
            enable_active_low: config.motor.enable_active_low,
            pulse_width_ns: config.motor.pulse_width_us.saturating_mul(1000),
            max_speed: config.motor.max_speed_hz,
            limits: config.motor.limits,
            homing: config.homing,
        }
    }
}

/// Stepper motion engine.
///
/// Generic over:
/// - `STEP`: STEP pin type (must implement `OutputPin`)
/// - `DIR`: DIR pin type (must implement `OutputPin`)
/// - `EN`: driver enable pin type (must implement `OutputPin`)
/// - `DELAY`: Delay provider for the pulse width (must implement `DelayNs`)
/// - `TIMER`: periodic step source (must implement `StepTimer`)
pub struct MotionEngine<STEP, DIR, EN, DELAY, TIMER>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    DELAY: DelayNs,
    TIMER: StepTimer,
{
    /// STEP pin (pulse to move one step).
    step_pin: STEP,

    /// DIR pin (high = CW, low = CCW, or inverted).
    dir_pin: DIR,

    /// Driver enable line.
    enable_pin: EN,

    /// Delay provider for the pulse high time.
    delay: DELAY,

    /// Step timer.
    timer: TIMER,

    /// The shared motor-state record.
    state: MotorState,

    /// Terminal transition not yet reported.
    completion: Option<Completion>,

    settings: EngineSettings,
}

impl<STEP, DIR, EN, DELAY, TIMER> MotionEngine<STEP, DIR, EN, DELAY, TIMER>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    DELAY: DelayNs,
    TIMER: StepTimer,
{
    /// Create an idle engine with the driver de-energized.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::Unavailable` if the enable or step line cannot
    /// be driven.
    pub(crate) fn new(
        step_pin: STEP,
        dir_pin: DIR,
        enable_pin: EN,
        delay: DELAY,
        mut timer: TIMER,
        settings: EngineSettings,
    ) -> Result<Self> {
        timer.disarm();

        let mut engine = Self {
            step_pin,
            dir_pin,
            enable_pin,
            delay,
            timer,
            state: MotorState::default(),
            completion: None,
            settings,
        };

        engine
            .set_enabled(false)
            .map_err(|_| HardwareError::unavailable("enable pin"))?;
        engine
            .step_pin
            .set_low()
            .map_err(|_| HardwareError::unavailable("step pin"))?;

        Ok(engine)
    }

    /// Create a builder for this engine.
    pub fn builder() -> MotionEngineBuilder<STEP, DIR, EN, DELAY, TIMER> {
        MotionEngineBuilder::new()
    }

    /// Snapshot of the motor-state record.
    #[inline]
    pub fn state(&self) -> MotorState {
        self.state
    }

    /// Current position in steps from home.
    #[inline]
    pub fn position(&self) -> i64 {
        self.state.position
    }

    /// Engine settings.
    #[inline]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Take the last terminal transition, if it has not been reported yet.
    #[inline]
    pub fn take_completion(&mut self) -> Option<Completion> {
        self.completion.take()
    }

    /// Start a move of `steps` in `direction` at `speed_hz`.
    ///
    /// Pre-empts any move in flight. A zero-step move leaves the engine idle
    /// without arming the timer.
    ///
    /// # Errors
    ///
    /// - `MotorError::InvalidSteps` if `steps` is negative
    /// - `MotorError::InvalidFrequency` if `speed_hz` is not a valid rate
    /// - `MotorError::LimitExceeded` if the end position breaks a reject limit
    /// - `MotorError::TooManySteps` if the distance does not fit one move
    ///
    /// On error the motor state is unchanged.
    pub fn move_relative(
        &mut self,
        steps: i64,
        direction: Direction,
        speed_hz: i64,
    ) -> Result<MoveOutcome> {
        if steps < 0 {
            return Err(MotorError::InvalidSteps(steps).into());
        }
        let speed = self.validate_speed(speed_hz)?;
        let target = self.state.position.saturating_add(direction.sign() * steps);
        let target = self.apply_limits(target)?;
        let steps = self.step_count(target)?;

        if steps == 0 {
            self.settle()?;
            return Ok(MoveOutcome::AlreadyComplete);
        }

        self.begin(
            MoveCommand {
                steps,
                // A clamp may land behind the current position.
                direction: Direction::from_steps(target - self.state.position),
                target: None,
                speed,
            },
            MotionState::Moving,
        )?;
        Ok(MoveOutcome::Started)
    }

    /// Start a move to the absolute `target` position at `speed_hz`.
    ///
    /// If the motor already sits at `target` the engine goes idle without
    /// arming the timer and reports [`MoveOutcome::AlreadyComplete`].
    ///
    /// # Errors
    ///
    /// - `MotorError::InvalidFrequency` if `speed_hz` is not a valid rate
    /// - `MotorError::LimitExceeded` if `target` breaks a reject limit
    /// - `MotorError::TooManySteps` if the distance does not fit one move
    pub fn move_to(&mut self, target: i64, speed_hz: i64) -> Result<MoveOutcome> {
        let speed = self.validate_speed(speed_hz)?;
        let target = self.apply_limits(target)?;
        self.seek(target, speed, MotionState::Moving)
    }

    /// Poll the homing reference once.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::Unavailable` if the reference cannot be read.
    pub fn home<R: HomingReference + ?Sized>(&mut self, reference: &mut R) -> Result<HomeOutcome> {
        let sample = reference.read()?;
        self.home_with_sample(sample)
    }

    /// Apply one homing-reference sample (raw 16-bit ADC value).
    ///
    /// At home: position is reset to zero, the engine goes idle, `Homed`.
    /// Otherwise a move toward zero is issued at the homing speed and
    /// `Moving` is returned; the caller polls again after it settles.
    ///
    /// # Errors
    ///
    /// `MotorError::NotHomed` if the logical position is already zero while
    /// the reference disagrees.
    pub fn home_with_sample(&mut self, sample: u16) -> Result<HomeOutcome> {
        let reading = self.settings.homing.scale(sample);

        if self.settings.homing.is_home(reading) {
            self.settle()?;
            self.state.position = 0;
            return Ok(HomeOutcome::Homed);
        }

        match self.seek(0, self.settings.homing.speed, MotionState::Homing)? {
            MoveOutcome::Started => Ok(HomeOutcome::Moving),
            MoveOutcome::AlreadyComplete => Err(MotorError::NotHomed { reading }.into()),
        }
    }

    /// Stop immediately.
    ///
    /// The position keeps only the steps already issued. On an idle engine
    /// this only discards a completion that was not reported yet.
    ///
    /// # Errors
    ///
    /// Returns `MotorError::PinError` if the enable line could not be
    /// released; the engine is idle regardless.
    pub fn stop(&mut self) -> Result<()> {
        self.settle()
    }

    /// Execute one timer period. Called from the tick context.
    ///
    /// # Errors
    ///
    /// Returns `MotorError::PinError` if the step pulse failed; the engine is
    /// left idle with the driver disabled and a [`Completion::Faulted`]
    /// recorded.
    pub fn on_tick(&mut self) -> Result<TickOutcome> {
        if self.state.steps_remaining == 0 {
            // Stale tick: make sure nothing stays energized.
            if self.timer.is_armed() || self.state.enabled {
                self.halt()?;
            }
            return Ok(TickOutcome::Idle);
        }

        if let Err(e) = self.pulse() {
            let _ = self.halt();
            self.completion = Some(Completion::Faulted {
                position: self.state.position,
            });
            return Err(e.into());
        }

        self.state.steps_remaining -= 1;
        self.state.position += self.state.direction.sign();

        if self.state.steps_remaining > 0 {
            return Ok(TickOutcome::Stepped);
        }

        let position = self.state.position;
        self.completion = Some(match self.state.mode {
            MotionState::Homing => Completion::HomingFinished { position },
            _ => Completion::Finished { position },
        });
        self.halt()?;
        Ok(TickOutcome::Completed)
    }

    fn validate_speed(&self, speed_hz: i64) -> Result<Hertz> {
        let speed = Hertz::new(speed_hz)?;
        match self.settings.max_speed {
            Some(max) if speed > max => Err(MotorError::InvalidFrequency(speed_hz).into()),
            _ => Ok(speed),
        }
    }

    fn apply_limits(&self, target: i64) -> Result<i64> {
        match self.settings.limits {
            None => Ok(target),
            Some(limits) => limits.apply(target).ok_or_else(|| {
                MotorError::LimitExceeded {
                    position: target,
                    limit: limits.nearest(target),
                }
                .into()
            }),
        }
    }

    fn step_count(&self, target: i64) -> Result<u32> {
        let delta = target.abs_diff(self.state.position);
        u32::try_from(delta).map_err(|_| MotorError::TooManySteps(delta).into())
    }

    fn seek(&mut self, target: i64, speed: Hertz, mode: MotionState) -> Result<MoveOutcome> {
        let steps = self.step_count(target)?;
        if steps == 0 {
            self.settle()?;
            return Ok(MoveOutcome::AlreadyComplete);
        }

        let direction = Direction::from_steps(target - self.state.position);
        self.begin(
            MoveCommand {
                steps,
                direction,
                target: Some(target),
                speed,
            },
            mode,
        )?;
        Ok(MoveOutcome::Started)
    }

    /// Install a move. Fields the tick reads are written before the timer is
    /// armed, and the previous period is disarmed before any of them change.
    fn begin(&mut self, command: MoveCommand, mode: MotionState) -> Result<()> {
        self.timer.disarm();
        self.completion = None;

        if self.write_direction(command.direction).is_err() {
            let _ = self.halt();
            return Err(MotorError::PinError.into());
        }

        self.state.direction = command.direction;
        self.state.steps_remaining = command.steps;
        self.state.target_position = command.target;
        self.state.mode = mode;

        if self.set_enabled(true).is_err() {
            let _ = self.halt();
            return Err(MotorError::PinError.into());
        }

        self.timer.arm(command.speed);
        Ok(())
    }

    /// Go idle on a command. A completion of an earlier move is superseded
    /// and no longer reported.
    fn settle(&mut self) -> Result<()> {
        self.completion = None;
        self.halt()
    }

    /// Disarm, zero the countdown, release the driver, go idle.
    fn halt(&mut self) -> Result<()> {
        self.timer.disarm();
        self.state.steps_remaining = 0;
        self.state.target_position = None;
        self.state.mode = MotionState::Idle;
        let released = self.set_enabled(false);
        // The record must read disabled even if the line write failed.
        self.state.enabled = false;

        released.map_err(|_| {
            #[cfg(feature = "defmt")]
            defmt::error!("driver enable line could not be released");
            MotorError::PinError.into()
        })
    }

    fn pulse(&mut self) -> core::result::Result<(), MotorError> {
        self.step_pin.set_high().map_err(|_| MotorError::PinError)?;
        self.delay.delay_ns(self.settings.pulse_width_ns);
        self.step_pin.set_low().map_err(|_| MotorError::PinError)
    }

    fn write_direction(&mut self, direction: Direction) -> core::result::Result<(), MotorError> {
        let pin_high = match direction {
            Direction::Clockwise => !self.settings.invert_direction,
            Direction::CounterClockwise => self.settings.invert_direction,
        };

        if pin_high {
            self.dir_pin.set_high().map_err(|_| MotorError::PinError)
        } else {
            self.dir_pin.set_low().map_err(|_| MotorError::PinError)
        }
    }

    fn set_enabled(&mut self, enabled: bool) -> core::result::Result<(), MotorError> {
        let pin_low = enabled == self.settings.enable_active_low;
        if pin_low {
            self.enable_pin.set_low().map_err(|_| MotorError::PinError)?;
        } else {
            self.enable_pin.set_high().map_err(|_| MotorError::PinError)?;
        }
        self.state.enabled = enabled;
        Ok(())
    }
}
