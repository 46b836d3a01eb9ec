//! Sharing the engine between the tick context and the command path.
//!
//! Every access runs inside `critical_section::with`. On a single-core target
//! this masks the timer interrupt for the duration of the access, so a tick
//! never observes half of a move's group write and a `stop` is complete
//! before the next tick can run.

use core::cell::RefCell;

use critical_section::Mutex;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::config::HomingConfig;
use crate::error::Result;
use crate::motion::{Completion, Direction, HomeOutcome, MoveOutcome};
use crate::reference::HomingReference;
use crate::timer::StepTimer;

use super::engine::{MotionEngine, TickOutcome};
use super::state::MotorState;

/// An engine behind a critical-section mutex.
pub struct SharedEngine<E> {
    inner: Mutex<RefCell<E>>,
}

impl<E> SharedEngine<E> {
    /// Wrap an engine. `const` so it can live in a `static` on targets.
    pub const fn new(engine: E) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(engine)),
        }
    }

    /// Run `f` with exclusive access to the engine inside a critical section.
    ///
    /// Keep `f` short: on a target, step interrupts are held off while it runs.
    pub fn with<R>(&self, f: impl FnOnce(&mut E) -> R) -> R {
        critical_section::with(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }

    /// Unwrap the engine.
    pub fn into_inner(self) -> E {
        self.inner.into_inner().into_inner()
    }
}

impl<STEP, DIR, EN, DELAY, TIMER> SharedEngine<MotionEngine<STEP, DIR, EN, DELAY, TIMER>>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    DELAY: DelayNs,
    TIMER: StepTimer,
{
    /// Timer callback. Call this from the step interrupt (or the host ticker).
    ///
    /// A failed pulse leaves the engine disabled; the failure is logged here
    /// because the interrupt has nowhere to return it.
    pub fn tick(&self) -> TickOutcome {
        match self.with(|engine| engine.on_tick()) {
            Ok(outcome) => outcome,
            Err(_e) => {
                #[cfg(feature = "defmt")]
                defmt::error!("step tick fault, driver disabled");
                #[cfg(feature = "std")]
                tracing::error!(error = %_e, "step tick fault, driver disabled");
                TickOutcome::Idle
            }
        }
    }
}

/// Command-path view of a shared motion engine.
pub trait MotionControl {
    /// See [`MotionEngine::move_relative`].
    fn move_relative(&self, steps: i64, direction: Direction, speed_hz: i64) -> Result<MoveOutcome>;

    /// See [`MotionEngine::move_to`].
    fn move_to(&self, target: i64, speed_hz: i64) -> Result<MoveOutcome>;

    /// See [`MotionEngine::home_with_sample`].
    fn home_with_sample(&self, sample: u16) -> Result<HomeOutcome>;

    /// See [`MotionEngine::stop`].
    fn stop(&self) -> Result<()>;

    /// Snapshot of the motor-state record.
    fn status(&self) -> MotorState;

    /// See [`MotionEngine::take_completion`].
    fn take_completion(&self) -> Option<Completion>;

    /// Homing reference interpretation used by the engine.
    fn homing(&self) -> HomingConfig;

    /// Poll the homing reference once.
    ///
    /// The reference is read outside the critical section; only the
    /// resulting transition runs with the tick held off.
    fn home<R: HomingReference + ?Sized>(&self, reference: &mut R) -> Result<HomeOutcome> {
        let sample = reference.read()?;
        self.home_with_sample(sample)
    }
}

impl<STEP, DIR, EN, DELAY, TIMER> MotionControl
    for SharedEngine<MotionEngine<STEP, DIR, EN, DELAY, TIMER>>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    DELAY: DelayNs,
    TIMER: StepTimer,
{
    fn move_relative(&self, steps: i64, direction: Direction, speed_hz: i64) -> Result<MoveOutcome> {
        self.with(|engine| engine.move_relative(steps, direction, speed_hz))
    }

    fn move_to(&self, target: i64, speed_hz: i64) -> Result<MoveOutcome> {
        self.with(|engine| engine.move_to(target, speed_hz))
    }

    fn home_with_sample(&self, sample: u16) -> Result<HomeOutcome> {
        self.with(|engine| engine.home_with_sample(sample))
    }

    fn stop(&self) -> Result<()> {
        self.with(|engine| engine.stop())
    }

    fn status(&self) -> MotorState {
        self.with(|engine| engine.state())
    }

    fn take_completion(&self) -> Option<Completion> {
        self.with(|engine| engine.take_completion())
    }

    fn homing(&self) -> HomingConfig {
        self.with(|engine| engine.settings().homing)
    }
}

impl<M: MotionControl + ?Sized> MotionControl for &M {
    fn move_relative(&self, steps: i64, direction: Direction, speed_hz: i64) -> Result<MoveOutcome> {
        (**self).move_relative(steps, direction, speed_hz)
    }

    fn move_to(&self, target: i64, speed_hz: i64) -> Result<MoveOutcome> {
        (**self).move_to(target, speed_hz)
    }

    fn home_with_sample(&self, sample: u16) -> Result<HomeOutcome> {
        (**self).home_with_sample(sample)
    }

    fn stop(&self) -> Result<()> {
        (**self).stop()
    }

    fn status(&self) -> MotorState {
        (**self).status()
    }

    fn take_completion(&self) -> Option<Completion> {
        (**self).take_completion()
    }

    fn homing(&self) -> HomingConfig {
        (**self).homing()
    }
}

#[cfg(feature = "std")]
impl<M: MotionControl + ?Sized> MotionControl for std::sync::Arc<M> {
    fn move_relative(&self, steps: i64, direction: Direction, speed_hz: i64) -> Result<MoveOutcome> {
        (**self).move_relative(steps, direction, speed_hz)
    }

    fn move_to(&self, target: i64, speed_hz: i64) -> Result<MoveOutcome> {
        (**self).move_to(target, speed_hz)
    }

    fn home_with_sample(&self, sample: u16) -> Result<HomeOutcome> {
        (**self).home_with_sample(sample)
    }

    fn stop(&self) -> Result<()> {
        (**self).stop()
    }

    fn status(&self) -> MotorState {
        (**self).status()
    }

    fn take_completion(&self) -> Option<Completion> {
        (**self).take_completion()
    }

    fn homing(&self) -> HomingConfig {
        (**self).homing()
    }
}
