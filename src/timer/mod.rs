//! Periodic step timer abstraction.
//!
//! The timer itself only knows how to arm and disarm a periodic source. The
//! code that runs on every period (the step tick) is wired separately: an
//! interrupt handler on a target, or [`TickSource::spawn`] on a host.

#[cfg(feature = "std")]
mod thread;

#[cfg(feature = "std")]
pub use thread::{thread_timer, ThreadTimer, TickSource};

use crate::config::units::Hertz;
use crate::error::MotorError;

/// A periodic real-time source driving the step tick.
pub trait StepTimer {
    /// Arm periodic ticks at `frequency`.
    ///
    /// Re-arming an armed timer replaces its period; two periods never
    /// overlap.
    fn arm(&mut self, frequency: Hertz);

    /// Disarm the timer.
    ///
    /// Must be synchronous: once this returns no tick from the previous
    /// period may start.
    fn disarm(&mut self);

    /// Check whether the timer is armed.
    fn is_armed(&self) -> bool;

    /// Validate a caller-supplied frequency and arm.
    ///
    /// # Errors
    ///
    /// Returns `MotorError::InvalidFrequency` if `frequency_hz` is zero or
    /// negative; the timer is left untouched.
    fn start(&mut self, frequency_hz: i64) -> Result<Hertz, MotorError> {
        let frequency = Hertz::new(frequency_hz)?;
        self.arm(frequency);
        Ok(frequency)
    }
}

impl<T: StepTimer + ?Sized> StepTimer for &mut T {
    fn arm(&mut self, frequency: Hertz) {
        (**self).arm(frequency)
    }

    fn disarm(&mut self) {
        (**self).disarm()
    }

    fn is_armed(&self) -> bool {
        (**self).is_armed()
    }
}
