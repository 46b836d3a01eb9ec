//! Homing reference (potentiometer) abstraction.

use crate::error::{HardwareError, Result};

/// Source of the analog homing reference.
pub trait HomingReference {
    /// Read one raw 16-bit sample.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::Unavailable` if the sensor cannot be read.
    fn read(&mut self) -> Result<u16>;
}

impl<T: HomingReference + ?Sized> HomingReference for &mut T {
    fn read(&mut self) -> Result<u16> {
        (**self).read()
    }
}

/// Reference backed by a sampling closure; `None` means the sensor is
/// unavailable.
pub struct FnReference<F> {
    sample: F,
}

impl<F> FnReference<F>
where
    F: FnMut() -> Option<u16>,
{
    /// Wrap a sampling closure.
    pub fn new(sample: F) -> Self {
        Self { sample }
    }
}

impl<F> HomingReference for FnReference<F>
where
    F: FnMut() -> Option<u16>,
{
    fn read(&mut self) -> Result<u16> {
        (self.sample)().ok_or_else(|| HardwareError::unavailable("homing reference").into())
    }
}
