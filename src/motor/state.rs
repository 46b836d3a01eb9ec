//! Shared motor-state record.

use crate::motion::Direction;

/// Mode of the motion engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionState {
    /// No move in flight; the driver is de-energized.
    #[default]
    Idle,
    /// Executing a relative or absolute move.
    Moving,
    /// Executing a corrective move toward home.
    Homing,
}

impl MotionState {
    /// Get the state name as a static string.
    pub fn name(self) -> &'static str {
        match self {
            MotionState::Idle => "Idle",
            MotionState::Moving => "Moving",
            MotionState::Homing => "Homing",
        }
    }

    /// Check whether steps are being issued.
    #[inline]
    pub fn is_moving(self) -> bool {
        !matches!(self, MotionState::Idle)
    }
}

/// The single motor-state record owned by the motion engine.
///
/// `position` and the `steps_remaining` countdown are only advanced by the
/// step tick. `direction`, `target_position` and the initial
/// `steps_remaining` are written together when a move starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorState {
    /// Signed step count from home.
    pub position: i64,
    /// Direction of the current (or last) move.
    pub direction: Direction,
    /// Steps left in the current move; 0 means idle.
    pub steps_remaining: u32,
    /// Destination of a position-based move; `None` for relative moves.
    pub target_position: Option<i64>,
    /// Mirrors the physical driver-enable line.
    pub enabled: bool,
    /// Engine mode.
    pub mode: MotionState,
}

impl MotorState {
    /// Check the idle invariant: no steps left and the driver de-energized.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.steps_remaining == 0 && !self.enabled && self.mode == MotionState::Idle
    }
}
