//! Move commands and their outcomes.

use super::direction::Direction;
use crate::config::units::Hertz;

/// The group of fields a new move writes in one critical section.
///
/// The step path only ever sees a complete `MoveCommand`; it never observes a
/// direction from one move paired with a step count from another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MoveCommand {
    /// Steps to execute.
    pub steps: u32,
    /// Direction of every step in this move.
    pub direction: Direction,
    /// Destination for position-based moves.
    pub target: Option<i64>,
    /// Step rate.
    pub speed: Hertz,
}

/// Result of starting a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MoveOutcome {
    /// Timer armed; the move runs in the tick context.
    Started,
    /// Nothing to do; the engine stayed idle and the timer was not armed.
    AlreadyComplete,
}

/// Result of one homing poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HomeOutcome {
    /// The reference reports home; position reset to zero.
    Homed,
    /// A corrective move toward zero is running; poll again.
    Moving,
}

/// Terminal transition recorded by the step path for the cooperative side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Completion {
    /// A move ran to its last step.
    Finished {
        /// Position after the last step.
        position: i64,
    },
    /// A homing move ran to its last step; the reference must be polled again.
    HomingFinished {
        /// Position after the last step.
        position: i64,
    },
    /// A pin failed during a step; the driver was disabled.
    Faulted {
        /// Position when the fault was detected.
        position: i64,
    },
}

impl Completion {
    /// Position at the time of the transition.
    pub fn position(self) -> i64 {
        match self {
            Completion::Finished { position }
            | Completion::HomingFinished { position }
            | Completion::Faulted { position } => position,
        }
    }
}
