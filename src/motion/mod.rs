//! Motion module for stepper-server.
//!
//! Direction handling and the move command group written by the command path.

mod command;
mod direction;

pub use command::{Completion, HomeOutcome, MoveCommand, MoveOutcome};
pub use direction::Direction;
