//! Motor module for stepper-server.
//!
//! Provides the motion engine, its shared-state record, and the
//! critical-section wrapper the tick and command paths share it through.

mod builder;
mod engine;
mod shared;
pub mod state;

pub use builder::MotionEngineBuilder;
pub use engine::{EngineSettings, MotionEngine, TickOutcome};
pub use shared::{MotionControl, SharedEngine};
pub use state::{MotionState, MotorState};
