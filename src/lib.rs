//! # stepper-server
//!
//! Interrupt-driven stepper motor control with embedded-hal 1.0 pins and a
//! small JSON-over-HTTP command protocol.
//!
//! ## Features
//!
//! - **Tick-driven motion**: a periodic [`StepTimer`] issues one STEP pulse per
//!   period; position is tracked at all times
//! - **embedded-hal 1.0**: `OutputPin` for STEP/DIR/ENABLE, `DelayNs` for the
//!   pulse width
//! - **Critical-section sharing**: the tick and the command path see a single
//!   consistent [`MotorState`]
//! - **Potentiometer homing**: an analog reference confirms position zero
//! - **no_std compatible**: everything except the server and the host timer
//!   works without the standard library
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stepper_server::{motor::MotionEngine, thread_timer, SharedEngine, SystemConfig};
//!
//! let config: SystemConfig = stepper_server::load_config("stepper.toml")?;
//! let (timer, ticks) = thread_timer();
//!
//! let engine = MotionEngine::builder()
//!     .from_config(&config)
//!     .step_pin(step_pin)
//!     .dir_pin(dir_pin)
//!     .enable_pin(enable_pin)
//!     .delay(delay)
//!     .timer(timer)
//!     .build()?;
//!
//! let engine = Arc::new(SharedEngine::new(engine));
//! let ticker = Arc::clone(&engine);
//! ticks.spawn(move || {
//!     ticker.tick();
//! })?;
//!
//! engine.move_relative(200, Direction::Clockwise, 500)?;
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): TOML loading, the host step timer and the command server
//! - `defmt`: defmt formatting and logging for embedded targets

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - necessary for no_std with heapless strings
#![allow(clippy::result_large_err)]

// Core modules
pub mod config;
pub mod error;
pub mod motion;
pub mod motor;
pub mod reference;
pub mod status;
pub mod timer;

#[cfg(feature = "std")]
pub mod server;

// Re-exports for ergonomic API
pub use config::{validate_config, HomingConfig, MotorConfig, ServerConfig, SystemConfig};
pub use error::{Error, Result};
pub use motion::{Completion, Direction, HomeOutcome, MoveOutcome};
pub use motor::{MotionControl, MotionEngine, MotorState, SharedEngine, TickOutcome};
pub use reference::{FnReference, HomingReference};
pub use status::{NullSink, StatusMessage, StatusSink};
pub use timer::StepTimer;

// Configuration loading (std only)
#[cfg(feature = "std")]
pub use config::{load_config, parse_config};

// Host runtime (std only)
#[cfg(feature = "std")]
pub use server::{bind_listeners, CommandServer};
#[cfg(feature = "std")]
pub use timer::{thread_timer, ThreadTimer, TickSource};

// Unit types
pub use config::units::{Hertz, Steps};
