//! Unit test harness for stepper-server.
//!
//! This module organizes unit tests for each component of the library.

mod config_parsing;
mod config_validation;
mod engine_properties;
mod protocol;
pub mod support;
