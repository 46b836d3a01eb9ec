//! Test doubles shared by the unit tests.

use std::cell::Cell;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, OutputPin};
use embedded_hal_mock::eh1::delay::NoopDelay;
use stepper_server::config::Hertz;
use stepper_server::motor::{EngineSettings, MotionEngine};
use stepper_server::{SharedEngine, StatusSink, StepTimer, TickOutcome};

/// Pin that accepts every write.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPin;

impl ErrorType for NullPin {
    type Error = Infallible;
}

impl OutputPin for NullPin {
    fn set_high(&mut self) -> Result<(), Infallible> {
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

/// Timer whose ticks are driven by the test.
#[derive(Debug, Default, Clone)]
pub struct ManualTimer(Rc<Cell<Option<Hertz>>>);

impl ManualTimer {
    pub fn armed(&self) -> Option<Hertz> {
        self.0.get()
    }
}

impl StepTimer for ManualTimer {
    fn arm(&mut self, frequency: Hertz) {
        self.0.set(Some(frequency));
    }

    fn disarm(&mut self) {
        self.0.set(None);
    }

    fn is_armed(&self) -> bool {
        self.0.get().is_some()
    }
}

pub type TestEngine = MotionEngine<NullPin, NullPin, NullPin, NoopDelay, ManualTimer>;

pub fn engine_with(settings: EngineSettings) -> (TestEngine, ManualTimer) {
    let timer = ManualTimer::default();
    let engine = MotionEngine::builder()
        .step_pin(NullPin)
        .dir_pin(NullPin)
        .enable_pin(NullPin)
        .delay(NoopDelay::new())
        .timer(timer.clone())
        .settings(settings)
        .build()
        .expect("engine parts supplied");
    (engine, timer)
}

pub fn engine() -> (TestEngine, ManualTimer) {
    engine_with(EngineSettings::default())
}

/// Tick until the engine reports idle; returns the number of steps issued.
pub fn run_to_idle(engine: &mut TestEngine) -> u32 {
    let mut ticks = 0;
    while engine.on_tick().expect("pins never fail") != TickOutcome::Idle {
        ticks += 1;
        assert!(ticks <= 1_000_000, "move never finished");
    }
    ticks
}

/// Same as [`run_to_idle`], through the critical-section wrapper.
pub fn drain_ticks(engine: &SharedEngine<TestEngine>) -> u32 {
    let mut ticks = 0;
    while engine.tick() != TickOutcome::Idle {
        ticks += 1;
        assert!(ticks <= 1_000_000, "move never finished");
    }
    ticks
}

/// Display that keeps every rendered message.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub lines: Vec<String>,
}

impl RecordingSink {
    pub fn last(&self) -> Option<&str> {
        self.lines.last().map(String::as_str)
    }
}

impl StatusSink for RecordingSink {
    fn render(&mut self, text: &str) {
        self.lines.push(text.to_owned());
    }
}
