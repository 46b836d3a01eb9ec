//! # stepper-server binary
//!
//! Runs the motion engine, the threaded step timer and the command server on
//! a host. Pins, the potentiometer and the display are simulated: pins log
//! their transitions, the potentiometer follows the distance from home and
//! the display writes to the log.
//!
//! # Usage
//!
//! ```bash
//! # Stock configuration (ports 80 and 8080)
//! stepper-server
//!
//! # Custom configuration, local only, verbose
//! stepper-server --config stepper.toml --bind 127.0.0.1 -v
//! ```

use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};
use stepper_server::{
    bind_listeners, load_config, thread_timer, CommandServer, FnReference, MotionControl,
    MotionEngine, SharedEngine, StatusSink, SystemConfig,
};
use tracing::{error, info, trace, Level};
use tracing_subscriber::EnvFilter;

/// Stepper motor command server with simulated hardware
#[derive(Parser, Debug)]
#[command(name = "stepper-server")]
#[command(version)]
#[command(about = "Stepper motor command server with simulated hardware")]
struct Args {
    /// Path to the TOML configuration; stock settings when omitted
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the address every listener binds to
    #[arg(short, long, value_name = "ADDR")]
    bind: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Output pin that logs its transitions.
struct SimPin {
    name: &'static str,
    high: bool,
}

impl SimPin {
    fn new(name: &'static str) -> Self {
        Self { name, high: false }
    }
}

impl ErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_high(&mut self) -> Result<(), Self::Error> {
        if !self.high {
            trace!(pin = self.name, "high");
        }
        self.high = true;
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), Self::Error> {
        if self.high {
            trace!(pin = self.name, "low");
        }
        self.high = false;
        Ok(())
    }
}

/// Delay backed by `thread::sleep`.
struct HostDelay;

impl DelayNs for HostDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns)));
    }
}

/// Status display that writes to the log.
struct LogDisplay;

impl StatusSink for LogDisplay {
    fn render(&mut self, text: &str) {
        info!(target: "display", "{}", text.replace('\n', " | "));
    }
}

/// Raw 16-bit sample of a potentiometer that reads zero at home and rises
/// with the distance from it.
fn simulated_sample(position: i64) -> u16 {
    u16::try_from(position.unsigned_abs().saturating_mul(64)).unwrap_or(u16::MAX)
}

fn main() {
    let args = Args::parse();
    setup_tracing(&args);

    if let Err(e) = run(args) {
        error!("stepper-server failed: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => {
            info!(path = %path.display(), "loading configuration");
            load_config(path)?
        }
        None => SystemConfig::default(),
    };
    if let Some(bind) = &args.bind {
        config.server.bind =
            heapless::String::try_from(bind.as_str()).map_err(|_| "bind address too long")?;
    }

    let (timer, ticks) = thread_timer();
    let engine = MotionEngine::builder()
        .from_config(&config)
        .step_pin(SimPin::new("step"))
        .dir_pin(SimPin::new("dir"))
        .enable_pin(SimPin::new("enable"))
        .delay(HostDelay)
        .timer(timer)
        .build()?;
    let engine = Arc::new(SharedEngine::new(engine));

    let ticker = Arc::clone(&engine);
    ticks.spawn(move || {
        ticker.tick();
    })?;

    let probe = Arc::clone(&engine);
    let reference = FnReference::new(move || Some(simulated_sample(probe.status().position)));

    let listeners = bind_listeners(&config.server)?;
    info!(
        homing_hz = config.homing.speed.value(),
        refresh_ms = config.display.refresh_ms,
        "stepper-server ready"
    );

    CommandServer::new(engine, reference, LogDisplay, &config).run(&listeners);
    Ok(())
}

fn setup_tracing(args: &Args) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .compact()
        .init();
}
