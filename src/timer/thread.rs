//! Host step timer backed by a dedicated thread.
//!
//! The ticker thread plays the role of the timer interrupt: it runs the tick
//! callback inside a critical section, separate from the thread serving
//! requests.

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::StepTimer;
use crate::config::units::Hertz;

#[derive(Debug, Default)]
struct Schedule {
    period: Option<Duration>,
    shutdown: bool,
}

#[derive(Debug, Default)]
struct Shared {
    schedule: Mutex<Schedule>,
    wake: Condvar,
    /// Bumped on every arm/disarm; a tick only runs if it still matches.
    generation: AtomicU64,
}

impl Shared {
    fn schedule(&self) -> MutexGuard<'_, Schedule> {
        // A poisoned schedule only means a callback panicked; the data is plain.
        self.schedule.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set(&self, period: Option<Duration>) {
        let mut schedule = self.schedule();
        schedule.period = period;
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.wake.notify_all();
    }
}

/// Arm/disarm handle, owned by the motion engine.
#[derive(Debug)]
pub struct ThreadTimer {
    shared: Arc<Shared>,
}

/// Tick side of a [`ThreadTimer`], consumed to start the ticker thread.
#[derive(Debug)]
pub struct TickSource {
    shared: Arc<Shared>,
}

/// Create a disarmed host timer and its tick source.
pub fn thread_timer() -> (ThreadTimer, TickSource) {
    let shared = Arc::new(Shared::default());
    (
        ThreadTimer {
            shared: Arc::clone(&shared),
        },
        TickSource { shared },
    )
}

impl StepTimer for ThreadTimer {
    fn arm(&mut self, frequency: Hertz) {
        tracing::trace!(hz = frequency.value(), "step timer armed");
        self.shared
            .set(Some(Duration::from_nanos(frequency.period_ns())));
    }

    fn disarm(&mut self) {
        tracing::trace!("step timer disarmed");
        self.shared.set(None);
    }

    fn is_armed(&self) -> bool {
        self.shared.schedule().period.is_some()
    }
}

impl Drop for ThreadTimer {
    fn drop(&mut self) {
        let mut schedule = self.shared.schedule();
        schedule.period = None;
        schedule.shutdown = true;
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        self.shared.wake.notify_all();
    }
}

impl TickSource {
    /// Start the ticker thread, invoking `on_tick` once per armed period.
    ///
    /// `on_tick` runs inside a critical section. The thread exits when the
    /// [`ThreadTimer`] is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn<F>(self, mut on_tick: F) -> io::Result<JoinHandle<()>>
    where
        F: FnMut() + Send + 'static,
    {
        let shared = self.shared;
        thread::Builder::new()
            .name("step-timer".into())
            .spawn(move || {
                while let Some(generation) = wait_for_tick(&shared) {
                    critical_section::with(|_| {
                        // Skip deadlines from a period disarmed since.
                        if shared.generation.load(Ordering::SeqCst) == generation {
                            on_tick();
                        }
                    });
                }
                tracing::debug!("step timer thread exiting");
            })
    }
}

/// Block until the next deadline of the armed period.
///
/// Returns the generation the deadline belongs to, or `None` on shutdown.
fn wait_for_tick(shared: &Shared) -> Option<u64> {
    let mut schedule = shared.schedule();
    let mut current: Option<(u64, Instant)> = None;

    loop {
        if schedule.shutdown {
            return None;
        }

        let Some(period) = schedule.period else {
            current = None;
            schedule = shared.wake.wait(schedule).unwrap_or_else(|e| e.into_inner());
            continue;
        };

        let generation = shared.generation.load(Ordering::SeqCst);
        let deadline = match current {
            Some((g, deadline)) if g == generation => deadline,
            _ => Instant::now() + period,
        };
        current = Some((generation, deadline));

        let now = Instant::now();
        if now >= deadline {
            return Some(generation);
        }

        schedule = shared
            .wake
            .wait_timeout(schedule, deadline - now)
            .map(|(guard, _)| guard)
            .unwrap_or_else(|e| e.into_inner().0);
    }
}
