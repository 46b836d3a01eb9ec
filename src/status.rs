//! Status display sink.
//!
//! The display is a fire-and-forget consumer of short text messages. The step
//! tick never renders; it records a [`Completion`] which the cooperative side
//! turns into a [`StatusMessage`].

use core::fmt;

use crate::motion::{Completion, Direction};

/// Display that accepts human-readable status text.
///
/// Implementations must not block and drop text they cannot show.
pub trait StatusSink {
    /// Show `text`, replacing what was on screen.
    fn render(&mut self, text: &str);
}

impl<T: StatusSink + ?Sized> StatusSink for &mut T {
    fn render(&mut self, text: &str) {
        (**self).render(text)
    }
}

/// Sink for systems without a display.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl StatusSink for NullSink {
    fn render(&mut self, _text: &str) {}
}

/// Messages shown on the status display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusMessage {
    /// A relative move was accepted.
    Moving {
        /// Requested steps
        steps: i64,
        /// Requested direction
        direction: Direction,
    },
    /// Answer to a status query.
    Status {
        /// Steps left
        steps_remaining: u32,
        /// Current direction
        direction: Direction,
    },
    /// A move finished.
    Idle {
        /// Final position
        position: i64,
    },
    /// The reference confirmed home.
    Homed,
    /// A homing correction started.
    Homing {
        /// Position when it started
        position: i64,
    },
    /// A homing correction finished; home is confirmed on the next poll.
    HomingSettled {
        /// Position the correction reached
        position: i64,
    },
    /// Motion was stopped on request.
    Stopped {
        /// Position when stopped
        position: i64,
    },
    /// A step failed and the driver was disabled.
    Fault {
        /// Position at the fault
        position: i64,
    },
    /// Periodic reference readout.
    Reference {
        /// Scaled reading
        reading: u16,
    },
}

impl StatusMessage {
    /// Format and hand the message to `sink`.
    pub fn render_to<S: StatusSink + ?Sized>(&self, sink: &mut S) {
        let text: heapless::String<64> = crate::error::truncated(self);
        sink.render(&text);
    }
}

impl From<Completion> for StatusMessage {
    fn from(completion: Completion) -> Self {
        match completion {
            Completion::Finished { position } => StatusMessage::Idle { position },
            Completion::HomingFinished { position } => {
                StatusMessage::HomingSettled { position }
            }
            Completion::Faulted { position } => StatusMessage::Fault { position },
        }
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusMessage::Moving { steps, direction } => {
                write!(f, "Moving: {}\nDir: {}", steps, direction.label())
            }
            StatusMessage::Status {
                steps_remaining,
                direction,
            } => write!(f, "Steps: {}\nDir: {}", steps_remaining, direction.label()),
            StatusMessage::Idle { position } => write!(f, "Status: Idle\nPos: {}", position),
            StatusMessage::Homed => write!(f, "Status: Homed\nPos: 0"),
            StatusMessage::Homing { position } => write!(f, "Status: Homing\nPos: {}", position),
            StatusMessage::HomingSettled { position } => {
                write!(f, "Status: Homing\nPos: {} (re-poll)", position)
            }
            StatusMessage::Stopped { position } => write!(f, "Status: Stopped\nPos: {}", position),
            StatusMessage::Fault { position } => write!(f, "Status: Fault\nPos: {}", position),
            StatusMessage::Reference { reading } => write!(f, "Pot: {}", reading),
        }
    }
}
