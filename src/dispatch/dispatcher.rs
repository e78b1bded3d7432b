//! Poll wrapper: token allocation and event snapshotting

use std::io;
use std::time::Duration;

use mio::event::Event;
use mio::{Events, Poll, Registry, Token};

use crate::error::{RelaisError, Result};

/// Readiness bits copied out of a multiplexor event.
///
/// Error and peer-hangup conditions are folded into both directions: a read
/// or write attempt on the socket surfaces the underlying failure, which is
/// how the copy engine expects to observe it.
#[derive(Debug, Clone, Copy)]
pub struct EventSnapshot {
    /// The descriptor is readable (or closed/errored, which a read reports)
    pub readable: bool,
    /// The descriptor is writable (or closed/errored, which a write reports)
    pub writable: bool,
}

impl From<&Event> for EventSnapshot {
    fn from(event: &Event) -> Self {
        let failed = event.is_error();
        Self {
            readable: event.is_readable() || event.is_read_closed() || failed,
            writable: event.is_writable() || event.is_write_closed() || failed,
        }
    }
}

/// One dispatched readiness event
#[derive(Debug, Clone, Copy)]
pub struct DispatchEvent {
    /// Token the registration was made under
    pub token: Token,
    /// Readiness bits at dispatch time
    pub readiness: EventSnapshot,
}

/// Wrapper around the readiness multiplexor.
///
/// Owns the poll instance and the event buffer, hands out registration
/// tokens, and copies events out so callers can mutate registrations while
/// iterating a batch.
#[derive(Debug)]
pub struct Dispatcher {
    /// The multiplexor instance
    poll: Poll,
    /// Reusable event buffer
    events: Events,
    /// Next token to hand out
    next_token: usize,
}

impl Dispatcher {
    /// Create a new dispatcher with the given event batch capacity
    pub fn new(events_capacity: usize) -> Result<Self> {
        if events_capacity == 0 {
            return Err(RelaisError::invalid_parameter(
                "events_capacity",
                "Event batch capacity must be greater than 0",
            ));
        }

        let poll = Poll::new().map_err(|e| RelaisError::from_io(e, "failed to create poll"))?;

        Ok(Self {
            poll,
            events: Events::with_capacity(events_capacity),
            // Token(0) is reserved for the listener
            next_token: 1,
        })
    }

    /// Get the registry used for registration calls
    pub fn registry(&self) -> &Registry {
        self.poll.registry()
    }

    /// Allocate a fresh registration token
    pub fn allocate_token(&mut self) -> Token {
        let token = Token(self.next_token);
        self.next_token += 1;
        token
    }

    /// Wait for readiness events and return them as copied-out snapshots.
    ///
    /// An interrupted wait returns an empty batch rather than an error.
    pub fn poll_once(&mut self, timeout: Option<Duration>) -> Result<Vec<DispatchEvent>> {
        if let Err(e) = self.poll.poll(&mut self.events, timeout) {
            if e.kind() == io::ErrorKind::Interrupted {
                return Ok(Vec::new());
            }
            return Err(RelaisError::from_io(e, "poll failed"));
        }

        Ok(self
            .events
            .iter()
            .map(|event| DispatchEvent {
                token: event.token(),
                readiness: EventSnapshot::from(event),
            })
            .collect())
    }
}
