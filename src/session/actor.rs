//! Network-side command actor.
//!
//! The transport thread parses wire messages into [`Command`]s and pushes
//! them onto a bounded SPSC ring; this actor drains the ring in order and
//! applies each command to the session input. Sequencing `reset_fill`
//! through the same ring as `accept` guarantees the render side never
//! observes a partially flushed queue.

use crate::protocol::{Command, EventSink, SessionEvent};
use crate::session::SessionInput;
use rtrb::{Consumer, Producer, RingBuffer};
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

const IDLE_POLL: Duration = Duration::from_millis(1);

/// Create the bounded command ring connecting the transport to the actor.
pub fn command_channel(capacity: usize) -> (Producer<Command>, Consumer<Command>) {
    RingBuffer::new(capacity)
}

/// Drains commands into a [`SessionInput`] until the transport goes away or
/// a fatal protocol error ends the session.
pub struct SessionActor {
    commands: Consumer<Command>,
    input: SessionInput,
    events: EventSink,
}

impl SessionActor {
    pub fn new(commands: Consumer<Command>, input: SessionInput) -> Self {
        let events = input.event_sink();
        Self {
            commands,
            input,
            events,
        }
    }

    pub fn run(mut self) {
        info!("session actor started");
        loop {
            match self.commands.pop() {
                Ok(command) => {
                    if let Err(error) = self.input.apply(command) {
                        let fatal = error.is_fatal();
                        warn!(%error, fatal, "command failed");
                        self.events.send(SessionEvent::Error(error));
                        if fatal {
                            // The transport collaborator is expected to tear
                            // down and reconnect with a fresh session.
                            break;
                        }
                    }
                }
                Err(_) => {
                    if self.commands.is_abandoned() {
                        info!("transport closed, session actor exiting");
                        break;
                    }
                    thread::park_timeout(IDLE_POLL);
                }
            }
        }
    }
}
