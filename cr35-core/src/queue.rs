//! Single-in-flight command queue
//!
//! Commands drain strictly in enqueue order, one at a time. The next
//! command is released only after the current one completes or times out;
//! a timed-out command is abandoned with a warning rather than retried.

use std::collections::VecDeque;
use std::time::Instant;

use tracing::warn;

use crate::command::Command;
use crate::constants::COMMAND_TIMEOUT;

/// Ordered queue of pending commands with at most one in flight.
#[derive(Debug, Default)]
pub struct CommandQueue {
    queue: VecDeque<Command>,
    current: Option<Command>,
    last_sent: Option<Instant>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `command` unless an equal command is already queued.
    ///
    /// Returns `false` for the duplicate no-op. The in-flight command does
    /// not participate in the check.
    pub fn enqueue(&mut self, command: Command) -> bool {
        if self.queue.contains(&command) {
            return false;
        }
        self.queue.push_back(command);
        true
    }

    /// Number of commands waiting (not counting the one in flight).
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// The command currently awaiting its response.
    pub fn current(&self) -> Option<&Command> {
        self.current.as_ref()
    }

    /// Mark the in-flight command as answered.
    pub fn complete(&mut self) -> Option<Command> {
        self.last_sent = None;
        self.current.take()
    }

    /// Drop all queued state (fresh connection).
    pub fn clear(&mut self) {
        self.queue.clear();
        self.current = None;
        self.last_sent = None;
    }

    /// Drain tick: release the next command to transmit, if any.
    ///
    /// While a command is in flight and within [`COMMAND_TIMEOUT`] nothing
    /// is released. Once the timeout expires the stuck command is logged
    /// and the head of the queue takes its place.
    pub fn next(&mut self, now: Instant) -> Option<Command> {
        if self.queue.is_empty() {
            return None;
        }

        if let Some(current) = &self.current {
            let expired = self
                .last_sent
                .map_or(true, |sent| now.duration_since(sent) >= COMMAND_TIMEOUT);
            if !expired {
                return None;
            }
            warn!(command = %current, "command timed out, moving on");
        }

        let command = self.queue.pop_front()?;
        self.current = Some(command.clone());
        self.last_sent = Some(now);
        Some(command)
    }
}
