//! Append-only event log backing the streaming interface.
//!
//! The log is a plain `Vec` guarded by a synchronous `std::sync::Mutex`: the
//! critical section is always a cheap append or slice copy, never spans an
//! `.await`, so a blocking mutex is the right tool here (matching the
//! teacher's distinction between cooperative interleaving and a coarse lock).

use crate::model::EventRecord;
use std::sync::Mutex;
use std::time::Duration;

/// How long a subscriber sleeps between empty polls.
const POLL_INTERVAL: Duration = Duration::from_millis(1500);

#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<EventRecord>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event, stamping nothing further. `timestamp` is set by
    /// the caller (the dispatcher) at the moment of the transition.
    pub fn append(&self, event: EventRecord) {
        let mut events = self.events.lock().expect("event log mutex poisoned");
        events.push(event);
    }

    /// Returns all events recorded at or past `cursor`, along with the new
    /// cursor position. `pub(crate)` since subscribers are owned cursors
    /// built by [`Supervisor`](crate::Supervisor), not borrows of the log.
    pub(crate) fn poll(&self, cursor: usize) -> (Vec<EventRecord>, usize) {
        let events = self.events.lock().expect("event log mutex poisoned");
        if cursor >= events.len() {
            (Vec::new(), cursor)
        } else {
            (events[cursor..].to_vec(), events.len())
        }
    }
}

/// How long [`EventSubscription::next_batch`](crate::supervisor::EventSubscription::next_batch)
/// sleeps after an empty poll.
pub(crate) fn poll_interval() -> Duration {
    POLL_INTERVAL
}
