//! Poll statistics tracking.
//!
//! Thread-safe counters shared between the poll loop and its detached handler tasks.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::types::PollEvent;

/// Thread-safe poll statistics tracker.
///
/// One atomic counter per [`PollEvent`], all initialized to zero on creation.
/// Handler tasks update the handler counters concurrently with the loop, so the
/// struct is meant to be shared through an `Arc`.
pub struct PollStats {
    events: HashMap<PollEvent, AtomicUsize>,
}

impl PollStats {
    pub fn new() -> Self {
        let mut events = HashMap::new();
        for event in PollEvent::iter() {
            events.insert(event, AtomicUsize::new(0));
        }
        PollStats { events }
    }

    /// Increment the counter for `event`.
    pub fn increment(&self, event: PollEvent) {
        if let Some(counter) = self.events.get(&event) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to increment counter for {:?} which is not in the map. \
                 This indicates a bug in PollStats initialization.",
                event
            );
        }
    }

    /// Get the count for `event`.
    ///
    /// Returns 0 if the event is not in the map (should never happen if properly initialized).
    pub fn get(&self, event: PollEvent) -> usize {
        self.events
            .get(&event)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Handler outcomes recorded so far (successes, errors and panics).
    pub fn handlers_finished(&self) -> usize {
        self.get(PollEvent::HandlerSuccess)
            + self.get(PollEvent::HandlerFailure)
            + self.get(PollEvent::HandlerPanic)
    }

    /// Logs every non-zero counter at info level.
    pub fn log_summary(&self) {
        for event in PollEvent::iter() {
            let count = self.get(event);
            if count > 0 {
                log::info!("   {}: {}", event, count);
            }
        }
    }
}

impl Default for PollStats {
    fn default() -> Self {
        Self::new()
    }
}
