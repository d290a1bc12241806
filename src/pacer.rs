//! Quota window pacing.
//!
//! After every request the loop asks the [`QuotaWindow`] how long to wait:
//! a fixed inter-call interval while the window still has room, or a full
//! window of cooldown once the quota is used up.

use std::num::NonZeroU32;
use std::time::Duration;

use crate::error_handling::InitializationError;

/// What the loop does between two fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Quota not exhausted: wait one inter-call interval.
    Pace(Duration),
    /// Quota exhausted: wait a full window, then reset the call count.
    Cooldown(Duration),
}

impl Directive {
    pub fn wait(&self) -> Duration {
        match self {
            Directive::Pace(wait) | Directive::Cooldown(wait) => *wait,
        }
    }

    pub fn is_cooldown(&self) -> bool {
        matches!(self, Directive::Cooldown(_))
    }
}

/// Calls made in the current quota window.
///
/// Owned by the poll loop alone; handler tasks never touch it.
/// Invariant: `0 <= calls_made <= max_calls_per_window`.
#[derive(Debug, Clone)]
pub struct QuotaWindow {
    calls_made: u32,
    max_calls_per_window: NonZeroU32,
    window: Duration,
    interval: Duration,
}

impl QuotaWindow {
    /// Creates an empty window allowing `max_calls_per_window` calls per `window`.
    ///
    /// The inter-call interval is `window / max_calls_per_window` in whole
    /// milliseconds (truncating).
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::InvalidQuota` if `max_calls_per_window` is zero.
    pub fn new(max_calls_per_window: u32, window: Duration) -> Result<Self, InitializationError> {
        let max = NonZeroU32::new(max_calls_per_window).ok_or(InitializationError::InvalidQuota)?;
        let window_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);
        let interval = Duration::from_millis(window_ms / u64::from(max.get()));
        Ok(QuotaWindow {
            calls_made: 0,
            max_calls_per_window: max,
            window,
            interval,
        })
    }

    /// Records one call against the window.
    ///
    /// Saturates at the quota: the loop always cools down and resets before
    /// the next call, so the cap is only reached transiently.
    pub fn record_call(&mut self) {
        if self.calls_made < self.max_calls_per_window.get() {
            self.calls_made += 1;
        }
    }

    /// Directive for the current call count.
    pub fn directive(&self) -> Directive {
        self.directive_for(self.calls_made)
    }

    /// Directive for an arbitrary call count, given this window's constants.
    pub fn directive_for(&self, calls_made: u32) -> Directive {
        if calls_made >= self.max_calls_per_window.get() {
            Directive::Cooldown(self.window)
        } else {
            Directive::Pace(self.interval)
        }
    }

    /// Starts a fresh window. Called once a cooldown has been slept through.
    pub fn reset(&mut self) {
        self.calls_made = 0;
    }

    pub fn calls_made(&self) -> u32 {
        self.calls_made
    }

    pub fn max_calls_per_window(&self) -> u32 {
        self.max_calls_per_window.get()
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Wait between calls while the window has room.
    pub fn interval(&self) -> Duration {
        self.interval
    }
}
