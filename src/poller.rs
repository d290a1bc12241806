//! The rate-limited poll loop.
//!
//! One loop alternates between fetching and waiting until its cancellation
//! token fires:
//!
//! 1. **Fetching**: GET the target into the reusable receive buffer. On
//!    success the call is counted, the sequence number advances and a copy of
//!    the buffer is dispatched to a detached handler task. On failure the error
//!    is logged and no handler is spawned.
//! 2. **Waiting**: sleep for the [`QuotaWindow`] directive: one inter-call
//!    interval, or a full window once the quota is used up (after which the
//!    window is reset).
//!
//! Both the fetch and the sleep are raced against the cancellation token.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::FailedCallPolicy;
use crate::dispatch::Dispatcher;
use crate::error_handling::{PollEvent, PollStats, TransportError};
use crate::handler::{ResponseEnvelope, ResponseHandler};
use crate::pacer::{Directive, QuotaWindow};
use crate::transport::Transport;

/// Summary of a poll run, returned once the loop is cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollReport {
    /// Fetches attempted
    pub attempts: u64,
    /// Fetches that returned a body; also the sequence number of the last one
    pub successes: u64,
    /// Fetches that failed
    pub failures: u64,
    /// Wall-clock time the loop ran for
    pub elapsed: Duration,
}

/// Result of a single fetch step.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The body was copied and handed to a detached task.
    Dispatched {
        sequence: u64,
        handle: JoinHandle<()>,
    },
    /// The fetch failed; no handler was spawned.
    Failed(TransportError),
}

/// Polls one target at a bounded rate.
pub struct Poller<T, H> {
    transport: T,
    dispatcher: Dispatcher<H>,
    url: String,
    window: QuotaWindow,
    failed_call_policy: FailedCallPolicy,
    stats: Arc<PollStats>,
    sequence: u64,
    attempts: u64,
    failures: u64,
    buffer: Vec<u8>,
}

impl<T: Transport, H: ResponseHandler> Poller<T, H> {
    /// Creates a poller with an empty quota window and unbounded handler dispatch.
    pub fn new(transport: T, handler: Arc<H>, url: impl Into<String>, window: QuotaWindow) -> Self {
        let stats = Arc::new(PollStats::new());
        Poller {
            transport,
            dispatcher: Dispatcher::new(handler, None, Arc::clone(&stats)),
            url: url.into(),
            window,
            failed_call_policy: FailedCallPolicy::default(),
            stats,
            sequence: 0,
            attempts: 0,
            failures: 0,
            buffer: Vec::new(),
        }
    }

    pub fn with_failed_call_policy(mut self, policy: FailedCallPolicy) -> Self {
        self.failed_call_policy = policy;
        self
    }

    /// Bounds concurrently running handlers by `limit`'s permits.
    pub fn with_handler_limit(mut self, limit: Option<Arc<Semaphore>>) -> Self {
        self.dispatcher = self.dispatcher.with_limit(limit);
        self
    }

    /// Runs until `cancel` fires, then returns a summary.
    ///
    /// Handler tasks still running at that point are left to finish on their own.
    pub async fn run(&mut self, cancel: CancellationToken) -> PollReport {
        let start = Instant::now();
        info!(
            "Polling started: {} calls per {}ms window, {}ms between calls",
            self.window.max_calls_per_window(),
            self.window.window().as_millis(),
            self.window.interval().as_millis()
        );

        while !cancel.is_cancelled() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                // The handle is dropped here: handler tasks are detached
                _ = self.fetch_and_dispatch() => {}
            }

            let directive = self.window.directive();
            if let Directive::Cooldown(wait) = directive {
                self.stats.increment(PollEvent::Cooldown);
                info!(
                    "Rate limit reached. Waiting {}ms for the quota window to reset...",
                    wait.as_millis()
                );
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(directive.wait()) => {}
            }

            if directive.is_cooldown() {
                self.window.reset();
            }
        }

        let report = self.report(start.elapsed());
        info!(
            "Polling stopped after {} attempts ({} succeeded, {} failed)",
            report.attempts, report.successes, report.failures
        );
        report
    }

    /// Performs one Fetching step: fetch, count, and dispatch on success.
    ///
    /// Does not wait; pacing is the caller's job.
    pub async fn fetch_and_dispatch(&mut self) -> FetchOutcome {
        self.buffer.clear();
        self.attempts += 1;
        self.stats.increment(PollEvent::FetchAttempt);
        debug!("Fetch attempt #{}", self.attempts);

        match self.transport.fetch(&self.url, &mut self.buffer).await {
            Ok(()) => {
                self.window.record_call();
                self.sequence += 1;
                self.stats.increment(PollEvent::FetchSuccess);
                let envelope = ResponseEnvelope::copy_from(&self.buffer, self.sequence);
                let handle = self.dispatcher.dispatch(envelope);
                FetchOutcome::Dispatched {
                    sequence: self.sequence,
                    handle,
                }
            }
            Err(e) => {
                if self.failed_call_policy == FailedCallPolicy::ConsumeQuota {
                    self.window.record_call();
                }
                self.failures += 1;
                self.stats.increment(PollEvent::TransportFailure);
                warn!("Fetch attempt #{} failed: {}", self.attempts, e);
                FetchOutcome::Failed(e)
            }
        }
    }

    /// Directive the loop would follow right now.
    pub fn directive(&self) -> Directive {
        self.window.directive()
    }

    /// Calls counted in the current quota window.
    pub fn calls_made(&self) -> u32 {
        self.window.calls_made()
    }

    /// Sequence number of the last successful fetch.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// The receive buffer, holding the body of the last fetch.
    pub fn buffer_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buffer
    }

    pub fn stats(&self) -> Arc<PollStats> {
        Arc::clone(&self.stats)
    }

    fn report(&self, elapsed: Duration) -> PollReport {
        PollReport {
            attempts: self.attempts,
            successes: self.sequence,
            failures: self.failures,
            elapsed,
        }
    }
}
