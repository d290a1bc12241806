//! Detached handler dispatch.
//!
//! Each successful fetch is handed to [`Dispatcher::dispatch`], which spawns a
//! tokio task for it and returns immediately. The task catches both error
//! returns and panics from the handler, logs them, and records the outcome in
//! [`PollStats`]. Nothing is propagated back to the loop, which drops the
//! returned `JoinHandle` without awaiting it.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use log::{debug, error, warn};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::error_handling::{PollEvent, PollStats};
use crate::handler::{ResponseEnvelope, ResponseHandler};

/// Spawns isolated handler tasks.
pub struct Dispatcher<H> {
    handler: Arc<H>,
    limit: Option<Arc<Semaphore>>,
    stats: Arc<PollStats>,
}

impl<H: ResponseHandler> Dispatcher<H> {
    /// Creates a dispatcher.
    ///
    /// With `limit` set, at most that semaphore's permit count of handlers
    /// run at once. Tasks wait for a permit inside themselves, so
    /// [`dispatch`](Self::dispatch) never blocks.
    pub fn new(handler: Arc<H>, limit: Option<Arc<Semaphore>>, stats: Arc<PollStats>) -> Self {
        Dispatcher {
            handler,
            limit,
            stats,
        }
    }

    /// Replaces the concurrency limit.
    pub fn with_limit(mut self, limit: Option<Arc<Semaphore>>) -> Self {
        self.limit = limit;
        self
    }

    /// Launches a detached task handling `envelope`.
    ///
    /// The handle is returned for callers that want to observe completion;
    /// the poll loop drops it.
    pub fn dispatch(&self, envelope: ResponseEnvelope) -> JoinHandle<()> {
        let handler = Arc::clone(&self.handler);
        let limit = self.limit.clone();
        let stats = Arc::clone(&self.stats);

        tokio::spawn(async move {
            let sequence = envelope.sequence;
            // Hold the permit until the handler finishes
            let _permit = match limit {
                Some(semaphore) => match semaphore.acquire_owned().await {
                    Ok(permit) => Some(permit),
                    Err(_) => {
                        warn!(
                            "Handler limit closed, running handler for call #{} unbounded",
                            sequence
                        );
                        None
                    }
                },
                None => None,
            };

            let outcome = AssertUnwindSafe(async { handler.handle(envelope).await })
                .catch_unwind()
                .await;

            match outcome {
                Ok(Ok(())) => {
                    stats.increment(PollEvent::HandlerSuccess);
                    debug!("Handler for call #{} finished", sequence);
                }
                Ok(Err(e)) => {
                    stats.increment(PollEvent::HandlerFailure);
                    error!("Handler for call #{} failed: {:#}", sequence, e);
                }
                Err(payload) => {
                    stats.increment(PollEvent::HandlerPanic);
                    error!(
                        "Handler for call #{} panicked: {}",
                        sequence,
                        panic_message(payload.as_ref())
                    );
                }
            }
        })
    }

    pub fn stats(&self) -> &Arc<PollStats> {
        &self.stats
    }
}

/// Extracts the message from a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
