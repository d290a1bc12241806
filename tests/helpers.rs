// Shared test doubles for the poll loop: a scripted transport and a recording handler.
//
// Used by several test files through `mod helpers;`.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use odds_poller::{CancellationToken, ResponseEnvelope, ResponseHandler, Transport, TransportError};
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Outcome of one scripted fetch.
#[derive(Clone, Copy, Debug)]
pub enum Step {
    Body(&'static [u8]),
    Fail(&'static str),
}

/// Transport that plays back a fixed script and records when each fetch happened.
///
/// Calls past the end of the script return an empty body. Once `stop_after`
/// fetches have been made the token is cancelled, ending the poll loop.
pub struct ScriptedTransport {
    script: Vec<Step>,
    calls: Mutex<Vec<Instant>>,
    stop_after: usize,
    cancel: CancellationToken,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Step>, stop_after: usize, cancel: CancellationToken) -> Arc<Self> {
        Arc::new(ScriptedTransport {
            script,
            calls: Mutex::new(Vec::new()),
            stop_after,
            cancel,
        })
    }

    /// Never cancels; for tests that drive `fetch_and_dispatch` by hand.
    pub fn unbounded(script: Vec<Step>) -> Arc<Self> {
        Self::new(script, usize::MAX, CancellationToken::new())
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Transport for ScriptedTransport {
    async fn fetch(&self, _url: &str, buf: &mut Vec<u8>) -> Result<(), TransportError> {
        let n = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(Instant::now());
            calls.len()
        };
        if n >= self.stop_after {
            self.cancel.cancel();
        }
        match self.script.get(n - 1).copied().unwrap_or(Step::Body(b"")) {
            Step::Body(body) => {
                buf.extend_from_slice(body);
                Ok(())
            }
            Step::Fail(msg) => Err(TransportError::Other(msg.to_string())),
        }
    }
}

/// Misbehaviour injected into the recording handler.
#[derive(Clone, Copy, Debug)]
pub enum Fault {
    None,
    ErrorOn(u64),
    PanicOn(u64),
}

/// Handler that forwards every envelope it sees on a channel.
///
/// The envelope is sent before any injected fault fires, so a failing call is
/// still observable. With `delay` set, the handler sleeps before reading the body.
pub struct RecordingHandler {
    tx: mpsc::UnboundedSender<ResponseEnvelope>,
    fault: Fault,
    delay: Option<std::time::Duration>,
}

impl RecordingHandler {
    pub fn new(fault: Fault) -> (Arc<Self>, mpsc::UnboundedReceiver<ResponseEnvelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Arc::new(RecordingHandler {
                tx,
                fault,
                delay: None,
            }),
            rx,
        )
    }

    pub fn slow(
        delay: std::time::Duration,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<ResponseEnvelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Arc::new(RecordingHandler {
                tx,
                fault: Fault::None,
                delay: Some(delay),
            }),
            rx,
        )
    }
}

impl ResponseHandler for RecordingHandler {
    async fn handle(&self, envelope: ResponseEnvelope) -> anyhow::Result<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let sequence = envelope.sequence;
        let _ = self.tx.send(envelope);
        match self.fault {
            Fault::ErrorOn(n) if n == sequence => anyhow::bail!("handler rejected call #{}", n),
            Fault::PanicOn(n) if n == sequence => panic!("handler crashed on call #{}", n),
            _ => Ok(()),
        }
    }
}

/// Receives `n` envelopes and returns them ordered by sequence number.
pub async fn collect(
    rx: &mut mpsc::UnboundedReceiver<ResponseEnvelope>,
    n: usize,
) -> Vec<ResponseEnvelope> {
    let mut seen = Vec::with_capacity(n);
    for _ in 0..n {
        seen.push(rx.recv().await.expect("handler channel closed early"));
    }
    seen.sort_by_key(|e| e.sequence);
    seen
}
