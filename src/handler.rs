//! Response handling.
//!
//! Every successful fetch produces a [`ResponseEnvelope`] that is moved into a
//! detached task and passed to a [`ResponseHandler`].

use std::future::Future;

use log::info;

/// Self-contained copy of one fetched response.
///
/// Owned exclusively by the handler task it was moved into. The loop reuses
/// its receive buffer for the next fetch, so the body is always copied out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseEnvelope {
    /// Response body bytes
    pub body: Vec<u8>,
    /// 1-based count of successful fetches, this one included
    pub sequence: u64,
}

impl ResponseEnvelope {
    /// Copies `body` into a new envelope.
    pub fn copy_from(body: &[u8], sequence: u64) -> Self {
        ResponseEnvelope {
            body: body.to_vec(),
            sequence,
        }
    }
}

/// Consumes fetched responses.
///
/// Any error returned, and any panic raised, is caught at the task boundary
/// and logged; neither reaches the poll loop.
pub trait ResponseHandler: Send + Sync + 'static {
    fn handle(
        &self,
        envelope: ResponseEnvelope,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;
}

/// Default handler: logs the size of each response.
///
/// When the body is a JSON array (the sports listing is), the number of
/// entries is logged as well.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ResponseHandler for LoggingHandler {
    async fn handle(&self, envelope: ResponseEnvelope) -> anyhow::Result<()> {
        info!("{}", describe(&envelope));
        Ok(())
    }
}

fn describe(envelope: &ResponseEnvelope) -> String {
    let mut line = format!(
        "Call #{} received response of size {} bytes.",
        envelope.sequence,
        envelope.body.len()
    );
    if let Ok(serde_json::Value::Array(entries)) =
        serde_json::from_slice::<serde_json::Value>(&envelope.body)
    {
        line.push_str(&format!(" ({} entries)", entries.len()));
    }
    line
}
