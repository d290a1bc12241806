//! Fetch transport.
//!
//! The poll loop only needs "GET this URL into this buffer". [`Transport`] is
//! that seam; [`HttpTransport`] implements it over one long-lived
//! `reqwest::Client` so the connection pool is reused across iterations.

use std::future::Future;
use std::sync::Arc;

use crate::config::{HEADER_REQUESTS_REMAINING, HEADER_REQUESTS_USED};
use crate::error_handling::TransportError;

/// Performs one GET per call.
///
/// Implementations append the response body to `buf`; the caller clears it
/// beforehand. On error the contents of `buf` are unspecified.
pub trait Transport: Send + Sync {
    fn fetch(
        &self,
        url: &str,
        buf: &mut Vec<u8>,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn fetch(
        &self,
        url: &str,
        buf: &mut Vec<u8>,
    ) -> impl Future<Output = Result<(), TransportError>> + Send {
        (**self).fetch(url, buf)
    }
}

/// HTTP transport backed by a shared `reqwest::Client`.
#[derive(Clone)]
pub struct HttpTransport {
    client: Arc<reqwest::Client>,
}

impl HttpTransport {
    pub fn new(client: Arc<reqwest::Client>) -> Self {
        HttpTransport { client }
    }
}

impl Transport for HttpTransport {
    async fn fetch(&self, url: &str, buf: &mut Vec<u8>) -> Result<(), TransportError> {
        // The URL carries the API key, so it is stripped from every reqwest error
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                url: response.url().path().to_string(),
            });
        }

        if let Some((used, remaining)) = quota_headers(response.headers()) {
            log::debug!("Provider quota: {} used, {} remaining", used, remaining);
        }

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| TransportError::Request(e.without_url()))?
        {
            buf.extend_from_slice(&chunk);
        }
        Ok(())
    }
}

/// The provider's `(used, remaining)` request counters, when both are sent.
fn quota_headers(headers: &reqwest::header::HeaderMap) -> Option<(&str, &str)> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    Some((header(HEADER_REQUESTS_USED)?, header(HEADER_REQUESTS_REMAINING)?))
}
