//! The polled target: endpoint plus API key, fixed for the process lifetime.

use url::Url;

use crate::config::constants::API_KEY_QUERY_PARAM;
use crate::error_handling::InitializationError;

/// Endpoint URL with the API key attached as a query parameter.
///
/// Built once at startup and never modified. `Debug` and
/// [`redacted_url`](Target::redacted_url) mask the key so it never ends up in logs.
#[derive(Clone)]
pub struct Target {
    url: Url,
    api_key: String,
}

impl Target {
    /// Appends `api_key` to `endpoint` as the `apiKey` query parameter.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::InvalidEndpoint` if `endpoint` is not a valid URL.
    pub fn new(endpoint: &str, api_key: &str) -> Result<Self, InitializationError> {
        let mut url = Url::parse(endpoint)?;
        url.query_pairs_mut()
            .append_pair(API_KEY_QUERY_PARAM, api_key);
        Ok(Target {
            url,
            api_key: api_key.to_string(),
        })
    }

    /// Full request URL, key included.
    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Request URL with the key value replaced by `***`.
    pub fn redacted_url(&self) -> String {
        let mut redacted = self.url.clone();
        let pairs: Vec<(String, String)> = self
            .url
            .query_pairs()
            .map(|(k, v)| {
                if k == API_KEY_QUERY_PARAM {
                    (k.into_owned(), "***".to_string())
                } else {
                    (k.into_owned(), v.into_owned())
                }
            })
            .collect();
        redacted.query_pairs_mut().clear().extend_pairs(pairs);
        redacted.to_string()
    }
}

impl std::fmt::Debug for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Target")
            .field("url", &self.redacted_url())
            .finish()
    }
}
