//! Configuration constants (used as defaults).

/// Key file read at startup
pub const DEFAULT_CONFIG_FILE: &str = "config.ini";

/// Key looked up in the key file
pub const DEFAULT_API_KEY_NAME: &str = "API_KEY";

/// Query parameter that carries the API key on every request
pub const API_KEY_QUERY_PARAM: &str = "apiKey";

/// Endpoint polled when none is given
pub const DEFAULT_ENDPOINT: &str = "https://api.the-odds-api.com/v4/sports";

// Quota window
/// Calls allowed per window (20 per minute on the provider's free tier)
pub const DEFAULT_MAX_CALLS_PER_WINDOW: u32 = 20;
/// Length of the quota window in milliseconds
pub const DEFAULT_WINDOW_MS: u64 = 60_000;

// Network operation timeouts
/// Per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default User-Agent string for HTTP requests.
pub const DEFAULT_USER_AGENT: &str = concat!("odds_poller/", env!("CARGO_PKG_VERSION"));

// Provider quota headers, logged when present
pub const HEADER_REQUESTS_REMAINING: &str = "x-requests-remaining";
pub const HEADER_REQUESTS_USED: &str = "x-requests-used";
