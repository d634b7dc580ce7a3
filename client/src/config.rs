use std::{env, str::FromStr, time::Duration};

use tracing::debug;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";

/// Timing and connection settings for a [`MemoryMatchGame`](crate::MemoryMatchGame)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub server_url: String,
    /// Heartbeat period of the state poller
    pub poll_interval: Duration,
    /// How long a matched pair stays plainly revealed before it shows as matched
    pub match_delay: Duration,
    /// How long a mismatched pair stays visible before it is turned back
    pub mismatch_delay: Duration,
    /// Wait between attempts to unstick a failed reset
    pub retry_interval: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            poll_interval: Duration::from_millis(1000),
            match_delay: Duration::from_millis(500),
            mismatch_delay: Duration::from_millis(1000),
            retry_interval: Duration::from_millis(1000),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    /// Read settings from `MEMORY_MATCH_*` environment variables, keeping the
    /// default for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let millis = |key: &str, default: Duration| {
            Duration::from_millis(parse_or(&lookup, key, default.as_millis() as u64))
        };

        let config = Self {
            server_url: lookup("MEMORY_MATCH_SERVER_URL")
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty())
                .unwrap_or(defaults.server_url),
            poll_interval: millis("MEMORY_MATCH_POLL_INTERVAL_MS", defaults.poll_interval),
            match_delay: millis("MEMORY_MATCH_MATCH_DELAY_MS", defaults.match_delay),
            mismatch_delay: millis("MEMORY_MATCH_MISMATCH_DELAY_MS", defaults.mismatch_delay),
            retry_interval: millis("MEMORY_MATCH_RETRY_INTERVAL_MS", defaults.retry_interval),
            request_timeout: Duration::from_secs(parse_or(
                &lookup,
                "MEMORY_MATCH_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )),
        };

        debug!(?config, "Loaded client configuration");
        config
    }
}

/// Zero is not a usable period, so it counts as unparsable
fn parse_or<T: FromStr + PartialEq + Default>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    lookup(key)
        .and_then(|raw| raw.trim().parse::<T>().ok())
        .filter(|value| *value != T::default())
        .unwrap_or(default)
}
