//! Config - watchdog の設定
//!
//! CLI から組み立てられ、PollLoop と HttpConnectApi に注入されます。
//! グローバルな状態は持ちません。
//!
//! デフォルト値は「timeout なし・retry なし・fire-and-forget」です。

use std::time::Duration;

use crate::error::WatchdogError;

/// Default management API host.
pub const DEFAULT_HOST: &str = "localhost:8083";

/// Default minutes between two poll cycles.
pub const DEFAULT_INTERVAL_MINUTES: u64 = 15;

/// Prepend `http://` unless the host already carries a scheme (`scheme://`),
/// then strip one trailing slash.
///
/// `"myhost:8083/"` becomes `"http://myhost:8083"`, and so does a host whose
/// name merely starts with `http`, e.g. `"httpbin:8083"`.
pub fn normalize_host(host: &str) -> Result<String, WatchdogError> {
    let host = host.trim();
    if host.is_empty() {
        return Err(WatchdogError::InvalidHost(host.to_string()));
    }
    let mut url = if host.contains("://") {
        host.to_string()
    } else {
        format!("http://{host}")
    };
    if url.ends_with('/') {
        url.pop();
    }
    Ok(url)
}

/// How fanned-out work is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConcurrencyPolicy {
    /// Spawn and forget. Cycles may overlap; shutdown abandons in-flight work.
    #[default]
    FireAndForget,

    /// Track every unit so shutdown can drain them. With `max_in_flight`,
    /// at most that many units talk to the API at once (a bound of 0 would
    /// never admit anything, so it is raised to 1; the CLI rejects 0).
    Tracked { max_in_flight: Option<usize> },
}

/// Per-request timeout and retry.
///
/// Retries use a fixed delay between attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPolicy {
    /// `None` leaves it to the transport.
    pub timeout: Option<Duration>,

    /// Extra attempts after the first one fails.
    pub max_retries: u32,

    /// Delay before each retry.
    pub retry_delay: Duration,
}

impl Default for RequestPolicy {
    fn default() -> Self {
        Self {
            timeout: None,
            max_retries: 0,
            retry_delay: Duration::from_secs(1),
        }
    }
}

impl RequestPolicy {
    /// Total number of attempts for one request.
    pub fn attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

#[derive(Debug, Clone)]
pub struct WatchdogConfig {
    /// Normalized base URL, no trailing slash.
    pub base_url: String,

    /// Sleep between the end of one cycle's launch phase and the next cycle.
    pub interval: Duration,

    pub concurrency: ConcurrencyPolicy,

    pub request: RequestPolicy,

    /// Exit the loop with `WatchdogError::Fatal` when the connector list body
    /// cannot be read. Off by default: such failures are logged and skipped
    /// like any other.
    pub fail_fast_on_list_read: bool,
}

impl WatchdogConfig {
    pub fn new(host: &str, interval: Duration) -> Result<Self, WatchdogError> {
        Ok(Self {
            base_url: normalize_host(host)?,
            interval,
            concurrency: ConcurrencyPolicy::default(),
            request: RequestPolicy::default(),
            fail_fast_on_list_read: false,
        })
    }

    pub fn with_concurrency(mut self, concurrency: ConcurrencyPolicy) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_request_policy(mut self, request: RequestPolicy) -> Self {
        self.request = request;
        self
    }

    pub fn with_fail_fast_on_list_read(mut self, enabled: bool) -> Self {
        self.fail_fast_on_list_read = enabled;
        self
    }
}
