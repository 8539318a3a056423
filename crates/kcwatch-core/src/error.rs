use thiserror::Error;

/// Failure of a single request against the management API.
///
/// Every variant is recoverable: the poll loop logs it and moves on.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u128 },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("reading response body from {url} failed: {message}")]
    Read { url: String, message: String },

    #[error("decoding response body from {url} failed: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    /// Whether sending the same request again could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Network { .. } | ApiError::Timeout { .. } | ApiError::Read { .. } => true,
            ApiError::Status { status, .. } => *status >= 500 || *status == 429,
            ApiError::Decode { .. } => false,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            ApiError::Network { url, .. }
            | ApiError::Timeout { url, .. }
            | ApiError::Status { url, .. }
            | ApiError::Read { url, .. }
            | ApiError::Decode { url, .. } => url,
        }
    }
}

#[derive(Debug, Error)]
pub enum WatchdogError {
    #[error("invalid host: {0:?}")]
    InvalidHost(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Only raised when fail-fast on connector list reads is enabled.
    #[error("fatal: {0}")]
    Fatal(#[source] ApiError),
}
