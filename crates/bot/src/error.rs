//! Error types for the external service adapters.

use thiserror::Error;

/// Failures talking to Telegram, the geocoder, or the weather API.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// HTTP request failed before a response arrived
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The per-request deadline elapsed
    #[error("service did not respond in time")]
    Timeout,

    /// Upstream answered with a non-success HTTP status
    #[error("upstream returned status {status}{}", detail_suffix(.detail))]
    Status { status: u16, detail: Option<String> },

    /// Upstream answered successfully at the HTTP level but reported an error
    #[error("{description}")]
    Api {
        code: Option<i64>,
        description: String,
    },

    /// Rate limited by the service
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Response body did not have the expected shape
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ServiceError {
    /// Map a reqwest failure, keeping timeouts distinguishable. The request URL
    /// is dropped since Telegram URLs embed the bot token.
    pub fn from_request(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ServiceError::Timeout
        } else {
            ServiceError::Http(err.without_url())
        }
    }
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|detail| format!(" ({detail})"))
        .unwrap_or_default()
}

/// Failures resolving a free-text place name.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no location matches '{query}'")]
    NotFound { query: String },

    #[error(transparent)]
    Service(#[from] ServiceError),
}
