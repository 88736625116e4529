use std::time::Duration;

/// Core error type shared by the domain layer and the engine.
///
/// Adapters map their specific failures into this type so the harvesting
/// engine can tell transient signals (`FloodWait`) apart from fatal ones and
/// keep per-item failures (`Transfer`) non-fatal.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid message link: {0}")]
    InvalidLink(String),

    #[error("topic not found: {0}")]
    TopicNotFound(i64),

    /// Transient rate-limit signal from the provider. Only the executor
    /// consumes this variant; `retry_after` is the server-specified wait.
    #[error("rate limited by provider (retry after {retry_after:?})")]
    FloodWait { retry_after: Option<Duration> },

    #[error("rate limit retries exhausted")]
    RateLimitExceeded,

    #[error("chat verification failed: {0}")]
    ChatVerificationFailed(String),

    /// Per-item transfer failure. Logged and skipped; never aborts a window.
    #[error("transfer failed: {0}")]
    Transfer(String),

    #[error("configuration incomplete: missing {0}")]
    ConfigurationIncomplete(String),

    #[error("invalid request: {0}")]
    InvariantViolation(String),

    #[error("thumbnail rejected: {0}")]
    Thumbnail(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    /// The transient signal with no server-specified wait duration.
    pub fn flood_wait_unspecified() -> Self {
        Error::FloodWait { retry_after: None }
    }

    pub fn flood_wait(wait: Duration) -> Self {
        Error::FloodWait {
            retry_after: Some(wait),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
