use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Engine-wide error taxonomy. Fetch failures are always local to a single
/// URL; they never abort a crawl.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("index codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("index metadata error: {0}")]
    Meta(#[from] serde_json::Error),

    #[error("update queue is closed")]
    QueueClosed,
}
