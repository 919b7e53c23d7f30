use thiserror::Error;

#[derive(Error, Debug)]
pub enum LingoError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),

    /// Non-string content reached the background worker.
    #[error("invalid_content")]
    InvalidContent,

    /// The worker caught an exception while scanning.
    #[error("worker error: {0}")]
    Worker(String),

    /// No terminal message arrived within the configured timeout.
    #[error("format_timeout")]
    Timeout,

    /// The dispatcher was torn down while the request was in flight.
    #[error("worker_terminated")]
    Terminated,

    /// The request could not be handed to the worker.
    #[error("post failed: {0}")]
    PostFailed(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, LingoError>;
