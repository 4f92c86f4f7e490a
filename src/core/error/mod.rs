use std::path::PathBuf;

/// Result type for queue operations.
pub type Result<T> = std::result::Result<T, QueueError>;

/// Precondition failures reported by queue operations.
///
/// Every variant leaves the queue exactly as it was before the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// The item's link is already threaded into a queue.
    #[error("item is already queued")]
    AlreadyQueued,

    /// An anchor item (e.g. the `before` argument of an insert) is not queued.
    #[error("anchor item is not queued")]
    NotQueued,

    /// The item is not a member of the queue it was looked up in.
    #[error("item not found in queue")]
    NotFound,
}

/// Failures loading or validating a stress run configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Failures of the stress harness and its report sink.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{role} thread panicked")]
    WorkerPanicked { role: &'static str },

    #[error("report io: {0}")]
    Io(#[from] std::io::Error),

    #[error("report encoding: {0}")]
    Encode(#[from] serde_json::Error),
}
