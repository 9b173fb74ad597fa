use thiserror::Error;

/// Error classes crossing subsystem boundaries.
///
/// Validation errors are per-item and recoverable (the batch continues),
/// provider errors are batch-fatal on the write path and degrade to the
/// fallback tier on the read path, quota errors surface directly to the
/// caller.
#[derive(Debug, Error)]
pub enum RoloError {
    #[error("embedding input is empty")]
    EmptyInput,

    #[error("invalid profile: {0}")]
    InvalidProfile(String),

    #[error("vector dimensions {got} do not match expected {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("embedding provider error: {0}")]
    Provider(String),

    #[error("vector store error: {0}")]
    Store(String),

    #[error("daily search quota exceeded ({used}/{limit})")]
    QuotaExceeded { used: u32, limit: u32 },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RoloError>;
