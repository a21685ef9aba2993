use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConntrailError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConntrailError>;
