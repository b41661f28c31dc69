#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("storage is not available: changes are kept in memory for this session only")]
    StorageUnavailable,

    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
