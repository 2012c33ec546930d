#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store file access failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store file is not valid: {0}")]
    Serialization(#[from] serde_json::Error),
}
