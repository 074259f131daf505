use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("failed to canonicalize value: {0}")]
    Canonicalization(#[from] serde_json::Error),

    #[error("hash computation failed: {0}")]
    HashComputation(String),
}
