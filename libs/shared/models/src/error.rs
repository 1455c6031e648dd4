use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures raised by the keyed in-memory stores every cell builds on.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreError {
    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),
}

impl StoreError {
    pub fn key(&self) -> &str {
        match self {
            StoreError::NotFound(key) | StoreError::DuplicateKey(key) => key,
        }
    }
}
