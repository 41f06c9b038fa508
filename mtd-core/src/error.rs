use std::error::Error as StdError;

use thiserror::Error as ThisError;

type ErasedError = Box<dyn StdError + Send + Sync + 'static>;

#[derive(Debug, ThisError)]
pub enum StorageError {
    #[error("backend error: {0}")]
    Backend(#[source] ErasedError),

    #[error("serialization error: {0}")]
    Serialization(#[source] ErasedError),
}

impl StorageError {
    pub fn by_backend(source: impl Into<ErasedError>) -> StorageError {
        StorageError::Backend(source.into())
    }

    pub fn by_serialization(source: impl Into<ErasedError>) -> StorageError {
        StorageError::Serialization(source.into())
    }
}

#[derive(Debug, ThisError)]
pub enum LlmError {
    #[error("communication error: {0}")]
    Communication(#[source] ErasedError),

    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("unexpected response shape: {0}")]
    ResponseFormat(String),
}

impl LlmError {
    pub fn by_communication(source: impl Into<ErasedError>) -> LlmError {
        LlmError::Communication(source.into())
    }
}
