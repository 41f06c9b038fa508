use std::error::Error as StdError;

use mtd_core::error::StorageError;
use thiserror::Error as ThisError;
use uuid::Uuid;

type ErasedError = Box<dyn StdError + Send + Sync + 'static>;

#[derive(Debug, ThisError)]
pub enum ApplicationError {
    #[error("backend error: {0}")]
    Backend(#[source] ErasedError),

    #[error("serialization error: {0}")]
    Serialization(#[source] ErasedError),

    #[error("entry {0} not found")]
    NotFound(Uuid),

    #[error("invalid image payload: {0}")]
    InvalidImage(String),
}

impl ApplicationError {
    pub fn by_serialization(source: impl Into<ErasedError>) -> ApplicationError {
        ApplicationError::Serialization(source.into())
    }
}

impl From<StorageError> for ApplicationError {
    fn from(value: StorageError) -> ApplicationError {
        match value {
            StorageError::Backend(source) => ApplicationError::Backend(source),
            StorageError::Serialization(source) => ApplicationError::Serialization(source),
        }
    }
}
