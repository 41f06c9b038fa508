use jsonwebtoken::errors::Error as JwtError;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum JwtAuthError {
    #[error("JWT header required")]
    JwtRequired,

    #[error("JWT failure: {0}")]
    JwtError(#[from] JwtError),

    #[error("subject '{0}' is not allowed")]
    SubjectNotAllowed(String),
}
