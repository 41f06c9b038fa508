use crate::{application::ApplicationError, registry::RegistryError};

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use mtd_core::error::LlmError;
use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ApiError {
    #[error("application error: {0}")]
    Application(#[from] ApplicationError),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("llm error: {0}")]
    Llm(#[from] LlmError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

#[derive(Debug, Clone, Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::Application(ApplicationError::NotFound(id)) => {
                (StatusCode::NOT_FOUND, format!("entry {id} not found"))
            }
            ApiError::Application(ApplicationError::InvalidImage(message)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, format!("invalid image payload: {message}"))
            }
            ApiError::Application(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),

            ApiError::Registry(RegistryError::NotFound(id)) => {
                (StatusCode::NOT_FOUND, format!("config {id} not found"))
            }
            ApiError::Registry(err @ RegistryError::SystemUndeletable) => {
                (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
            }
            ApiError::Registry(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),

            // ベンダー側の失敗は 502 としてそのまま中継する
            ApiError::Llm(err) => (StatusCode::BAD_GATEWAY, err.to_string()),

            ApiError::InvalidRequest(message) => (StatusCode::UNPROCESSABLE_ENTITY, message),
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}
