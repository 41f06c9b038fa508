use crate::{
    api::error::ApiError,
    application::{Application, PromptDraft},
};

use axum::{Json, extract::State};
use mtd_core::model::prompt::PromptVersion;

pub async fn list(State(state): State<Application>) -> Result<Json<Vec<PromptVersion>>, ApiError> {
    let versions = state.prompts.list().await?;
    Ok(Json(versions))
}

pub async fn current(State(state): State<Application>) -> Result<Json<Option<PromptVersion>>, ApiError> {
    let version = state.prompts.current().await?;
    Ok(Json(version))
}

pub async fn append(
    State(state): State<Application>,
    Json(draft): Json<PromptDraft>,
) -> Result<Json<PromptVersion>, ApiError> {
    let appended = state.prompts.append(draft).await?;
    Ok(Json(appended))
}
