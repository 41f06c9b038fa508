use crate::{
    api::error::ApiError,
    application::Application,
    registry::{ConfigSnapshot, LlmConfigDraft},
};

use axum::{
    Json,
    extract::{Path, State},
};
use mtd_core::model::llm_config::{LlmConfig, LlmConfigId};
use serde::Deserialize;
use uuid::Uuid;

/// 一覧取得のたびに解決を走らせる。管理画面のロードが自己修復の契機でもある。
pub async fn list(State(state): State<Application>) -> Json<ConfigSnapshot> {
    Json(state.registry.resolve().await)
}

pub async fn active(State(state): State<Application>) -> Json<ConfigSnapshot> {
    Json(state.registry.snapshot())
}

pub async fn create(
    State(state): State<Application>,
    Json(draft): Json<LlmConfigDraft>,
) -> Result<Json<LlmConfig>, ApiError> {
    let created = state.registry.create_config(draft).await?;
    Ok(Json(created))
}

pub async fn update(
    State(state): State<Application>,
    Path(id): Path<Uuid>,
    Json(draft): Json<LlmConfigDraft>,
) -> Result<Json<LlmConfig>, ApiError> {
    let updated = state.registry.update_config(LlmConfigId(id), draft).await?;
    Ok(Json(updated))
}

pub async fn remove(
    State(state): State<Application>,
    Path(id): Path<Uuid>,
) -> Result<Json<ConfigSnapshot>, ApiError> {
    state.registry.delete_config(LlmConfigId(id)).await?;
    Ok(Json(state.registry.snapshot()))
}

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    id: Uuid,
}
pub async fn select(
    State(state): State<Application>,
    Json(request): Json<SelectRequest>,
) -> Result<Json<ConfigSnapshot>, ApiError> {
    let snapshot = state.registry.select_config(LlmConfigId(request.id)).await?;
    Ok(Json(snapshot))
}
