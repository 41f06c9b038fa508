use crate::application::Application;

use axum::{Json, extract::State};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    status: &'static str,
}
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// 公開してよい読み取り専用キーを返す。秘匿キーはここを通らない。
#[derive(Debug, Clone, Serialize)]
pub struct PublicKeyResponse {
    api_key: String,
}
pub async fn public_key(State(state): State<Application>) -> Json<PublicKeyResponse> {
    Json(PublicKeyResponse {
        api_key: state.public_api_key.clone(),
    })
}
