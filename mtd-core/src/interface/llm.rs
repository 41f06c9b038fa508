use crate::{error::LlmError, model::schema::FieldSchema};

use std::sync::Arc;

use futures::future::BoxFuture;

pub type ArcLlmBackend = Arc<dyn LlmBackend + 'static>;

/// 診断 1 ターン分を LLM ベンダーに送る抽象化。
pub trait LlmBackend: Send + Sync {
    /// `DiagnosisRequest` を送信する。
    fn send_diagnosis<'a>(
        &'a self,
        request: &'a DiagnosisRequest,
    ) -> BoxFuture<'a, Result<DiagnosisReply, LlmError>>;
}

/// 解決済みの `LlmConfig` から組み立てられる単一ターンのリクエスト。
#[derive(Debug, Clone)]
pub struct DiagnosisRequest {
    pub model: String,
    pub system_instruction: String,
    pub user_text: String,
    pub user_image: Option<InlineImage>,
    pub temperature: f64,
    pub max_output_tokens: u32,
    pub thinking_budget: Option<u32>,
    pub response_schema: Option<FieldSchema>,
}

/// 問題画像をリクエストに同梱するときの base64 ペイロード。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone)]
pub enum DiagnosisReply {
    Finished(String),
    LengthCut(String),
    Filtered,
}

impl DiagnosisReply {
    pub fn text(&self) -> Option<&str> {
        match self {
            DiagnosisReply::Finished(text) | DiagnosisReply::LengthCut(text) => Some(text),
            DiagnosisReply::Filtered => None,
        }
    }
}
