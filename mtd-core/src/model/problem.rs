use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProblemId(pub Uuid);

impl ProblemId {
    pub fn new_now() -> ProblemId {
        ProblemId(Uuid::now_v7())
    }
}

/// 問題バンクの 1 問。本文はテキストまたは画像。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    pub id: ProblemId,
    pub title: String,
    pub body: ProblemBody,
    pub explanation: String,
    pub knowledge_elements: Vec<String>,

    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ProblemBody {
    Text { text: String },
    Image { data: String, mime_type: String },
}

impl Problem {
    pub fn new_now(
        title: impl Into<String>,
        body: ProblemBody,
        explanation: impl Into<String>,
        knowledge_elements: impl IntoIterator<Item = impl Into<String>>,
    ) -> Problem {
        let now = OffsetDateTime::now_utc();
        Problem {
            id: ProblemId::new_now(),
            title: title.into(),
            body,
            explanation: explanation.into(),
            knowledge_elements: knowledge_elements.into_iter().map(|e| e.into()).collect(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = OffsetDateTime::now_utc();
    }

    /// プロンプトに埋め込むための本文表現。画像問題は添付前提のプレースホルダになる。
    pub fn body_text(&self) -> &str {
        match &self.body {
            ProblemBody::Text { text } => text,
            ProblemBody::Image { .. } => "(添付画像の問題)",
        }
    }
}
