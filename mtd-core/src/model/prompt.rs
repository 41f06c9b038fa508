use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PromptVersionId(pub Uuid);

impl PromptVersionId {
    pub fn new_now() -> PromptVersionId {
        PromptVersionId(Uuid::now_v7())
    }
}

/// システムプロンプトの 1 世代。履歴は追記のみで、末尾が現行版。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptVersion {
    pub id: PromptVersionId,
    pub version: String,
    pub content: String,
    pub note: Option<String>,

    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl PromptVersion {
    pub fn new_now(version: impl Into<String>, content: impl Into<String>, note: Option<String>) -> PromptVersion {
        PromptVersion {
            id: PromptVersionId::new_now(),
            version: version.into(),
            content: content.into(),
            note,
            created_at: OffsetDateTime::now_utc(),
        }
    }
}
