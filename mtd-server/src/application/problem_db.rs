use crate::application::ApplicationError;

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};
use infer::MatcherType;
use mtd_core::{
    interface::kv::ArcKvStore,
    model::problem::{Problem, ProblemBody, ProblemId},
};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::info;

pub const PROBLEMS_KEY: &str = "problems";

/// 問題バンク。1 本の JSON 配列として KvStore に保持する。
/// 更新は load-modify-save なので write_lock で直列化する。
#[derive(Clone)]
pub struct ProblemDb {
    store: ArcKvStore,
    write_lock: Arc<Mutex<()>>,
}

impl ProblemDb {
    pub fn new(store: ArcKvStore) -> ProblemDb {
        ProblemDb {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn list(&self) -> Result<Vec<Problem>, ApplicationError> {
        self.load().await
    }

    pub async fn find(&self, id: ProblemId) -> Result<Option<Problem>, ApplicationError> {
        let problems = self.load().await?;
        Ok(problems.into_iter().find(|p| p.id == id))
    }

    pub async fn create(&self, draft: ProblemDraft) -> Result<Problem, ApplicationError> {
        let body = draft.body.into_validated()?;
        let problem = Problem::new_now(draft.title, body, draft.explanation, draft.knowledge_elements);

        let _guard = self.write_lock.lock().await;
        let mut problems = self.load().await?;
        problems.push(problem.clone());
        self.save(&problems).await?;
        info!("problem created: {} ({})", problem.title, problem.id.0);
        Ok(problem)
    }

    pub async fn update(&self, id: ProblemId, draft: ProblemDraft) -> Result<Problem, ApplicationError> {
        let body = draft.body.into_validated()?;

        let _guard = self.write_lock.lock().await;
        let mut problems = self.load().await?;
        let Some(existing) = problems.iter_mut().find(|p| p.id == id) else {
            return Err(ApplicationError::NotFound(id.0));
        };
        existing.title = draft.title;
        existing.body = body;
        existing.explanation = draft.explanation;
        existing.knowledge_elements = draft.knowledge_elements;
        existing.touch();
        let updated = existing.clone();

        self.save(&problems).await?;
        Ok(updated)
    }

    pub async fn delete(&self, id: ProblemId) -> Result<(), ApplicationError> {
        let _guard = self.write_lock.lock().await;
        let mut problems = self.load().await?;
        let Some(index) = problems.iter().position(|p| p.id == id) else {
            return Err(ApplicationError::NotFound(id.0));
        };
        problems.remove(index);
        self.save(&problems).await?;
        Ok(())
    }

    async fn load(&self) -> Result<Vec<Problem>, ApplicationError> {
        let Some(raw) = self.store.get(PROBLEMS_KEY).await? else {
            return Ok(vec![]);
        };
        serde_json::from_str(&raw).map_err(ApplicationError::by_serialization)
    }

    async fn save(&self, problems: &[Problem]) -> Result<(), ApplicationError> {
        let raw = serde_json::to_string(problems).map_err(ApplicationError::by_serialization)?;
        self.store.set(PROBLEMS_KEY, &raw).await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProblemDraft {
    pub title: String,
    pub body: ProblemBodyDraft,
    pub explanation: String,
    pub knowledge_elements: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ProblemBodyDraft {
    Text { text: String },
    Image { data: String },
}

impl ProblemBodyDraft {
    /// 画像は base64 として復号できて、かつ画像形式だと判定できるものだけ受け付ける。
    /// mime type は申告ではなく内容から判定する。
    fn into_validated(self) -> Result<ProblemBody, ApplicationError> {
        match self {
            ProblemBodyDraft::Text { text } => Ok(ProblemBody::Text { text }),
            ProblemBodyDraft::Image { data } => {
                let bytes = BASE64_STANDARD
                    .decode(&data)
                    .map_err(|e| ApplicationError::InvalidImage(e.to_string()))?;
                let Some(kind) = infer::get(&bytes) else {
                    return Err(ApplicationError::InvalidImage("unrecognized file format".to_string()));
                };
                if kind.matcher_type() != MatcherType::Image {
                    return Err(ApplicationError::InvalidImage(format!(
                        "not an image: {}",
                        kind.mime_type()
                    )));
                }
                Ok(ProblemBody::Image {
                    data,
                    mime_type: kind.mime_type().to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryKvStore;

    use std::time::Duration;

    use futures::{FutureExt, future::BoxFuture};
    use mtd_core::{error::StorageError, interface::kv::KvStore};

    // 1x1 の PNG。
    const TINY_PNG_BASE64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    fn text_draft(title: &str) -> ProblemDraft {
        ProblemDraft {
            title: title.to_string(),
            body: ProblemBodyDraft::Text {
                text: "3/4 + 1/6 を計算しなさい。".to_string(),
            },
            explanation: "通分して 9/12 + 2/12 = 11/12。".to_string(),
            knowledge_elements: vec!["通分".to_string(), "分数の加法".to_string()],
        }
    }

    #[tokio::test]
    async fn crud_roundtrip() {
        let db = ProblemDb::new(Arc::new(MemoryKvStore::new()));

        let created = db.create(text_draft("分数の足し算")).await.unwrap();
        assert_eq!(db.list().await.unwrap().len(), 1);

        let mut draft = text_draft("分数の足し算 (改)");
        draft.knowledge_elements.push("約分".to_string());
        let updated = db.update(created.id, draft).await.unwrap();
        assert_eq!(updated.title, "分数の足し算 (改)");
        assert_eq!(updated.knowledge_elements.len(), 3);

        db.delete(created.id).await.unwrap();
        assert!(db.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn image_mime_is_sniffed_from_payload() {
        let db = ProblemDb::new(Arc::new(MemoryKvStore::new()));
        let mut draft = text_draft("図形問題");
        draft.body = ProblemBodyDraft::Image {
            data: TINY_PNG_BASE64.to_string(),
        };

        let created = db.create(draft).await.unwrap();
        let ProblemBody::Image { mime_type, .. } = created.body else {
            panic!("image body expected");
        };
        assert_eq!(mime_type, "image/png");
    }

    #[tokio::test]
    async fn non_image_payload_is_rejected() {
        let db = ProblemDb::new(Arc::new(MemoryKvStore::new()));
        let mut draft = text_draft("壊れた画像");
        draft.body = ProblemBodyDraft::Image {
            data: BASE64_STANDARD.encode(b"just some text"),
        };

        let result = db.create(draft).await;
        assert!(matches!(result, Err(ApplicationError::InvalidImage(_))));
    }

    #[tokio::test]
    async fn update_of_unknown_problem_fails() {
        let db = ProblemDb::new(Arc::new(MemoryKvStore::new()));
        let result = db.update(ProblemId::new_now(), text_draft("missing")).await;
        assert!(matches!(result, Err(ApplicationError::NotFound(_))));
    }

    /// set を遅らせて load と save の間の競合窓を広げるテスト用ラッパー。
    #[derive(Clone)]
    struct SlowKvStore(MemoryKvStore);

    impl KvStore for SlowKvStore {
        fn description(&self) -> String {
            "Slow Memory".to_string()
        }

        fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, StorageError>> {
            self.0.get(key)
        }

        fn set<'a>(&'a self, key: &'a str, value: &'a str) -> BoxFuture<'a, Result<(), StorageError>> {
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                self.0.set(key, value).await
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn concurrent_creates_keep_both_problems() {
        let db = ProblemDb::new(Arc::new(SlowKvStore(MemoryKvStore::new())));

        let (first, second) = tokio::join!(db.create(text_draft("問題 A")), db.create(text_draft("問題 B")));
        first.unwrap();
        second.unwrap();

        assert_eq!(db.list().await.unwrap().len(), 2);
    }
}
