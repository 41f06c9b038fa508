mod inner;

use crate::registry::inner::ConfigRegistryInner;

use std::sync::Arc;

use mtd_core::{
    error::StorageError,
    interface::kv::ArcKvStore,
    model::{
        llm_config::{LlmConfig, LlmConfigId, LlmProvider},
        schema::FieldSchema,
    },
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;
use time::OffsetDateTime;
use tokio::sync::watch;
use uuid::Uuid;

/// 設定一覧の JSON 配列を保持するキー。
pub const CONFIGS_KEY: &str = "llm_configs";
/// 選択中設定の id 文字列を保持するキー。
pub const SELECTED_CONFIG_KEY: &str = "selected_llm_config_id";

/// アクティブ設定の解決・自己修復を担う。
/// 解決は起動時と設定変更通知のたびに走り、すでに治癒済みのデータに対しては冪等。
#[derive(Clone)]
pub struct ConfigRegistry(Arc<ConfigRegistryInner>);

impl ConfigRegistry {
    pub fn new(store: ArcKvStore) -> ConfigRegistry {
        ConfigRegistry(Arc::new(ConfigRegistryInner::new(store)))
    }

    /// 解決を 1 回実行する。自己修復の書き戻しも完了した状態のスナップショットを返す。
    pub async fn resolve(&self) -> ConfigSnapshot {
        self.0.resolve().await
    }

    /// 最後に解決したスナップショットを返す。
    pub fn snapshot(&self) -> ConfigSnapshot {
        self.0.snapshot_tx.borrow().clone()
    }

    /// 解決のたびに再送信されるスナップショットの購読。
    pub fn subscribe(&self) -> watch::Receiver<ConfigSnapshot> {
        self.0.snapshot_tx.subscribe()
    }

    pub async fn create_config(&self, draft: LlmConfigDraft) -> Result<LlmConfig, RegistryError> {
        let created = self.0.create(draft).await?;
        self.0.resolve().await;
        Ok(created)
    }

    pub async fn update_config(&self, id: LlmConfigId, draft: LlmConfigDraft) -> Result<LlmConfig, RegistryError> {
        let updated = self.0.update(id, draft).await?;
        self.0.resolve().await;
        Ok(updated)
    }

    pub async fn delete_config(&self, id: LlmConfigId) -> Result<(), RegistryError> {
        self.0.delete(id).await?;
        self.0.resolve().await;
        Ok(())
    }

    pub async fn select_config(&self, id: LlmConfigId) -> Result<ConfigSnapshot, RegistryError> {
        self.0.select(id).await?;
        Ok(self.0.resolve().await)
    }
}

/// 解決結果の 4 フィールドスナップショット。
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSnapshot {
    pub configs: Vec<LlmConfig>,
    pub active_configs: Vec<LlmConfig>,
    pub current: Option<LlmConfig>,
    pub error: Option<String>,
}

impl ConfigSnapshot {
    fn empty() -> ConfigSnapshot {
        ConfigSnapshot {
            configs: vec![],
            active_configs: vec![],
            current: None,
            error: None,
        }
    }

    fn broken(message: impl Into<String>) -> ConfigSnapshot {
        ConfigSnapshot {
            configs: vec![],
            active_configs: vec![],
            current: None,
            error: Some(message.into()),
        }
    }
}

/// 管理 API から受け取る作成・更新用の内容。id とタイムスタンプはサーバー側で採番する。
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfigDraft {
    pub name: String,
    pub description: String,
    pub version: String,
    pub system_prompt: String,
    pub user_prompt_template: Option<String>,
    pub input_schema: FieldSchema,
    pub output_schema: FieldSchema,
    pub provider: LlmProvider,
    pub model: String,
    pub temperature: f64,
    pub max_output_tokens: u32,
    pub thinking_budget: Option<u32>,
    pub is_active: bool,
}

impl LlmConfigDraft {
    fn into_config(self) -> LlmConfig {
        let now = OffsetDateTime::now_utc();
        LlmConfig {
            id: LlmConfigId::new_now(),
            name: self.name,
            description: self.description,
            version: self.version,
            system_prompt: self.system_prompt,
            user_prompt_template: self.user_prompt_template,
            input_schema: self.input_schema,
            output_schema: self.output_schema,
            provider: self.provider,
            model: self.model,
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
            thinking_budget: self.thinking_budget,
            created_at: now,
            updated_at: now,
            is_active: self.is_active,
            is_system: false,
        }
    }

    /// `is_system` と作成時刻は維持したまま編集内容を反映する。
    fn apply_to(self, config: &mut LlmConfig) {
        config.name = self.name;
        config.description = self.description;
        config.version = self.version;
        config.system_prompt = self.system_prompt;
        config.user_prompt_template = self.user_prompt_template;
        config.input_schema = self.input_schema;
        config.output_schema = self.output_schema;
        config.provider = self.provider;
        config.model = self.model;
        config.temperature = self.temperature;
        config.max_output_tokens = self.max_output_tokens;
        config.thinking_budget = self.thinking_budget;
        config.is_active = self.is_active;
    }
}

#[derive(Debug, ThisError)]
pub enum RegistryError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("stored config list is broken: {0}")]
    Broken(String),

    #[error("config {0} not found")]
    NotFound(Uuid),

    #[error("system default config cannot be deleted")]
    SystemUndeletable,
}
