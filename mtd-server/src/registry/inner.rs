use crate::registry::{CONFIGS_KEY, ConfigSnapshot, LlmConfigDraft, RegistryError, SELECTED_CONFIG_KEY};

use mtd_core::{
    interface::kv::ArcKvStore,
    model::llm_config::{LlmConfig, LlmConfigId},
};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct ConfigRegistryInner {
    store: ArcKvStore,
    resolution_lock: Mutex<()>,
    pub snapshot_tx: watch::Sender<ConfigSnapshot>,
}

impl ConfigRegistryInner {
    pub fn new(store: ArcKvStore) -> ConfigRegistryInner {
        let (snapshot_tx, _) = watch::channel(ConfigSnapshot::empty());
        ConfigRegistryInner {
            store,
            resolution_lock: Mutex::new(()),
            snapshot_tx,
        }
    }

    /// 解決を 1 回実行してスナップショットを差し替える。
    /// 失敗は error フィールドつきのスナップショットとして表面化し、panic しない。
    pub async fn resolve(&self) -> ConfigSnapshot {
        let _guard = self.resolution_lock.lock().await;
        let snapshot = match self.resolve_once().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!("configuration resolution failed: {err}");
                ConfigSnapshot::broken(err.to_string())
            }
        };
        self.snapshot_tx.send_replace(snapshot.clone());
        snapshot
    }

    async fn resolve_once(&self) -> Result<ConfigSnapshot, RegistryError> {
        let mut configs = match self.load_list().await? {
            Some(configs) if !configs.is_empty() => configs,
            _ => {
                // 空ストレージ: システム標準を播種して最初から解決し直す
                let seeded = LlmConfig::system_default();
                info!("no stored configs; seeding system default {}", seeded.id.0);
                self.save_list(std::slice::from_ref(&seeded)).await?;
                self.save_selected(seeded.id).await?;
                self.load_list().await?.unwrap_or_default()
            }
        };

        // システム標準が消えていたら先頭に復活させる
        if !configs.iter().any(|c| c.is_system) {
            let restored = LlmConfig::system_default();
            info!("system default config missing; restored as {}", restored.id.0);
            configs.insert(0, restored);
            self.save_list(&configs).await?;
        }

        // システム標準は常に選択可能でなければならない
        if let Some(system) = configs.iter_mut().find(|c| c.is_system && !c.is_active) {
            system.is_active = true;
            warn!("system default config was deactivated; forced back to active");
            self.save_list(&configs).await?;
        }

        let active_configs: Vec<_> = configs.iter().filter(|c| c.is_active).cloned().collect();

        let selected_id = self.load_selected().await?;
        let current = selected_id
            .and_then(|id| active_configs.iter().find(|c| c.id == id))
            .or_else(|| active_configs.first())
            .or_else(|| configs.first())
            .cloned();

        let Some(current) = current else {
            // 全フォールバック後も候補が残らないのは内部不整合のときだけ
            return Ok(ConfigSnapshot {
                configs,
                active_configs,
                current: None,
                error: Some("no configuration available after all fallbacks".to_string()),
            });
        };

        if selected_id != Some(current.id) {
            self.save_selected(current.id).await?;
            debug!("selected config id rewritten to {}", current.id.0);
        }

        Ok(ConfigSnapshot {
            configs,
            active_configs,
            current: Some(current),
            error: None,
        })
    }

    pub async fn create(&self, draft: LlmConfigDraft) -> Result<LlmConfig, RegistryError> {
        let _guard = self.resolution_lock.lock().await;
        let mut configs = self.load_list().await?.unwrap_or_default();
        let created = draft.into_config();
        configs.push(created.clone());
        self.save_list(&configs).await?;
        info!("config created: {} ({})", created.name, created.id.0);
        Ok(created)
    }

    pub async fn update(&self, id: LlmConfigId, draft: LlmConfigDraft) -> Result<LlmConfig, RegistryError> {
        let _guard = self.resolution_lock.lock().await;
        let mut configs = self.load_list().await?.unwrap_or_default();
        let Some(existing) = configs.iter_mut().find(|c| c.id == id) else {
            return Err(RegistryError::NotFound(id.0));
        };
        draft.apply_to(existing);
        existing.touch();
        let updated = existing.clone();
        self.save_list(&configs).await?;
        Ok(updated)
    }

    pub async fn delete(&self, id: LlmConfigId) -> Result<(), RegistryError> {
        let _guard = self.resolution_lock.lock().await;
        let mut configs = self.load_list().await?.unwrap_or_default();
        let Some(index) = configs.iter().position(|c| c.id == id) else {
            return Err(RegistryError::NotFound(id.0));
        };
        if configs[index].is_system {
            return Err(RegistryError::SystemUndeletable);
        }
        let removed = configs.remove(index);
        self.save_list(&configs).await?;
        info!("config deleted: {} ({})", removed.name, removed.id.0);
        Ok(())
    }

    /// 未知の id の選択はログだけ残して無視し、以前の選択を保持する。
    pub async fn select(&self, id: LlmConfigId) -> Result<(), RegistryError> {
        let _guard = self.resolution_lock.lock().await;
        let configs = self.load_list().await?.unwrap_or_default();
        if configs.iter().any(|c| c.id == id) {
            self.save_selected(id).await?;
        } else {
            warn!("selection of unknown config {} ignored", id.0);
        }
        Ok(())
    }

    async fn load_list(&self) -> Result<Option<Vec<LlmConfig>>, RegistryError> {
        let Some(raw) = self.store.get(CONFIGS_KEY).await? else {
            return Ok(None);
        };
        let configs = serde_json::from_str(&raw).map_err(|e| RegistryError::Broken(e.to_string()))?;
        Ok(Some(configs))
    }

    async fn save_list(&self, configs: &[LlmConfig]) -> Result<(), RegistryError> {
        let raw = serde_json::to_string(configs).map_err(|e| RegistryError::Broken(e.to_string()))?;
        self.store.set(CONFIGS_KEY, &raw).await?;
        Ok(())
    }

    async fn load_selected(&self) -> Result<Option<LlmConfigId>, RegistryError> {
        let raw = self.store.get(SELECTED_CONFIG_KEY).await?;
        Ok(raw.and_then(|r| Uuid::parse_str(&r).ok()).map(LlmConfigId))
    }

    async fn save_selected(&self, id: LlmConfigId) -> Result<(), RegistryError> {
        self.store.set(SELECTED_CONFIG_KEY, &id.0.to_string()).await?;
        Ok(())
    }
}
