use std::{io, net::SocketAddr, path::{Path, PathBuf}};

use serde::Deserialize;
use thiserror::Error as ThisError;

/// config.toml
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub admin_api: AppConfigAdminApi,
    pub storage: AppConfigStorage,
    pub llm: AppConfigLlm,
}

/// [admin_api]
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfigAdminApi {
    pub bind_address: SocketAddr,
    pub cors: Option<AppConfigAdminApiCors>,
    pub jwt_auth: Option<AppConfigAdminApiJwtAuth>,
}

/// [admin_api.cors]
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfigAdminApiCors {
    pub allowed_origins: Vec<String>,
}

/// [admin_api.jwt_auth]
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfigAdminApiJwtAuth {
    pub jwt_header_name: String,
    pub secret: String,
    pub audience: String,
    pub allowed_subjects: Vec<String>,
}

/// [storage]
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfigStorage {
    pub backend: AppConfigStorageBackend,

    #[serde(default = "Default::default")]
    pub sqlite: AppConfigStorageSqlite,
}

/// [storage].backend の種類。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppConfigStorageBackend {
    Sqlite,
    Memory,
}

/// [storage.sqlite]
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfigStorageSqlite {
    pub filepath: PathBuf,
}

/// [llm]
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfigLlm {
    pub gemini: AppConfigLlmGemini,
}

/// [llm.gemini]
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfigLlmGemini {
    #[serde(default = "default_gemini_endpoint")]
    pub endpoint: String,

    /// サーバー側でのみ使う秘匿キー。
    pub api_key: String,

    /// GET /api/key でそのまま返してよい公開キー。
    pub public_api_key: String,
}

fn default_gemini_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

#[derive(Debug, ThisError)]
pub enum ConfigLoadError {
    #[error("cannot read config file: {0}")]
    Read(#[from] io::Error),

    #[error("cannot parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig, ConfigLoadError> {
    let config_text = std::fs::read_to_string(path)?;
    let config = toml::from_str(&config_text)?;
    Ok(config)
}
