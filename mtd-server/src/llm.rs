mod gemini;

pub use gemini::GeminiBackend;

use crate::config::AppConfigLlm;

use std::sync::Arc;

use mtd_core::{error::LlmError, interface::llm::ArcLlmBackend};

pub fn initialize_llm(config: &AppConfigLlm) -> Result<(ArcLlmBackend, &'static str), LlmError> {
    let backend = GeminiBackend::new(&config.gemini)?;
    Ok((Arc::new(backend), "Gemini (generateContent)"))
}
