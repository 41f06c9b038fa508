mod error;
mod problem_db;
mod prompt_db;

pub use error::ApplicationError;
pub use problem_db::{ProblemDb, ProblemDraft};
pub use prompt_db::{PromptDb, PromptDraft};

use crate::registry::ConfigRegistry;

use mtd_core::interface::llm::ArcLlmBackend;

#[derive(Clone)]
pub struct Application {
    pub registry: ConfigRegistry,
    pub problems: ProblemDb,
    pub prompts: PromptDb,
    pub llm: ArcLlmBackend,
    pub public_api_key: String,
}
