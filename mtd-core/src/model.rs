pub mod diagnosis;
pub mod llm_config;
pub mod problem;
pub mod prompt;
pub mod schema;
