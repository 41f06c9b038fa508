pub mod kv;
pub mod llm;
