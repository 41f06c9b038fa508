use crate::model::schema::FieldSchema;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// システム標準設定の固定値。空ストレージからの初回シードと削除後の復活の両方で使う。
const SYSTEM_DEFAULT_NAME: &str = "標準診断設定";
const SYSTEM_DEFAULT_DESCRIPTION: &str = "削除できないフォールバック設定。常に選択可能であることが保証される。";
const SYSTEM_DEFAULT_VERSION: &str = "1.0.0";
const SYSTEM_DEFAULT_MODEL: &str = "gemini-2.0-flash";
const SYSTEM_DEFAULT_TEMPERATURE: f64 = 0.3;
const SYSTEM_DEFAULT_MAX_OUTPUT_TOKENS: u32 = 2048;

const SYSTEM_DEFAULT_PROMPT: &str = "\
あなたは小中学生向けの算数・数学の診断チューターです。\
与えられた問題文・模範解説・知識要素の一覧と、生徒の解答をもとに、\
生徒がどの知識要素を習得していて、どこでつまずいているかを判定してください。\
出力は指示された JSON スキーマに厳密に従い、講評は生徒を励ます日本語で書いてください。";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LlmConfigId(pub Uuid);

impl LlmConfigId {
    pub fn new_now() -> LlmConfigId {
        LlmConfigId(Uuid::now_v7())
    }
}

/// LLM 呼び出し 1 通り分の名前つき設定バンドル。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub id: LlmConfigId,
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

    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub is_active: bool,
    pub is_system: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    Gemini,
    Openai,
    Claude,
}

impl LlmConfig {
    /// システム標準設定を合成する。`is_system` かつ `is_active` で生成される。
    pub fn system_default() -> LlmConfig {
        let now = OffsetDateTime::now_utc();
        LlmConfig {
            id: LlmConfigId::new_now(),
            name: SYSTEM_DEFAULT_NAME.to_string(),
            description: SYSTEM_DEFAULT_DESCRIPTION.to_string(),
            version: SYSTEM_DEFAULT_VERSION.to_string(),
            system_prompt: SYSTEM_DEFAULT_PROMPT.to_string(),
            user_prompt_template: None,
            input_schema: default_input_schema(),
            output_schema: default_output_schema(),
            provider: LlmProvider::Gemini,
            model: SYSTEM_DEFAULT_MODEL.to_string(),
            temperature: SYSTEM_DEFAULT_TEMPERATURE,
            max_output_tokens: SYSTEM_DEFAULT_MAX_OUTPUT_TOKENS,
            thinking_budget: None,
            created_at: now,
            updated_at: now,
            is_active: true,
            is_system: true,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = OffsetDateTime::now_utc();
    }
}

fn default_input_schema() -> FieldSchema {
    FieldSchema::object(
        "diagnosis_input",
        "diagnosis request",
        vec![
            FieldSchema::string("problem", "問題文。画像問題の場合は画像を添付する。"),
            FieldSchema::string("explanation", "模範解説。"),
            FieldSchema::array(
                "knowledge_elements",
                "この問題が前提とする知識要素の一覧。",
                FieldSchema::string("element", "知識要素名。"),
            ),
            FieldSchema::string("answer", "生徒の解答。"),
        ],
    )
}

fn default_output_schema() -> FieldSchema {
    FieldSchema::object(
        "diagnosis",
        "diagnosis result",
        vec![
            FieldSchema::array(
                "mastered",
                "生徒が習得していると判定した知識要素。",
                FieldSchema::string("element", "知識要素名。"),
            ),
            FieldSchema::array(
                "missing",
                "未習得と判定した知識要素。",
                FieldSchema::string("element", "知識要素名。"),
            ),
            FieldSchema::string("misconception", "解答から推定される誤概念の説明。").as_nullable(),
            FieldSchema::string("feedback", "生徒向けの講評。励ます日本語で書くこと。"),
            FieldSchema::number("confidence", "診断全体の確信度 (0.0-1.0)。"),
        ],
    )
}
