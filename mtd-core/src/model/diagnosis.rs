use serde::{Deserialize, Serialize};

/// 既定の出力スキーマに対応する診断結果。
/// スキーマをカスタムした設定では型どおりに解析できないことがあるので、
/// 解析失敗は生テキストへのフォールバックとして扱う。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnosis {
    pub mastered: Vec<String>,
    pub missing: Vec<String>,
    pub misconception: Option<String>,
    pub feedback: String,
    pub confidence: f64,
}
