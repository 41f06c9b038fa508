use crate::config::AppConfigLlmGemini;

use futures::{FutureExt, TryFutureExt, future::BoxFuture};
use mtd_core::{
    APP_USER_AGENT,
    error::LlmError,
    interface::llm::{DiagnosisReply, DiagnosisRequest, LlmBackend},
    model::schema::{FieldKind, FieldSchema},
};
use reqwest::Client;
use serde_json::{Map, Value, json};
use tracing::debug;

/// ベンダーのエラーボディをそのまま中継するときの上限文字数。
const ERROR_BODY_MAX_CHARS: usize = 500;

#[derive(Debug, Clone)]
pub struct GeminiBackend {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl GeminiBackend {
    pub fn new(config: &AppConfigLlmGemini) -> Result<GeminiBackend, LlmError> {
        let client = reqwest::ClientBuilder::new()
            .user_agent(APP_USER_AGENT)
            .build()
            .map_err(LlmError::by_communication)?;
        Ok(GeminiBackend {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    async fn send(&self, request: &DiagnosisRequest) -> Result<DiagnosisReply, LlmError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.endpoint, request.model, self.api_key
        );
        let body = build_request_body(request);

        debug!("sending diagnosis request to model {}", request.model);
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(LlmError::by_communication)
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().map_err(LlmError::by_communication).await?;
            return Err(LlmError::Upstream {
                status: status.as_u16(),
                body: truncate_chars(&body_text, ERROR_BODY_MAX_CHARS),
            });
        }

        let payload: Value = response.json().map_err(LlmError::by_communication).await?;
        parse_response(&payload)
    }
}

impl LlmBackend for GeminiBackend {
    fn send_diagnosis<'a>(
        &'a self,
        request: &'a DiagnosisRequest,
    ) -> BoxFuture<'a, Result<DiagnosisReply, LlmError>> {
        async move { self.send(request).await }.boxed()
    }
}

fn build_request_body(request: &DiagnosisRequest) -> Value {
    let mut parts = vec![json!({ "text": request.user_text })];
    if let Some(image) = &request.user_image {
        parts.push(json!({
            "inline_data": { "mime_type": image.mime_type, "data": image.data }
        }));
    }

    let mut generation_config = json!({
        "temperature": request.temperature,
        "maxOutputTokens": request.max_output_tokens,
    });
    if let Some(budget) = request.thinking_budget {
        generation_config["thinkingConfig"] = json!({ "thinkingBudget": budget });
    }
    if let Some(schema) = &request.response_schema {
        generation_config["responseMimeType"] = json!("application/json");
        generation_config["responseSchema"] = convert_response_schema(schema);
    }

    json!({
        "systemInstruction": { "parts": [{ "text": request.system_instruction }] },
        "contents": [{ "role": "user", "parts": parts }],
        "generationConfig": generation_config,
    })
}

fn parse_response(payload: &Value) -> Result<DiagnosisReply, LlmError> {
    let Some(candidate) = payload["candidates"].get(0) else {
        // プロンプト全体がブロックされると candidates 自体が返らない
        return Ok(DiagnosisReply::Filtered);
    };

    let finish_reason = candidate["finishReason"].as_str().unwrap_or("");
    if finish_reason == "SAFETY" || finish_reason == "PROHIBITED_CONTENT" {
        return Ok(DiagnosisReply::Filtered);
    }

    let parts = candidate["content"]["parts"]
        .as_array()
        .ok_or_else(|| LlmError::ResponseFormat("content.parts missing".to_string()))?;
    let text: String = parts.iter().filter_map(|p| p["text"].as_str()).collect();

    match finish_reason {
        "MAX_TOKENS" => Ok(DiagnosisReply::LengthCut(text)),
        _ => Ok(DiagnosisReply::Finished(text)),
    }
}

/// `FieldSchema` を Gemini の responseSchema (OpenAPI 風 subset) に変換する。
/// optional は nullable で表現する。
fn convert_response_schema(schema: &FieldSchema) -> Value {
    let mut converted = match &schema.kind {
        FieldKind::Integer => json!({ "type": "integer" }),
        FieldKind::Number => json!({ "type": "number" }),
        FieldKind::Boolean => json!({ "type": "boolean" }),
        FieldKind::String => json!({ "type": "string" }),
        FieldKind::Array(item) => json!({
            "type": "array",
            "items": convert_response_schema(item),
        }),
        FieldKind::Object(fields) => {
            let properties: Map<String, Value> = fields
                .iter()
                .map(|f| (f.name.clone(), convert_response_schema(f)))
                .collect();
            let required: Vec<_> = fields.iter().filter(|f| !f.optional).map(|f| f.name.clone()).collect();
            json!({
                "type": "object",
                "properties": properties,
                "required": required,
            })
        }
    };

    converted["description"] = json!(schema.description);
    if schema.optional {
        converted["nullable"] = json!(true);
    }
    converted
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mtd_core::interface::llm::InlineImage;

    fn request() -> DiagnosisRequest {
        DiagnosisRequest {
            model: "gemini-2.0-flash".to_string(),
            system_instruction: "診断チューターとしてふるまう。".to_string(),
            user_text: "問題: 3/4 + 1/6\n解答: 4/10".to_string(),
            user_image: None,
            temperature: 0.3,
            max_output_tokens: 2048,
            thinking_budget: None,
            response_schema: None,
        }
    }

    #[test]
    fn request_body_carries_system_instruction_and_generation_config() {
        let body = build_request_body(&request());

        assert_eq!(
            body["systemInstruction"]["parts"][0]["text"].as_str(),
            Some("診断チューターとしてふるまう。")
        );
        assert_eq!(body["contents"][0]["role"].as_str(), Some("user"));
        assert_eq!(body["generationConfig"]["maxOutputTokens"].as_u64(), Some(2048));
        assert!(body["generationConfig"].get("thinkingConfig").is_none());
        assert!(body["generationConfig"].get("responseSchema").is_none());
    }

    #[test]
    fn thinking_budget_and_schema_are_optional_knobs() {
        let mut req = request();
        req.thinking_budget = Some(1024);
        req.response_schema = Some(FieldSchema::object(
            "diagnosis",
            "result",
            vec![
                FieldSchema::string("feedback", "講評"),
                FieldSchema::string("misconception", "誤概念").as_nullable(),
            ],
        ));

        let body = build_request_body(&req);
        let generation = &body["generationConfig"];

        assert_eq!(generation["thinkingConfig"]["thinkingBudget"].as_u64(), Some(1024));
        assert_eq!(generation["responseMimeType"].as_str(), Some("application/json"));
        let schema = &generation["responseSchema"];
        assert_eq!(schema["type"].as_str(), Some("object"));
        assert_eq!(schema["required"], json!(["feedback"]));
        assert_eq!(schema["properties"]["misconception"]["nullable"], json!(true));
    }

    #[test]
    fn image_problem_is_attached_inline() {
        let mut req = request();
        req.user_image = Some(InlineImage {
            mime_type: "image/png".to_string(),
            data: "QUJD".to_string(),
        });

        let body = build_request_body(&req);
        let parts = body["contents"][0]["parts"].as_array().unwrap();

        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1]["inline_data"]["mime_type"].as_str(), Some("image/png"));
    }

    #[test]
    fn finish_reasons_map_to_reply_variants() {
        let finished = json!({
            "candidates": [{
                "finishReason": "STOP",
                "content": { "parts": [{ "text": "{\"feedback\":\"ok\"}" }] }
            }]
        });
        assert!(matches!(
            parse_response(&finished).unwrap(),
            DiagnosisReply::Finished(text) if text.contains("feedback")
        ));

        let cut = json!({
            "candidates": [{
                "finishReason": "MAX_TOKENS",
                "content": { "parts": [{ "text": "partial" }] }
            }]
        });
        assert!(matches!(parse_response(&cut).unwrap(), DiagnosisReply::LengthCut(_)));

        let filtered = json!({ "candidates": [{ "finishReason": "SAFETY" }] });
        assert!(matches!(parse_response(&filtered).unwrap(), DiagnosisReply::Filtered));

        let blocked = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        assert!(matches!(parse_response(&blocked).unwrap(), DiagnosisReply::Filtered));
    }

    #[test]
    fn upstream_error_body_is_truncated_to_500_chars() {
        let long_body = "エラー".repeat(400);
        let truncated = truncate_chars(&long_body, ERROR_BODY_MAX_CHARS);
        assert_eq!(truncated.chars().count(), 500);
    }
}
