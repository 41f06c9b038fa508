use crate::{
    api::error::ApiError,
    application::{Application, ApplicationError},
};

use axum::{Json, extract::State};
use mtd_core::{
    interface::llm::{DiagnosisReply, DiagnosisRequest, InlineImage},
    model::{
        diagnosis::Diagnosis,
        llm_config::{LlmConfig, LlmConfigId, LlmProvider},
        problem::{Problem, ProblemBody, ProblemId},
    },
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// `user_prompt_template` が未設定の設定で使う既定のテンプレート。
const DEFAULT_USER_TEMPLATE: &str = "\
問題:
{{problem}}

模範解説:
{{explanation}}

知識要素:
{{knowledge_elements}}

生徒の解答:
{{answer}}";

#[derive(Debug, Deserialize)]
pub struct DiagnoseRequest {
    problem_id: Option<Uuid>,
    student_answer: String,
    /// 省略時は解決済みのアクティブ設定を使う。
    config_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct DiagnoseResponse {
    config_id: Uuid,
    model: String,
    finish: DiagnoseFinish,
    reply: Option<String>,
    /// 既定スキーマとして解析できたときだけ入る。
    diagnosis: Option<Diagnosis>,
    raw: Option<Value>,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnoseFinish {
    Finished,
    LengthCut,
    Filtered,
}

pub async fn diagnose(
    State(state): State<Application>,
    Json(request): Json<DiagnoseRequest>,
) -> Result<Json<DiagnoseResponse>, ApiError> {
    // 毎ターン解決し直す。ストレージが他所から書き換えられていてもここで追従する
    let snapshot = state.registry.resolve().await;
    if let Some(error) = snapshot.error {
        return Err(ApiError::InvalidRequest(format!("configuration unavailable: {error}")));
    }

    let config = match request.config_id {
        Some(id) => snapshot
            .active_configs
            .iter()
            .find(|c| c.id == LlmConfigId(id))
            .cloned()
            .ok_or_else(|| ApiError::InvalidRequest(format!("config {id} is unknown or inactive")))?,
        None => snapshot
            .current
            .ok_or_else(|| ApiError::InvalidRequest("no configuration available".to_string()))?,
    };
    if config.provider != LlmProvider::Gemini {
        return Err(ApiError::InvalidRequest(format!(
            "provider {:?} is not wired to an outbound backend",
            config.provider
        )));
    }

    let problem = match request.problem_id {
        Some(id) => Some(
            state
                .problems
                .find(ProblemId(id))
                .await?
                .ok_or(ApplicationError::NotFound(id))?,
        ),
        None => None,
    };

    let user_text = render_user_prompt(
        config.user_prompt_template.as_deref().unwrap_or(DEFAULT_USER_TEMPLATE),
        problem.as_ref(),
        &request.student_answer,
    );
    let user_image = problem.as_ref().and_then(|p| match &p.body {
        ProblemBody::Image { data, mime_type } => Some(InlineImage {
            mime_type: mime_type.clone(),
            data: data.clone(),
        }),
        ProblemBody::Text { .. } => None,
    });

    let llm_request = build_llm_request(&config, user_text, user_image);
    let reply = state.llm.send_diagnosis(&llm_request).await?;

    let finish = match &reply {
        DiagnosisReply::Finished(_) => DiagnoseFinish::Finished,
        DiagnosisReply::LengthCut(_) => DiagnoseFinish::LengthCut,
        DiagnosisReply::Filtered => DiagnoseFinish::Filtered,
    };
    let reply_text = reply.text().map(|t| t.to_string());
    let raw: Option<Value> = reply_text.as_deref().and_then(|t| serde_json::from_str(t).ok());
    let diagnosis: Option<Diagnosis> = reply_text.as_deref().and_then(|t| serde_json::from_str(t).ok());

    Ok(Json(DiagnoseResponse {
        config_id: config.id.0,
        model: config.model,
        finish,
        reply: reply_text,
        diagnosis,
        raw,
    }))
}

fn build_llm_request(config: &LlmConfig, user_text: String, user_image: Option<InlineImage>) -> DiagnosisRequest {
    DiagnosisRequest {
        model: config.model.clone(),
        system_instruction: config.system_prompt.clone(),
        user_text,
        user_image,
        temperature: config.temperature,
        max_output_tokens: config.max_output_tokens,
        thinking_budget: config.thinking_budget,
        response_schema: Some(config.output_schema.clone()),
    }
}

fn render_user_prompt(template: &str, problem: Option<&Problem>, answer: &str) -> String {
    let (problem_text, explanation, knowledge_elements) = match problem {
        Some(problem) => (
            problem.body_text().to_string(),
            problem.explanation.clone(),
            problem.knowledge_elements.join("、"),
        ),
        None => (String::new(), String::new(), String::new()),
    };

    template
        .replace("{{problem}}", &problem_text)
        .replace("{{explanation}}", &explanation)
        .replace("{{knowledge_elements}}", &knowledge_elements)
        .replace("{{answer}}", answer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_placeholders_are_filled() {
        let problem = Problem::new_now(
            "分数の足し算",
            ProblemBody::Text {
                text: "3/4 + 1/6 を計算しなさい。".to_string(),
            },
            "通分して 11/12。",
            ["通分", "分数の加法"],
        );

        let rendered = render_user_prompt(DEFAULT_USER_TEMPLATE, Some(&problem), "4/10");

        assert!(rendered.contains("3/4 + 1/6 を計算しなさい。"));
        assert!(rendered.contains("通分して 11/12。"));
        assert!(rendered.contains("通分、分数の加法"));
        assert!(rendered.contains("4/10"));
    }

    #[test]
    fn image_problem_renders_placeholder_text() {
        let problem = Problem::new_now(
            "図形問題",
            ProblemBody::Image {
                data: "QUJD".to_string(),
                mime_type: "image/png".to_string(),
            },
            "三角形の内角の和は 180 度。",
            ["内角の和"],
        );

        let rendered = render_user_prompt(DEFAULT_USER_TEMPLATE, Some(&problem), "200 度");
        assert!(rendered.contains("(添付画像の問題)"));
    }

    #[test]
    fn missing_problem_leaves_placeholders_empty() {
        let rendered = render_user_prompt("{{problem}}|{{answer}}", None, "42");
        assert_eq!(rendered, "|42");
    }
}
