//! 이미지 분석 핸들러.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

use studyhub_core::models::completion::{ChatCompletionRequest, ChatMessage, Usage};
use studyhub_core::models::metric::ApiName;
use studyhub_core::models::study::{analysis_key, AnalysisRecord};

use super::{complete_and_record, now_millis, persist_best_effort};
use crate::error::ApiError;
use crate::AppState;

const VISION_MAX_TOKENS: u32 = 1000;

/// 프롬프트가 없을 때 쓰는 분석 지시문
pub const DEFAULT_ANALYSIS_PROMPT: &str = "Analyze this image in detail. If it contains educational content, diagrams, notes, or problems, explain them thoroughly. Identify key concepts, formulas, or information.";

/// 이미지 분석 요청
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeImageRequest {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
}

/// 이미지 분석 응답
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeImageResponse {
    pub analysis: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    pub analysis_id: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// 업스트림에 넘길 이미지 URL 결정.
///
/// URL이 우선이며, base64는 디코딩 가능한지 확인한 뒤 JPEG data URI로 감싼다.
/// 이미 `data:...;base64,` 형태면 그대로 쓴다.
pub fn resolve_image_url(
    image_url: Option<String>,
    image_base64: Option<String>,
) -> Result<String, ApiError> {
    if let Some(url) = non_empty(image_url) {
        return Ok(url);
    }

    let encoded = non_empty(image_base64).ok_or_else(|| {
        ApiError::BadRequest("Either imageUrl or imageBase64 is required".into())
    })?;
    let encoded = encoded.trim();

    let (data_uri, payload) = match encoded.split_once(";base64,") {
        Some((head, payload)) if head.starts_with("data:") => (Some(encoded), payload),
        _ => (None, encoded),
    };

    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| ApiError::BadRequest(format!("imageBase64 is not valid base64: {e}")))?;

    Ok(match data_uri {
        Some(uri) => uri.to_string(),
        None => format!("data:image/jpeg;base64,{payload}"),
    })
}

/// POST /api/analyze-image
pub async fn analyze_image(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeImageRequest>, JsonRejection>,
) -> Result<Json<AnalyzeImageResponse>, ApiError> {
    let Json(req) = payload?;

    let image_url = resolve_image_url(req.image_url, req.image_base64)?;
    let prompt = non_empty(req.prompt);
    let instruction = prompt.as_deref().unwrap_or(DEFAULT_ANALYSIS_PROMPT);

    let request = ChatCompletionRequest {
        model: state.provider.vision_model().to_string(),
        messages: vec![ChatMessage::user_with_image(instruction, image_url)],
        temperature: None,
        max_tokens: Some(VISION_MAX_TOKENS),
    };

    let reply = complete_and_record(&state, ApiName::Vision, &request)
        .await
        .map_err(|failure| ApiError::upstream("Failed to analyze image", &failure))?;

    let timestamp = now_millis();
    let analysis_id = analysis_key(timestamp);
    persist_best_effort(
        &state,
        &analysis_id,
        &AnalysisRecord {
            prompt,
            analysis: reply.content.clone(),
            timestamp,
        },
    )
    .await;

    debug!(analysis_id = %analysis_id, "이미지 분석 완료");

    Ok(Json(AnalyzeImageResponse {
        analysis: reply.content,
        usage: reply.usage,
        analysis_id,
    }))
}
