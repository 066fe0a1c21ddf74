//! AI 튜터 대화 핸들러.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use studyhub_core::models::completion::{ChatCompletionRequest, ChatMessage, Usage};
use studyhub_core::models::metric::ApiName;
use studyhub_core::models::study::{conversation_key, ConversationRecord};

use super::{complete_and_record, now_millis, persist_best_effort};
use crate::error::ApiError;
use crate::AppState;

const CHAT_TEMPERATURE: f32 = 0.7;
const CHAT_MAX_TOKENS: u32 = 1000;

/// 대화 요청
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// 문자열이 아니면 400 (역직렬화 단계가 아닌 핸들러에서 판정)
    #[serde(default)]
    pub message: Option<serde_json::Value>,
    /// 이전 대화 (system 프롬프트와 새 메시지 사이에 그대로 들어감)
    #[serde(default)]
    pub conversation_history: Vec<ChatMessage>,
    #[serde(default)]
    pub subject: Option<String>,
}

/// 대화 응답
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    pub conversation_id: String,
}

/// 튜터 system 프롬프트
pub fn tutor_prompt(subject: Option<&str>) -> String {
    let subject = subject
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("various subjects");

    format!(
        "You are an expert AI tutor specializing in {subject}. Your role is to:
- Explain concepts clearly and thoroughly
- Break down complex topics into understandable parts
- Provide examples and analogies
- Ask probing questions to check understanding
- Encourage critical thinking
- Adapt your teaching style to the student's level
Be patient, encouraging, and always verify the student understands before moving on."
    )
}

/// POST /api/chat
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(req) = payload?;

    let message = match req.message {
        Some(serde_json::Value::String(m)) if !m.is_empty() => m,
        _ => {
            return Err(ApiError::BadRequest(
                "Message is required and must be a string".into(),
            ))
        }
    };

    let mut messages = Vec::with_capacity(req.conversation_history.len() + 2);
    messages.push(ChatMessage::system(tutor_prompt(req.subject.as_deref())));
    messages.extend(req.conversation_history);
    messages.push(ChatMessage::user(message.clone()));

    let request = ChatCompletionRequest {
        model: state.provider.chat_model().to_string(),
        messages,
        temperature: Some(CHAT_TEMPERATURE),
        max_tokens: Some(CHAT_MAX_TOKENS),
    };

    let reply = complete_and_record(&state, ApiName::Chat, &request)
        .await
        .map_err(|failure| ApiError::upstream("Failed to get response from AI tutor", &failure))?;

    let timestamp = now_millis();
    let conversation_id = conversation_key(timestamp);
    persist_best_effort(
        &state,
        &conversation_id,
        &ConversationRecord {
            subject: req.subject,
            message,
            response: reply.content.clone(),
            timestamp,
        },
    )
    .await;

    debug!(conversation_id = %conversation_id, "대화 응답 완료");

    Ok(Json(ChatResponse {
        response: reply.content,
        usage: reply.usage,
        conversation_id,
    }))
}
