//! 플래시카드 생성 핸들러.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use studyhub_core::models::completion::{ChatCompletionRequest, ChatMessage, Usage};
use studyhub_core::models::metric::ApiName;
use studyhub_core::models::study::{flashcard_set_key, Difficulty, Flashcard, FlashcardSetRecord};

use super::{complete_and_record, now_millis, persist_best_effort};
use crate::error::ApiError;
use crate::AppState;

const FLASHCARD_TEMPERATURE: f32 = 0.8;
const FLASHCARD_MAX_TOKENS: u32 = 2000;

/// 기본 카드 수
pub const DEFAULT_COUNT: u32 = 5;
/// 카드 수 상한
pub const MAX_COUNT: u32 = 20;

const FLASHCARD_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that generates educational flashcards. Always respond with valid JSON.";

/// 플래시카드 생성 요청
#[derive(Debug, Deserialize)]
pub struct GenerateFlashcardsRequest {
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub count: Option<i64>,
    #[serde(default)]
    pub difficulty: Difficulty,
}

/// 플래시카드 생성 응답
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateFlashcardsResponse {
    pub flashcards: Vec<Flashcard>,
    pub flashcard_set_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// 요청 카드 수를 1..=20으로 제한
pub fn clamp_count(count: Option<i64>) -> u32 {
    count
        .unwrap_or(i64::from(DEFAULT_COUNT))
        .clamp(1, i64::from(MAX_COUNT)) as u32
}

fn user_prompt(topic: &str, count: u32, difficulty: Difficulty) -> String {
    format!(
        "Generate {count} flashcards for studying \"{topic}\" at {difficulty} difficulty level.
Return the response as a JSON array of objects, where each object has:
- \"question\": the question or prompt
- \"answer\": the detailed answer
- \"hint\": a helpful hint (optional)

Make the flashcards educational, clear, and appropriate for the difficulty level."
    )
}

/// 모델 응답에서 JSON 배열 부분을 찾는다.
///
/// 순서: ```json 코드 블록 → 첫 `[`부터 마지막 `]`까지 → 전체 텍스트
pub fn extract_json_block(content: &str) -> &str {
    if let Some(start) = content.find("```json") {
        let rest = &content[start + "```json".len()..];
        if let Some(end) = rest.find("```") {
            return rest[..end].trim();
        }
    }

    if let (Some(start), Some(end)) = (content.find('['), content.rfind(']')) {
        if start < end {
            return &content[start..=end];
        }
    }

    content.trim()
}

/// 모델 응답을 플래시카드 목록으로 해석
pub fn parse_flashcards(content: &str) -> Result<Vec<Flashcard>, serde_json::Error> {
    serde_json::from_str(extract_json_block(content))
}

/// POST /api/generate-flashcards
pub async fn generate_flashcards(
    State(state): State<AppState>,
    payload: Result<Json<GenerateFlashcardsRequest>, JsonRejection>,
) -> Result<Json<GenerateFlashcardsResponse>, ApiError> {
    let Json(req) = payload?;

    let topic = req
        .topic
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Topic is required".into()))?;
    let count = clamp_count(req.count);

    let request = ChatCompletionRequest {
        model: state.provider.chat_model().to_string(),
        messages: vec![
            ChatMessage::system(FLASHCARD_SYSTEM_PROMPT),
            ChatMessage::user(user_prompt(&topic, count, req.difficulty)),
        ],
        temperature: Some(FLASHCARD_TEMPERATURE),
        max_tokens: Some(FLASHCARD_MAX_TOKENS),
    };

    let reply = complete_and_record(&state, ApiName::Flashcards, &request)
        .await
        .map_err(|failure| ApiError::upstream("Failed to generate flashcards", &failure))?;

    let flashcards = parse_flashcards(&reply.content).map_err(|e| {
        warn!("플래시카드 JSON 파싱 실패: {e}");
        ApiError::internal("Failed to parse generated flashcards", reply.content.clone())
    })?;

    let timestamp = now_millis();
    let flashcard_set_id = flashcard_set_key(&topic, timestamp);
    persist_best_effort(
        &state,
        &flashcard_set_id,
        &FlashcardSetRecord {
            topic,
            difficulty: req.difficulty,
            flashcards: flashcards.clone(),
            timestamp,
        },
    )
    .await;

    debug!(
        flashcard_set_id = %flashcard_set_id,
        count = flashcards.len(),
        "플래시카드 생성 완료"
    );

    Ok(Json(GenerateFlashcardsResponse {
        flashcards,
        flashcard_set_id,
        usage: reply.usage,
    }))
}
