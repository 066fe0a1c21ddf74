//! 학습 기록 모델.
//!
//! 기능 핸들러가 성공 응답과 함께 로그 저장소에 남기는 대화/분석/플래시카드
//! 기록, 그리고 학습 세션 저장 키를 정의한다.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 플래시카드 한 장
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub question: String,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// 플래시카드 난이도
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        };
        f.write_str(s)
    }
}

/// 튜터 대화 기록 (`conversation:{ts}`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub message: String,
    pub response: String,
    pub timestamp: i64,
}

/// 이미지 분석 기록 (`analysis:{ts}`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    pub analysis: String,
    pub timestamp: i64,
}

/// 플래시카드 세트 기록 (`flashcards:{topic}:{ts}`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashcardSetRecord {
    pub topic: String,
    pub difficulty: Difficulty,
    pub flashcards: Vec<Flashcard>,
    pub timestamp: i64,
}

/// 이력 조회 대상
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryKind {
    Conversations,
    Flashcards,
    Analyses,
}

impl HistoryKind {
    /// 쿼리 문자열 값으로 변환 (알 수 없는 값은 None)
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "conversations" => Some(HistoryKind::Conversations),
            "flashcards" => Some(HistoryKind::Flashcards),
            "analyses" => Some(HistoryKind::Analyses),
            _ => None,
        }
    }

    /// 저장소 키 접두사
    pub fn key_prefix(&self) -> &'static str {
        match self {
            HistoryKind::Conversations => "conversation:",
            HistoryKind::Flashcards => "flashcards:",
            HistoryKind::Analyses => "analysis:",
        }
    }
}

/// 대화 기록 키
pub fn conversation_key(timestamp: i64) -> String {
    format!("conversation:{timestamp}")
}

/// 분석 기록 키
pub fn analysis_key(timestamp: i64) -> String {
    format!("analysis:{timestamp}")
}

/// 플래시카드 세트 키
pub fn flashcard_set_key(topic: &str, timestamp: i64) -> String {
    format!("flashcards:{topic}:{timestamp}")
}

/// 학습 세션 키
pub fn session_key(timestamp: i64) -> String {
    format!("session:{timestamp}")
}
