//! 학습 이력 조회 핸들러.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;

use studyhub_core::models::study::HistoryKind;

use crate::error::ApiError;
use crate::AppState;

/// 반환할 최대 이력 수
pub const HISTORY_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub history: Vec<serde_json::Value>,
}

/// timestamp 내림차순 (안정 정렬), 최대 50건
pub fn newest_first(mut values: Vec<serde_json::Value>) -> Vec<serde_json::Value> {
    values.sort_by_key(|v| std::cmp::Reverse(v["timestamp"].as_i64().unwrap_or(0)));
    values.truncate(HISTORY_LIMIT);
    values
}

/// GET /api/history?type=conversations|flashcards|analyses
pub async fn get_history(
    State(state): State<AppState>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let kind = params
        .kind
        .as_deref()
        .and_then(HistoryKind::parse)
        .ok_or_else(|| {
            ApiError::BadRequest(
                "Invalid type. Must be: conversations, flashcards, or analyses".into(),
            )
        })?;

    let values = state
        .store
        .get_by_prefix(kind.key_prefix())
        .await
        .map_err(|e| {
            error!("이력 조회 실패: {e}");
            ApiError::internal("Failed to retrieve history", e.to_string())
        })?;

    Ok(Json(HistoryResponse {
        history: newest_first(values),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{StubProvider, TestApp};
    use axum::http::StatusCode;
    use serde_json::json;
    use studyhub_core::ports::kv_store::KvStore;

    #[test]
    fn sorts_and_limits() {
        let values: Vec<_> = (0..60).map(|i| json!({"timestamp": i})).collect();
        let sorted = newest_first(values);
        assert_eq!(sorted.len(), 50);
        assert_eq!(sorted[0]["timestamp"], 59);
        assert_eq!(sorted[49]["timestamp"], 10);
    }

    #[tokio::test]
    async fn returns_matching_kind_only() {
        let app = TestApp::new(StubProvider::default());
        app.storage
            .set("conversation:1", &json!({"message": "a", "timestamp": 1}))
            .await
            .unwrap();
        app.storage
            .set("conversation:2", &json!({"message": "b", "timestamp": 2}))
            .await
            .unwrap();
        app.storage
            .set("analysis:3", &json!({"analysis": "c", "timestamp": 3}))
            .await
            .unwrap();

        let (status, body) = app.get("/api/history?type=conversations").await;
        assert_eq!(status, StatusCode::OK);
        let history = body["history"].as_array().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0]["message"], "b");

        let (_, body) = app.get("/api/history?type=flashcards").await;
        assert!(body["history"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_type_is_bad_request() {
        let app = TestApp::new(StubProvider::default());
        for uri in ["/api/history?type=metrics", "/api/history"] {
            let (status, body) = app.get(uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(
                body["error"],
                "Invalid type. Must be: conversations, flashcards, or analyses"
            );
        }
    }
}
