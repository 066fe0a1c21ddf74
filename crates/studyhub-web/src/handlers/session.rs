//! 학습 세션 저장 핸들러.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use studyhub_core::models::study::session_key;

use super::now_millis;
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSessionRequest {
    #[serde(default)]
    pub session_data: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSessionResponse {
    pub success: bool,
    pub session_id: String,
}

/// POST /api/save-session
///
/// 세션 데이터(JSON 객체)에 `timestamp`를 덧붙여 저장한다.
pub async fn save_session(
    State(state): State<AppState>,
    payload: Result<Json<SaveSessionRequest>, JsonRejection>,
) -> Result<Json<SaveSessionResponse>, ApiError> {
    let Json(req) = payload?;

    let mut data = match req.session_data {
        Some(serde_json::Value::Object(map)) => map,
        _ => return Err(ApiError::BadRequest("Session data is required".into())),
    };

    let timestamp = now_millis();
    data.insert("timestamp".to_string(), timestamp.into());

    let session_id = session_key(timestamp);
    state
        .store
        .set(&session_id, &serde_json::Value::Object(data))
        .await
        .map_err(|e| {
            error!("세션 저장 실패: {e}");
            ApiError::internal("Failed to save session", e.to_string())
        })?;

    debug!(session_id = %session_id, "학습 세션 저장");

    Ok(Json(SaveSessionResponse {
        success: true,
        session_id,
    }))
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::{StubProvider, TestApp};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn stores_session_with_timestamp() {
        let app = TestApp::new(StubProvider::default());
        let (status, body) = app
            .post(
                "/api/save-session",
                json!({"sessionData": {"subject": "math", "minutes": 25}}),
            )
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert!(body["sessionId"].as_str().unwrap().starts_with("session:"));

        let stored = app.stored("session:").await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0]["subject"], "math");
        assert!(stored[0]["timestamp"].as_i64().is_some());
    }

    #[tokio::test]
    async fn missing_or_non_object_data_is_bad_request() {
        let app = TestApp::new(StubProvider::default());
        for body in [json!({}), json!({"sessionData": null}), json!({"sessionData": 3})] {
            let (status, response) = app.post("/api/save-session", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(response["error"], "Session data is required");
        }
    }
}
