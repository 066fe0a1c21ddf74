//! 헬스 체크 핸들러.

use axum::Json;
use serde::Serialize;

use super::now_millis;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: i64,
}

/// GET /api/health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: now_millis(),
    })
}
