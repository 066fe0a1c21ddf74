//! 호출 성능 지표 API 핸들러.

use axum::extract::State;
use axum::Json;
use tracing::error;

use studyhub_core::models::metric::MetricsReport;

use crate::error::ApiError;
use crate::AppState;

/// 작업별 요약 + 최근 호출 목록
///
/// GET /api/metrics
pub async fn get_metrics(State(state): State<AppState>) -> Result<Json<MetricsReport>, ApiError> {
    let report = state.aggregator.report().await.map_err(|e| {
        error!("호출 지표 조회 실패: {e}");
        ApiError::internal("Failed to retrieve metrics", e.to_string())
    })?;

    Ok(Json(report))
}
