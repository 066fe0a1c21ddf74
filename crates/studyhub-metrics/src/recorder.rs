//! 호출 지표 기록기.
//!
//! 업스트림 호출이 끝난 뒤(재시도 포함) 결과 1건을 로그 저장소에 추가한다.
//! 저장 실패는 경고 로그만 남기고 삼킨다. 기록 실패가 사용자 응답을 바꾸지 않는다.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use studyhub_core::models::metric::{ApiName, CallMetric};
use studyhub_core::ports::kv_store::KvStore;

/// 호출 지표 기록기
#[derive(Clone)]
pub struct MetricsRecorder {
    store: Arc<dyn KvStore>,
}

impl MetricsRecorder {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// 현재 시각으로 호출 결과 기록
    ///
    /// `outcome`이 `Err(message)`면 실패 레코드가 된다.
    pub async fn record(
        &self,
        api_name: ApiName,
        endpoint: &str,
        response_time_ms: u64,
        outcome: Result<(), &str>,
    ) {
        let timestamp = Utc::now().timestamp_millis();
        let metric = match outcome {
            Ok(()) => CallMetric::success(api_name.as_str(), endpoint, response_time_ms, timestamp),
            Err(message) => CallMetric::failure(
                api_name.as_str(),
                endpoint,
                response_time_ms,
                message,
                timestamp,
            ),
        };
        self.append(&metric).await;
    }

    /// 완성된 레코드 추가
    pub async fn append(&self, metric: &CallMetric) {
        let key = metric.storage_key();

        let value = match serde_json::to_value(metric) {
            Ok(value) => value,
            Err(e) => {
                warn!(key = %key, "호출 지표 직렬화 실패: {e}");
                return;
            }
        };

        match self.store.set(&key, &value).await {
            Ok(()) => debug!(
                key = %key,
                success = metric.success,
                response_time_ms = metric.response_time_ms,
                "호출 지표 기록"
            ),
            Err(e) => warn!(key = %key, "호출 지표 저장 실패 (무시): {e}"),
        }
    }
}
