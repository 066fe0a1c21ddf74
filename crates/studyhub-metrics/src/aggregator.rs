//! 호출 지표 집계기.
//!
//! 저장된 호출 지표 중 최신 [`METRICS_WINDOW`]건을 작업 이름별로 요약하고,
//! 그중 최신 [`RECENT_METRICS`]건을 함께 돌려준다.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use studyhub_core::error::CoreError;
use studyhub_core::models::metric::{CallMetric, MetricsReport, MetricsSummary, METRIC_KEY_PREFIX};
use studyhub_core::ports::kv_store::KvStore;

/// 요약 대상 최신 기록 수
pub const METRICS_WINDOW: usize = 100;

/// 응답에 포함할 최근 기록 수
pub const RECENT_METRICS: usize = 20;

/// 호출 지표 집계기
#[derive(Clone)]
pub struct MetricsAggregator {
    store: Arc<dyn KvStore>,
}

impl MetricsAggregator {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// 저장소 전체를 읽어 보고서 생성.
    ///
    /// 저장소 읽기 실패는 그대로 반환한다 (부분 집계 없음).
    pub async fn report(&self) -> Result<MetricsReport, CoreError> {
        let values = self.store.get_by_prefix(METRIC_KEY_PREFIX).await?;
        let total = values.len();

        let records: Vec<CallMetric> = values
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<CallMetric>(value) {
                Ok(metric) => Some(metric),
                Err(e) => {
                    warn!("호출 지표 레코드 해석 실패 (건너뜀): {e}");
                    None
                }
            })
            .collect();

        debug!(stored = total, decoded = records.len(), "호출 지표 집계");
        Ok(summarize(records))
    }
}

/// 기록 목록으로 보고서 계산.
///
/// 입력 순서는 저장소 키 순서이며, 정렬이 안정적이므로 같은 timestamp끼리는
/// 항상 같은 순서가 된다.
pub fn summarize(mut records: Vec<CallMetric>) -> MetricsReport {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    records.truncate(METRICS_WINDOW);

    let mut groups: BTreeMap<String, Vec<&CallMetric>> = BTreeMap::new();
    for metric in &records {
        groups.entry(metric.api_name.clone()).or_default().push(metric);
    }

    let summary = groups
        .into_iter()
        .map(|(api_name, group)| (api_name, summarize_group(&group)))
        .collect();

    records.truncate(RECENT_METRICS);

    MetricsReport {
        summary,
        recent_metrics: records,
    }
}

/// 한 작업의 기록 요약. 빈 그룹은 만들어지지 않는다.
fn summarize_group(group: &[&CallMetric]) -> MetricsSummary {
    let total_calls = group.len() as u64;
    let successful_calls = group.iter().filter(|m| m.success).count() as u64;
    let failed_calls = total_calls - successful_calls;

    let total_time: u64 = group
        .iter()
        .fold(0u64, |acc, m| acc.saturating_add(m.response_time_ms));
    let min_response_time = group.iter().map(|m| m.response_time_ms).min().unwrap_or(0);
    let max_response_time = group.iter().map(|m| m.response_time_ms).max().unwrap_or(0);

    MetricsSummary {
        total_calls,
        successful_calls,
        failed_calls,
        avg_response_time: rounded_mean(total_time, total_calls),
        min_response_time,
        max_response_time,
        success_rate: success_rate(successful_calls, total_calls),
    }
}

/// 정수 평균 (0.5는 올림)
fn rounded_mean(total: u64, count: u64) -> u64 {
    if count == 0 {
        return 0;
    }
    let total = u128::from(total);
    let count = u128::from(count);
    ((2 * total + count) / (2 * count)) as u64
}

/// 성공률 문자열 (소수점 둘째 자리, 0.005는 올림)
fn success_rate(successful: u64, total: u64) -> String {
    if total == 0 {
        return "0.00".to_string();
    }
    // 백분율의 1/100 단위 정수
    let hundredths = rounded_mean(successful.saturating_mul(10_000), total);
    format!("{}.{:02}", hundredths / 100, hundredths % 100)
}
