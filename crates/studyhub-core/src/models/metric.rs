//! API 호출 성능 지표 모델.
//!
//! [`CallMetric`]은 업스트림 호출 1건(재시도 포함)의 최종 결과이며 한 번
//! 기록되면 수정되지 않는다. [`MetricsSummary`]/[`MetricsReport`]는 조회 시점에
//! 최근 기록으로부터 다시 계산되는 파생 값이다.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 로그 저장소에서 호출 지표가 차지하는 키 접두사
pub const METRIC_KEY_PREFIX: &str = "api_metric:";

/// 기능 핸들러가 호출하는 논리적 업스트림 작업
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApiName {
    /// AI 튜터 대화
    Chat,
    /// 이미지 분석
    Vision,
    /// 플래시카드 생성
    Flashcards,
}

impl ApiName {
    /// 지표 레코드에 저장되는 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiName::Chat => "Chat",
            ApiName::Vision => "Vision",
            ApiName::Flashcards => "Flashcards",
        }
    }
}

impl fmt::Display for ApiName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 업스트림 호출 1건의 최종 결과 레코드
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallMetric {
    /// 논리적 작업 이름 (예: "Chat")
    pub api_name: String,
    /// 호출한 업스트림 경로 (예: "/chat/completions")
    pub endpoint: String,
    /// 재시도를 포함한 전체 호출 소요 시간 (밀리초)
    #[serde(rename = "responseTime")]
    pub response_time_ms: u64,
    /// 성공 여부
    pub success: bool,
    /// 실패 사유 (`success == false`일 때만 존재)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// 기록 시각 (epoch 밀리초)
    pub timestamp: i64,
}

impl CallMetric {
    /// 성공 레코드 생성
    pub fn success(
        api_name: impl Into<String>,
        endpoint: impl Into<String>,
        response_time_ms: u64,
        timestamp: i64,
    ) -> Self {
        Self {
            api_name: api_name.into(),
            endpoint: endpoint.into(),
            response_time_ms,
            success: true,
            error_message: None,
            timestamp,
        }
    }

    /// 실패 레코드 생성
    pub fn failure(
        api_name: impl Into<String>,
        endpoint: impl Into<String>,
        response_time_ms: u64,
        error_message: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            api_name: api_name.into(),
            endpoint: endpoint.into(),
            response_time_ms,
            success: false,
            error_message: Some(error_message.into()),
            timestamp,
        }
    }

    /// 저장소 키: `api_metric:{apiName}:{timestamp}`
    ///
    /// 같은 작업이 같은 밀리초에 두 번 기록되면 키가 겹쳐 하나만 남는다.
    pub fn storage_key(&self) -> String {
        format!("{METRIC_KEY_PREFIX}{}:{}", self.api_name, self.timestamp)
    }
}

/// 작업별 집계 통계
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    /// 전체 호출 수
    pub total_calls: u64,
    /// 성공 호출 수
    pub successful_calls: u64,
    /// 실패 호출 수
    pub failed_calls: u64,
    /// 평균 응답 시간 (밀리초, 반올림)
    pub avg_response_time: u64,
    /// 최소 응답 시간 (밀리초)
    pub min_response_time: u64,
    /// 최대 응답 시간 (밀리초)
    pub max_response_time: u64,
    /// 성공률 (%, 소수점 둘째 자리 문자열, 예: "71.43")
    pub success_rate: String,
}

/// 지표 조회 응답
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsReport {
    /// 작업 이름별 요약
    pub summary: BTreeMap<String, MetricsSummary>,
    /// 최근 호출 기록 (최신순)
    pub recent_metrics: Vec<CallMetric>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_metric_wire_shape() {
        let metric = CallMetric::failure("Chat", "/chat/completions", 1200, "timeout", 1_700_000_000_000);
        let json = serde_json::to_value(&metric).unwrap();

        assert_eq!(json["apiName"], "Chat");
        assert_eq!(json["responseTime"], 1200);
        assert_eq!(json["success"], false);
        assert_eq!(json["errorMessage"], "timeout");
        assert_eq!(json["timestamp"], 1_700_000_000_000_i64);
    }

    #[test]
    fn success_metric_omits_error_message() {
        let metric = CallMetric::success("Vision", "/chat/completions", 300, 1);
        let json = serde_json::to_value(&metric).unwrap();
        assert!(json.get("errorMessage").is_none());
    }

    #[test]
    fn storage_key_format() {
        let metric = CallMetric::success(ApiName::Flashcards.as_str(), "/chat/completions", 10, 42);
        assert_eq!(metric.storage_key(), "api_metric:Flashcards:42");
    }

    #[test]
    fn summary_uses_camel_case() {
        let summary = MetricsSummary {
            total_calls: 1,
            successful_calls: 1,
            failed_calls: 0,
            avg_response_time: 10,
            min_response_time: 10,
            max_response_time: 10,
            success_rate: "100.00".to_string(),
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["avgResponseTime"], 10);
        assert_eq!(json["successRate"], "100.00");
    }
}
