//! # studyhub-metrics
//!
//! 업스트림 호출 성능 지표.
//! 기능 핸들러가 호출을 끝낼 때마다 결과 1건을 로그 저장소에 추가하고,
//! 조회 시 최근 기록으로 작업별 통계를 계산한다.
//!
//! ## 모듈
//! - `recorder`: 호출 결과 기록 (실패해도 호출자에게 에러를 돌려주지 않음)
//! - `aggregator`: 최근 100건 요약 + 최근 20건 목록

pub mod aggregator;
pub mod recorder;

pub use aggregator::MetricsAggregator;
pub use recorder::MetricsRecorder;
