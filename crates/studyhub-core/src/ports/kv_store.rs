//! 키-값 로그 저장소 포트.
//!
//! 구현: `studyhub-storage` crate (rusqlite)

use async_trait::async_trait;

use crate::error::CoreError;

/// 키-값 로그 저장소
///
/// 호출 지표(`api_metric:`)와 학습 기록(`conversation:`, `analysis:`,
/// `flashcards:`, `session:`)이 같은 저장소를 접두사로 나눠 쓴다.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// 값 저장. 같은 키가 이미 있으면 덮어쓴다.
    async fn set(&self, key: &str, value: &serde_json::Value) -> Result<(), CoreError>;

    /// 접두사로 시작하는 모든 값 조회.
    ///
    /// 반환 순서는 키 오름차순이며, 같은 데이터에 대해 항상 동일하다.
    async fn get_by_prefix(&self, prefix: &str) -> Result<Vec<serde_json::Value>, CoreError>;
}
