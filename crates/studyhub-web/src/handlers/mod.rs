//! API 핸들러 모듈.

pub mod chat;
pub mod flashcards;
pub mod health;
pub mod history;
pub mod metrics;
pub mod session;
pub mod vision;

use std::time::Instant;

use chrono::Utc;
use tracing::warn;

use studyhub_core::error::CallFailure;
use studyhub_core::models::completion::{ChatCompletionRequest, Usage};
use studyhub_core::models::metric::ApiName;

use crate::AppState;

/// 업스트림 응답 중 핸들러가 쓰는 부분
#[derive(Debug, Clone)]
pub struct Reply {
    pub content: String,
    pub usage: Option<Usage>,
}

/// 현재 시각 (epoch 밀리초)
pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// 업스트림 호출 후 결과를 호출 지표로 기록한다.
///
/// 소요 시간은 재시도를 포함한 전체 시간이며, 성공/실패와 무관하게 정확히
/// 한 번 기록한다.
pub(crate) async fn complete_and_record(
    state: &AppState,
    api_name: ApiName,
    request: &ChatCompletionRequest,
) -> Result<Reply, CallFailure> {
    let started = Instant::now();

    let outcome = state
        .provider
        .complete(request)
        .await
        .and_then(|completion| match completion.first_content() {
            Some(content) => Ok(Reply {
                content: content.to_string(),
                usage: completion.usage,
            }),
            None => Err(CallFailure::MalformedBody {
                message: "choices[0].message.content 없음".to_string(),
                body: String::new(),
            }),
        });

    let elapsed_ms = started.elapsed().as_millis() as u64;
    let endpoint = state.provider.endpoint_path();

    match &outcome {
        Ok(_) => {
            state
                .recorder
                .record(api_name, endpoint, elapsed_ms, Ok(()))
                .await
        }
        Err(failure) => {
            let message = failure.details();
            state
                .recorder
                .record(api_name, endpoint, elapsed_ms, Err(message.as_str()))
                .await
        }
    }

    outcome
}

/// 부수 기록 저장. 실패해도 응답은 그대로 나간다.
pub(crate) async fn persist_best_effort<T: serde::Serialize>(
    state: &AppState,
    key: &str,
    record: &T,
) {
    let value = match serde_json::to_value(record) {
        Ok(value) => value,
        Err(e) => {
            warn!(key, "기록 직렬화 실패: {e}");
            return;
        }
    };

    if let Err(e) = state.store.set(key, &value).await {
        warn!(key, "기록 저장 실패 (무시): {e}");
    }
}
