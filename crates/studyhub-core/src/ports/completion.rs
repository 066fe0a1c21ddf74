//! AI completion 제공자 포트.
//!
//! 구현: `studyhub-network::ai_client::OpenAiCompatibleClient`
//! (재시도 HTTP 클라이언트 위에서 동작)

use async_trait::async_trait;

use crate::error::CallFailure;
use crate::models::completion::{ChatCompletion, ChatCompletionRequest};

/// 업스트림 AI chat completion 제공자
///
/// 모든 실패는 재시도가 끝난 뒤 [`CallFailure`] 값으로 돌아온다.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// chat completion 호출
    async fn complete(&self, request: &ChatCompletionRequest)
        -> Result<ChatCompletion, CallFailure>;

    /// 호출 지표에 기록할 업스트림 경로 (예: "/chat/completions")
    fn endpoint_path(&self) -> &str;

    /// 대화/플래시카드용 모델 이름
    fn chat_model(&self) -> &str;

    /// 이미지 분석용 모델 이름
    fn vision_model(&self) -> &str;
}
