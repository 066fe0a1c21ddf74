//! OpenAI 호환 chat completion 클라이언트.
//!
//! [`CompletionProvider`] 포트 구현. 요청은 [`RetryingHttpClient`]를 거친다.

use async_trait::async_trait;
use tracing::debug;

use studyhub_core::config::UpstreamConfig;
use studyhub_core::error::{CallFailure, CoreError};
use studyhub_core::models::completion::{ChatCompletion, ChatCompletionRequest};
use studyhub_core::ports::completion::CompletionProvider;

use crate::http_client::{HttpCall, RetryingHttpClient};
use crate::retry::RetryPolicy;

/// 호출 지표에 기록하는 업스트림 경로
pub const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// OpenAI 호환 chat completion 클라이언트
///
/// API 키는 메모리에만 유지하며 로그에 남기지 않는다.
#[derive(Debug)]
pub struct OpenAiCompatibleClient {
    http: RetryingHttpClient,
    endpoint: String,
    api_key: String,
    chat_model: String,
    vision_model: String,
}

impl OpenAiCompatibleClient {
    /// 업스트림 설정과 재시도 정책으로 생성
    pub fn new(config: &UpstreamConfig, policy: RetryPolicy) -> Result<Self, CoreError> {
        if config.api_key.trim().is_empty() {
            return Err(CoreError::Config(
                "업스트림 API 키 미설정. STUDYHUB_API_KEY 환경 변수나 설정 파일에 입력하세요."
                    .into(),
            ));
        }

        let http = RetryingHttpClient::new(
            std::time::Duration::from_millis(config.request_timeout_ms),
            policy,
        )?;

        debug!(
            endpoint = %config.endpoint,
            chat_model = %config.chat_model,
            vision_model = %config.vision_model,
            "OpenAiCompatibleClient 초기화"
        );

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            chat_model: config.chat_model.clone(),
            vision_model: config.vision_model.clone(),
        })
    }
}

#[async_trait]
impl CompletionProvider for OpenAiCompatibleClient {
    async fn complete(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletion, CallFailure> {
        let body = serde_json::to_value(request).map_err(|e| CallFailure::MalformedBody {
            message: format!("요청 직렬화 실패: {e}"),
            body: String::new(),
        })?;

        let call = HttpCall::post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(body);

        let completion: ChatCompletion = self.http.execute(&call).await?;

        if completion.first_content().is_none() {
            return Err(CallFailure::MalformedBody {
                message: "choices[0].message.content 없음".to_string(),
                body: serde_json::to_string(&completion).unwrap_or_default(),
            });
        }

        if let Some(usage) = completion.usage {
            debug!(
                model = %request.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "chat completion 완료"
            );
        }

        Ok(completion)
    }

    fn endpoint_path(&self) -> &str {
        CHAT_COMPLETIONS_PATH
    }

    fn chat_model(&self) -> &str {
        &self.chat_model
    }

    fn vision_model(&self) -> &str {
        &self.vision_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use studyhub_core::models::completion::ChatMessage;

    fn upstream(endpoint: String) -> UpstreamConfig {
        UpstreamConfig {
            endpoint,
            api_key: "test-key".to_string(),
            chat_model: "chat-model".to_string(),
            vision_model: "vision-model".to_string(),
            request_timeout_ms: 5_000,
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::default().with_base_delay(Duration::from_millis(1))
    }

    fn request() -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: "chat-model".to_string(),
            messages: vec![ChatMessage::system("tutor"), ChatMessage::user("2+2?")],
            temperature: Some(0.7),
            max_tokens: Some(512),
        }
    }

    #[test]
    fn empty_api_key_is_config_error() {
        let mut config = upstream("http://localhost/v1/chat/completions".to_string());
        config.api_key = "  ".to_string();
        let err = OpenAiCompatibleClient::new(&config, fast_policy()).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn exposes_models_and_path() {
        let config = upstream("http://localhost/v1/chat/completions".to_string());
        let client = OpenAiCompatibleClient::new(&config, fast_policy()).unwrap();
        assert_eq!(client.chat_model(), "chat-model");
        assert_eq!(client.vision_model(), "vision-model");
        assert_eq!(client.endpoint_path(), "/chat/completions");
    }

    #[tokio::test]
    async fn complete_sends_auth_and_parses_choice() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_body(mockito::Matcher::PartialJson(json!({
                "model": "chat-model",
                "max_tokens": 512
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"choices":[{"message":{"role":"assistant","content":"4"}}],
                    "usage":{"prompt_tokens":10,"completion_tokens":1,"total_tokens":11}}"#,
            )
            .create_async()
            .await;

        let config = upstream(format!("{}/v1/chat/completions", server.url()));
        let client = OpenAiCompatibleClient::new(&config, fast_policy()).unwrap();
        let completion = client.complete(&request()).await.unwrap();

        assert_eq!(completion.first_content(), Some("4"));
        assert_eq!(completion.usage.map(|u| u.total_tokens), Some(11));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unauthorized_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(401)
            .with_body(r#"{"error":{"message":"Invalid API Key"}}"#)
            .expect(1)
            .create_async()
            .await;

        let config = upstream(format!("{}/v1/chat/completions", server.url()));
        let client = OpenAiCompatibleClient::new(&config, fast_policy()).unwrap();
        let err = client.complete(&request()).await.unwrap_err();

        assert_eq!(err.status(), Some(401));
        assert!(err.details().contains("Invalid API Key"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn empty_choices_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let config = upstream(format!("{}/v1/chat/completions", server.url()));
        let client = OpenAiCompatibleClient::new(&config, fast_policy()).unwrap();
        let err = client.complete(&request()).await.unwrap_err();

        assert!(matches!(err, CallFailure::MalformedBody { .. }));
    }
}
